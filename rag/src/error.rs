//! Error types for the retrieval engine.

use std::path::PathBuf;

use lorebase_core::{ProviderError, SourceError};
use thiserror::Error;

/// Errors surfaced by engine operations.
///
/// Per-source and per-chunk ingestion failures are deliberately *not* here:
/// they are caught inside the pipeline and reported through
/// [`IngestReport`](crate::IngestReport). A corrupt cache file is likewise
/// recovered to an empty cache and reported through
/// [`LoadReport`](crate::LoadReport).
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid configuration, rejected before any processing starts.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An embedding or generation call failed with a non-retryable kind,
    /// or the retry policy chose not to retry it.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Listing or reading the document set failed outright.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Generation stayed transiently unavailable through every attempt.
    #[error("generation service unavailable after {attempts} attempts")]
    ServiceUnavailable {
        /// How many attempts were made before giving up.
        attempts: u32,
    },

    /// Writing the cache snapshot failed.
    #[error("cache persistence failed at {path}: {source}")]
    Persistence {
        /// Path where the error occurred.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Serializing the cache snapshot failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
