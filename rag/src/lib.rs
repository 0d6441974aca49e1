//! Retrieval-augmented generation over a personal note vault.
//!
//! The pipeline has two halves:
//!
//! - **Ingestion**: documents from a [`SourceProvider`] are chunked
//!   ([`Chunker`]), embedded, and stored in a persistent [`EmbeddingCache`].
//! - **Query**: a question is embedded, scored against every cached chunk
//!   by cosine similarity ([`index`]), and the top matches are stitched into
//!   a prompt for the generative model.
//!
//! [`RetrievalEngine`] orchestrates both halves and owns the retry policy
//! for flaky providers.
//!
//! [`SourceProvider`]: lorebase_core::SourceProvider

pub mod cache;
pub mod chunking;
pub mod config;
mod engine;
mod error;
pub mod index;
mod ingest;
mod types;

pub use cache::{EmbeddingCache, LoadIssue, LoadReport};
pub use chunking::Chunker;
pub use config::{EngineConfig, EngineConfigBuilder};
pub use engine::{Answer, RetrievalEngine, RetryPolicy};
pub use error::{EngineError, Result};
pub use ingest::{IngestProgress, IngestReport, IngestStage, SkippedSource, MIN_CHUNK_CHARS};
pub use types::{Chunk, SearchResult, SourceRecord};
