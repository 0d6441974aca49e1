//! Core data types for the retrieval engine.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// A passage of text cut from one vault document.
///
/// `content` is non-empty and trimmed; `vector` is set once the chunk has
/// been embedded. Similarity scores are never stored on the chunk itself —
/// they live on the ephemeral [`SearchResult`] wrapper, so they cannot leak
/// into the persisted cache.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Trimmed passage text.
    pub content: String,
    /// Identifier of the document this chunk was cut from.
    pub source_id: String,
    /// Human-readable label of the document, used for citations.
    pub source_label: String,
    /// Embedding vector, present once the chunk has been embedded.
    pub vector: Option<Vec<f32>>,
}

impl Chunk {
    /// Creates an unembedded chunk. The content is trimmed on entry.
    #[must_use]
    pub fn new(
        content: impl Into<String>,
        source_id: impl Into<String>,
        source_label: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into().trim().to_string(),
            source_id: source_id.into(),
            source_label: source_label.into(),
            vector: None,
        }
    }

    /// Attaches an embedding vector.
    #[must_use]
    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vector = Some(vector);
        self
    }

    /// Returns `true` if the chunk carries a non-empty embedding vector.
    #[must_use]
    pub fn has_vector(&self) -> bool {
        self.vector.as_ref().is_some_and(|v| !v.is_empty())
    }
}

/// Everything the cache knows about one ingested document.
///
/// Replaced wholesale when the document is re-ingested; never merged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Identifier of the ingested document.
    pub source_id: String,
    /// Embedded chunks, in document order.
    pub chunks: Vec<Chunk>,
    /// Unix timestamp (seconds) of the last ingestion of this document.
    pub last_updated: u64,
}

impl SourceRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(source_id: impl Into<String>, chunks: Vec<Chunk>) -> Self {
        Self {
            source_id: source_id.into(),
            chunks,
            last_updated: unix_timestamp(),
        }
    }
}

/// A ranked search hit: one chunk and its cosine similarity to the query.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchResult {
    /// The matching chunk.
    pub chunk: Chunk,
    /// Cosine similarity in `[-1, 1]` (1.0 = identical direction).
    pub score: f32,
}

pub(crate) fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}
