//! Per-document ingestion: chunk, filter, embed, record.

use lorebase_core::{Embedder, SourceRef};

use crate::chunking::Chunker;
use crate::types::{Chunk, SourceRecord};

/// Chunks shorter than this (in characters) carry too little signal to be
/// worth an embedding call and are discarded before embedding.
pub const MIN_CHUNK_CHARS: usize = 50;

/// Summary of a corpus rebuild.
///
/// One bad document never aborts the batch; it lands in `skipped` instead.
/// A non-empty `skipped` list (or a non-zero drop count) is the partial
/// failure surface callers can report to the user.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Documents that produced a cache record.
    pub sources_indexed: usize,
    /// Chunks successfully embedded across all documents.
    pub chunks_embedded: usize,
    /// Chunks dropped because their embedding call failed.
    pub chunks_dropped: usize,
    /// Documents skipped entirely (e.g. unreadable).
    pub skipped: Vec<SkippedSource>,
}

impl IngestReport {
    /// Returns `true` if anything was skipped or dropped.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty() || self.chunks_dropped > 0
    }
}

/// A document that could not be ingested at all.
#[derive(Debug, Clone)]
pub struct SkippedSource {
    /// Identifier of the skipped document.
    pub source_id: String,
    /// Why it was skipped.
    pub reason: String,
}

/// Progress update emitted during a rebuild.
#[derive(Debug, Clone)]
pub struct IngestProgress {
    /// Documents processed so far.
    pub processed: usize,
    /// Total documents discovered.
    pub total: usize,
    /// Identifier of the current document, when one is in flight.
    pub current: Option<String>,
    /// Current pipeline stage.
    pub stage: IngestStage,
}

/// Stages of the ingestion pipeline.
#[derive(Debug, Clone)]
pub enum IngestStage {
    /// Enumerating the document set.
    Listing,
    /// Chunking and embedding the current document.
    Embedding,
    /// The current document was skipped.
    Skipped {
        /// Why it was skipped.
        reason: String,
    },
    /// Persisting the cache snapshot.
    Saving,
    /// Rebuild finished.
    Done,
}

/// Outcome of ingesting a single document.
pub(crate) struct SourceOutcome {
    pub record: SourceRecord,
    pub embedded: usize,
    pub dropped: usize,
}

/// Chunks one document and embeds each chunk sequentially.
///
/// A failed embedding call drops that chunk (logged, counted) and the rest
/// continue; the record is produced with whatever chunks succeeded, possibly
/// zero.
pub(crate) async fn ingest_source<E: Embedder>(
    embedder: &E,
    model: &str,
    chunker: &Chunker,
    source: &SourceRef,
    text: &str,
) -> SourceOutcome {
    let mut chunks = Vec::new();
    let mut dropped = 0;

    for piece in chunker.split(text) {
        if piece.chars().count() < MIN_CHUNK_CHARS {
            continue;
        }
        match embedder.embed(model, &piece).await {
            Ok(vector) => {
                chunks.push(Chunk::new(piece, &source.id, &source.label).with_vector(vector));
            }
            Err(err) => {
                tracing::warn!(
                    source = %source.id,
                    error = %err,
                    "dropping chunk after embedding failure"
                );
                dropped += 1;
            }
        }
    }

    let embedded = chunks.len();
    SourceOutcome {
        record: SourceRecord::new(&source.id, chunks),
        embedded,
        dropped,
    }
}
