//! Durable mapping from document identity to embedded chunks.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::types::{Chunk, SourceRecord};

/// Snapshot format version. Bumped on any incompatible layout change; an
/// unrecognized version reloads as an empty cache.
const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    records: Vec<SourceRecord>,
}

/// In-memory embedding cache, one [`SourceRecord`] per ingested document.
///
/// The ingestion pipeline is the only writer; queries only read. A record
/// is always replaced wholesale — re-ingesting a document that shrank from
/// ten chunks to three leaves exactly three chunks behind, never a merge.
///
/// Keyed by a `BTreeMap` so iteration order is deterministic, which keeps
/// search tie-breaking stable across runs and reloads.
#[derive(Debug, Default)]
pub struct EmbeddingCache {
    records: BTreeMap<String, SourceRecord>,
}

/// What happened during a cache load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Number of source records loaded.
    pub sources: usize,
    /// Total chunks across all loaded records.
    pub chunks: usize,
    /// Why the cache came back empty, when it did. `None` means a snapshot
    /// was loaded cleanly.
    pub issue: Option<LoadIssue>,
}

/// Recoverable reasons a load produced an empty cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadIssue {
    /// No snapshot has ever been saved at this path.
    Missing,
    /// The snapshot exists but could not be read or parsed.
    Corrupt(String),
}

impl EmbeddingCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or wholesale-replaces the record for its source id.
    pub fn put(&mut self, record: SourceRecord) {
        self.records.insert(record.source_id.clone(), record);
    }

    /// Looks up the record for a source id.
    #[must_use]
    pub fn get(&self, source_id: &str) -> Option<&SourceRecord> {
        self.records.get(source_id)
    }

    /// Iterates every chunk across all records. Restartable and finite;
    /// order is deterministic (sources sorted by id, chunks in document
    /// order).
    pub fn all_chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.records.values().flat_map(|record| record.chunks.iter())
    }

    /// Number of cached source records.
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.records.len()
    }

    /// Total number of cached chunks.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.records.values().map(|r| r.chunks.len()).sum()
    }

    /// Returns `true` if no records are cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serializes the full mapping to a versioned JSON snapshot.
    ///
    /// # Errors
    /// Returns [`EngineError::Persistence`] if the file cannot be written,
    /// or [`EngineError::Serialization`] if encoding fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| EngineError::Persistence {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            records: self.records.values().cloned().collect(),
        };
        let payload = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| EngineError::Serialization(e.to_string()))?;

        fs::write(path, payload).map_err(|source| EngineError::Persistence {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Replaces the in-memory mapping with the snapshot at `path`.
    ///
    /// A missing file, unreadable payload, or unsupported version is a
    /// recoverable condition, not an error: the cache comes back empty and
    /// the reason is carried in the returned [`LoadReport`].
    pub fn load(&mut self, path: &Path) -> LoadReport {
        self.records.clear();

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return LoadReport {
                    sources: 0,
                    chunks: 0,
                    issue: Some(LoadIssue::Missing),
                };
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "cache unreadable, starting empty");
                return LoadReport {
                    sources: 0,
                    chunks: 0,
                    issue: Some(LoadIssue::Corrupt(err.to_string())),
                };
            }
        };

        let snapshot = match serde_json::from_slice::<Snapshot>(&bytes) {
            Ok(snapshot) if snapshot.version == SNAPSHOT_VERSION => snapshot,
            Ok(snapshot) => {
                tracing::warn!(
                    path = %path.display(),
                    version = snapshot.version,
                    "unsupported cache snapshot version, starting empty"
                );
                return LoadReport {
                    sources: 0,
                    chunks: 0,
                    issue: Some(LoadIssue::Corrupt(format!(
                        "unsupported snapshot version {}",
                        snapshot.version
                    ))),
                };
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "cache corrupt, starting empty");
                return LoadReport {
                    sources: 0,
                    chunks: 0,
                    issue: Some(LoadIssue::Corrupt(err.to_string())),
                };
            }
        };

        for record in snapshot.records {
            self.put(record);
        }

        LoadReport {
            sources: self.source_count(),
            chunks: self.chunk_count(),
            issue: None,
        }
    }
}
