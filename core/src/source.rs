//! Access to the host's document set.
//!
//! The engine never walks a filesystem itself: the host application (the
//! vault owner) implements [`SourceProvider`] and decides what counts as a
//! document, how it is identified, and how it is labeled for citations.

use alloc::string::String;
use alloc::vec::Vec;
use core::future::Future;

use crate::SourceError;

/// Identity and display label of one document in the vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    /// Stable identifier, unique within the vault (e.g. a relative path).
    pub id: String,
    /// Human-readable label shown next to retrieved passages.
    pub label: String,
}

impl SourceRef {
    /// Creates a source reference.
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Enumerates and reads the documents the engine may ingest.
pub trait SourceProvider: Send + Sync {
    /// Lists every document currently in the vault.
    fn list_sources(&self) -> impl Future<Output = Result<Vec<SourceRef>, SourceError>> + Send;

    /// Reads the full text of one document.
    fn read_source(&self, id: &str) -> impl Future<Output = Result<String, SourceError>> + Send;
}

/// Blanket impl so `&S` works wherever a [`SourceProvider`] is needed.
impl<S: SourceProvider + ?Sized> SourceProvider for &S {
    fn list_sources(&self) -> impl Future<Output = Result<Vec<SourceRef>, SourceError>> + Send {
        (**self).list_sources()
    }

    fn read_source(&self, id: &str) -> impl Future<Output = Result<String, SourceError>> + Send {
        (**self).read_source(id)
    }
}
