//! Text embedding capability.
//!
//! An embedding is a dense vector representation of text: similar texts
//! produce nearby vectors, which is what makes semantic retrieval over a
//! note vault work at all. This module provides the [`Embedder`] trait that
//! abstracts over embedding providers, so the engine can switch between
//! remote APIs and local models without changing its retrieval logic.

use alloc::vec::Vec;
use core::future::Future;

use crate::ProviderError;

/// A dense embedding vector of 32-bit floats.
pub type Embedding = Vec<f32>;

/// Converts text to vector representations.
///
/// # Implementation Requirements
///
/// - The same `model` and `text` must produce vectors of the same length;
///   the engine compares vectors with cosine similarity and mixed dimensions
///   would silently score as garbage.
/// - Failures must be mapped to a [`ProviderError`] kind; the engine's
///   resilience policy dispatches on the kind.
///
/// # Example
///
/// ```rust
/// use lorebase_core::{Embedder, ProviderError};
///
/// struct FixedEmbedder;
///
/// impl Embedder for FixedEmbedder {
///     async fn embed(&self, _model: &str, text: &str) -> Result<Vec<f32>, ProviderError> {
///         Ok(vec![text.len() as f32, 1.0])
///     }
/// }
/// ```
pub trait Embedder: Send + Sync {
    /// Converts `text` to an embedding vector using the given model.
    ///
    /// # Arguments
    ///
    /// * `model` - Provider-specific model identifier (e.g.
    ///   `text-embedding-3-small`).
    /// * `text` - The input to embed: a query, or a single document chunk.
    fn embed(
        &self,
        model: &str,
        text: &str,
    ) -> impl Future<Output = Result<Embedding, ProviderError>> + Send;
}

/// Blanket impl so `Arc<E>` and `&E` work wherever an [`Embedder`] is needed.
impl<E: Embedder + ?Sized> Embedder for &E {
    fn embed(
        &self,
        model: &str,
        text: &str,
    ) -> impl Future<Output = Result<Embedding, ProviderError>> + Send {
        (**self).embed(model, text)
    }
}
