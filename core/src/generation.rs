//! Text generation capability.

use alloc::string::String;
use core::future::Future;

use crate::ProviderError;

/// Produces answer text from a fully assembled prompt.
///
/// The engine builds the prompt (retrieved context plus the user's question)
/// and treats the generator as a black box. Streaming, tool calling, and
/// conversation state are deliberately out of scope here; hosts that need
/// them can layer richer interfaces on top of the same provider.
///
/// Failures must be mapped to a [`ProviderError`] kind: the engine retries
/// [`Unavailable`](ProviderError::Unavailable) with backoff and a model
/// fallback, and fails fast on everything else.
pub trait Generator: Send + Sync {
    /// Generates a completion for `prompt` using the given model.
    ///
    /// # Arguments
    ///
    /// * `model` - Provider-specific model identifier. The engine may pass a
    ///   different identifier on retry after a transient failure.
    /// * `prompt` - The full prompt text, context included.
    fn generate(
        &self,
        model: &str,
        prompt: &str,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send;
}

/// Blanket impl so `Arc<G>` and `&G` work wherever a [`Generator`] is needed.
impl<G: Generator + ?Sized> Generator for &G {
    fn generate(
        &self,
        model: &str,
        prompt: &str,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send {
        (**self).generate(model, prompt)
    }
}
