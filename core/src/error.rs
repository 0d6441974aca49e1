//! Typed failures for the remote and host capabilities.

use alloc::string::String;
use thiserror::Error;

/// Failure reported by an embedding or generation provider.
///
/// Every provider error a host adapter surfaces must be mapped to one of
/// these kinds; the engine's retry policy dispatches on the kind, never on
/// the message text. Only [`Unavailable`](ProviderError::Unavailable) is
/// considered transient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The provider rejected the credentials. Never retried.
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// The provider reported quota or rate-limit exhaustion. Not retried
    /// within a single call; callers may retry later.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The provider is temporarily overloaded or unreachable. Retryable.
    #[error("provider temporarily unavailable: {0}")]
    Unavailable(String),

    /// Any other provider-side failure.
    #[error("provider error: {0}")]
    Other(String),
}

impl ProviderError {
    /// Returns `true` if the failure is a temporary-overload signal worth
    /// retrying with backoff.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Failure reading from the host's document set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// No document with the given identifier exists.
    #[error("source not found: {0}")]
    NotFound(String),

    /// The document exists but its content could not be read.
    #[error("source {id} unreadable: {reason}")]
    Unreadable {
        /// Identifier of the unreadable document.
        id: String,
        /// Why the read failed.
        reason: String,
    },
}
