//! # lorebase-core
//!
//! `no_std` trait APIs for the capabilities the retrieval engine consumes.
//! The engine never talks to a vendor SDK directly: the host application
//! implements these traits over whatever providers it has, and the engine
//! stays portable across them.
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │  lorebase-rag   │───▶│  lorebase-core   │◀───│  Host adapters  │
//! │                 │    │  (this crate)    │    │                 │
//! │ - ingestion     │    │ - Embedder       │    │ - OpenAI, local │
//! │ - retrieval     │    │ - Generator      │    │ - vault files   │
//! │ - orchestration │    │ - SourceProvider │    │ - test mocks    │
//! └─────────────────┘    └──────────────────┘    └─────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`embedding`] — turn text into dense vectors.
//! - [`generation`] — produce answer text from a prompt.
//! - [`source`] — enumerate and read the host's document set.
//! - [`error`] — the typed failure taxonomy shared by all capabilities.

#![no_std]
extern crate alloc;

pub mod embedding;
mod error;
pub mod generation;
pub mod source;

#[doc(inline)]
pub use embedding::{Embedder, Embedding};
pub use error::{ProviderError, SourceError};
#[doc(inline)]
pub use generation::Generator;
#[doc(inline)]
pub use source::{SourceProvider, SourceRef};
