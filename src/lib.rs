//! # lorebase
//!
//! Façade crate that re-exports the vault retrieval engine. Pull this crate
//! into your binary to answer natural-language questions over a personal
//! document collection: the host supplies the documents and two remote
//! capabilities (embedding and generation), lorebase owns chunking, the
//! embedding cache, similarity search, and the query orchestration with its
//! retry/fallback policy.
//!
//! ## Example
//!
//! ```rust,no_run
//! use lorebase::{Answer, EngineConfig, RetrievalEngine};
//! # use lorebase::{Embedder, Generator, ProviderError};
//! # struct MyEmbedder;
//! # impl Embedder for MyEmbedder {
//! #     async fn embed(&self, _m: &str, _t: &str) -> Result<Vec<f32>, ProviderError> {
//! #         Ok(vec![0.0])
//! #     }
//! # }
//! # struct MyGenerator;
//! # impl Generator for MyGenerator {
//! #     async fn generate(&self, _m: &str, _p: &str) -> Result<String, ProviderError> {
//! #         Ok(String::new())
//! #     }
//! # }
//!
//! async fn demo() -> lorebase::Result<()> {
//!     let engine = RetrievalEngine::new(MyEmbedder, MyGenerator, EngineConfig::default())?;
//!     match engine.answer("what did I write about borrow checking?").await? {
//!         Answer::Grounded { text, .. } => println!("{text}"),
//!         Answer::NoRelevantContent => println!("nothing relevant in the vault"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Crates
//!
//! - [`lorebase_core`] — the capability traits ([`Embedder`], [`Generator`],
//!   [`SourceProvider`]) and the provider error taxonomy.
//! - [`lorebase_rag`] — chunker, embedding cache, similarity index, ingestion
//!   pipeline, and the [`RetrievalEngine`] orchestrator.

pub use lorebase_core::{
    Embedder, Generator, ProviderError, SourceError, SourceProvider, SourceRef,
};
pub use lorebase_rag::{
    Answer, Chunk, EmbeddingCache, EngineConfig, EngineError, IngestReport, Result,
    RetrievalEngine, RetryPolicy, SearchResult, SourceRecord,
};

pub use lorebase_core;
pub use lorebase_rag;
