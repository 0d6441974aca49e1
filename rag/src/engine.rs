//! Retrieval orchestrator: query answering, corpus rebuilds, retry policy.

use std::sync::RwLock;
use std::time::Duration;

use lorebase_core::{Embedder, Generator, SourceProvider, SourceRef};

use crate::cache::{EmbeddingCache, LoadIssue, LoadReport};
use crate::chunking::Chunker;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::index;
use crate::ingest::{self, IngestProgress, IngestReport, IngestStage, SkippedSource};
use crate::types::{Chunk, SearchResult};

/// Separator between context chunks in the generation prompt.
const CONTEXT_DELIMITER: &str = "\n\n---\n\n";

/// Retry behavior for generation calls.
///
/// Only transiently-unavailable provider errors are retried. Authentication
/// and rate-limit failures surface immediately: retrying cannot fix a bad
/// key, and hammering a rate limiter makes things worse.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first (at least 1).
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent retry.
    pub base_delay: Duration,
    /// Models to fall back to. The switch happens once, to the first entry,
    /// before the first retry.
    pub fallback_models: Vec<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            fallback_models: vec!["gpt-4o-mini".to_string()],
        }
    }
}

impl RetryPolicy {
    /// Backoff before the retry numbered `retry` (1-based):
    /// `base_delay * 2^(retry - 1)`.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(2_u32.saturating_pow(retry.saturating_sub(1)))
    }
}

/// Outcome of answering a question against the vault.
#[derive(Debug, Clone)]
pub enum Answer {
    /// An answer generated from retrieved context.
    Grounded {
        /// The generated answer text.
        text: String,
        /// The chunks that were placed in the prompt, ranked by similarity.
        sources: Vec<SearchResult>,
    },
    /// No cached chunk scored at or above the similarity threshold; the
    /// generator was never called.
    NoRelevantContent,
}

/// Retrieval-augmented answering over a persistent embedding cache.
///
/// The engine owns the cache behind a [`RwLock`]: queries take short read
/// locks, rebuilds prepare a fresh cache entirely off-lock and swap it in
/// with one brief write lock. No lock is ever held across a provider call,
/// so a slow embedding round-trip never blocks concurrent queries.
pub struct RetrievalEngine<E, G> {
    embedder: E,
    generator: G,
    cache: RwLock<EmbeddingCache>,
    chunker: Chunker,
    config: EngineConfig,
    retry: RetryPolicy,
}

impl<E, G> std::fmt::Debug for RetrievalEngine<E, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalEngine")
            .field("config", &self.config)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl<E: Embedder, G: Generator> RetrievalEngine<E, G> {
    /// Creates an engine and loads the cache snapshot at the configured
    /// path. A missing or unusable snapshot starts the engine with an empty
    /// cache.
    ///
    /// # Errors
    /// Returns [`EngineError::Config`] if the configuration is invalid.
    pub fn new(embedder: E, generator: G, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let chunker = Chunker::new(config.chunk_size, config.chunk_overlap);

        let mut cache = EmbeddingCache::new();
        let report = cache.load(&config.cache_path);
        match &report.issue {
            None => tracing::info!(
                sources = report.sources,
                chunks = report.chunks,
                "cache snapshot loaded"
            ),
            Some(LoadIssue::Missing) => tracing::info!(
                path = %config.cache_path.display(),
                "no cache snapshot yet, starting empty"
            ),
            Some(LoadIssue::Corrupt(reason)) => tracing::warn!(
                path = %config.cache_path.display(),
                %reason,
                "cache snapshot unusable, starting empty"
            ),
        }

        Ok(Self {
            embedder,
            generator,
            cache: RwLock::new(cache),
            chunker,
            config,
            retry: RetryPolicy::default(),
        })
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Number of documents currently cached.
    #[must_use]
    pub fn cached_sources(&self) -> usize {
        self.cache.read().expect("cache lock poisoned").source_count()
    }

    /// Number of chunks currently cached.
    #[must_use]
    pub fn cached_chunks(&self) -> usize {
        self.cache.read().expect("cache lock poisoned").chunk_count()
    }

    /// Reloads the cache from the configured snapshot path, replacing the
    /// in-memory state. Missing or unusable snapshots leave the cache empty;
    /// the reason is carried in the report.
    pub fn load_cache(&self) -> LoadReport {
        self.cache
            .write()
            .expect("cache lock poisoned")
            .load(&self.config.cache_path)
    }

    /// Persists the current cache to the configured snapshot path.
    ///
    /// # Errors
    /// Returns [`EngineError::Persistence`] if the file cannot be written.
    pub fn save_cache(&self) -> Result<()> {
        self.cache
            .read()
            .expect("cache lock poisoned")
            .save(&self.config.cache_path)
    }

    /// Embeds `query` and returns the ranked chunks at or above the
    /// configured similarity threshold.
    ///
    /// # Errors
    /// Returns [`EngineError::Provider`] if the query embedding call fails;
    /// query embedding is never retried.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        let query_vector = self
            .embedder
            .embed(&self.config.embedding_model, query)
            .await?;

        // Snapshot the chunks under a short read lock; scoring happens
        // after the lock is released.
        let chunks: Vec<Chunk> = self
            .cache
            .read()
            .expect("cache lock poisoned")
            .all_chunks()
            .cloned()
            .collect();

        Ok(index::search(
            &query_vector,
            &chunks,
            self.config.similarity_threshold,
            self.config.max_results,
        ))
    }

    /// Answers `question` from the vault.
    ///
    /// Retrieval runs first; if nothing clears the threshold the call
    /// returns [`Answer::NoRelevantContent`] without touching the generator.
    ///
    /// # Errors
    /// Returns [`EngineError::Provider`] if embedding fails or generation
    /// fails with a non-retryable error, and
    /// [`EngineError::ServiceUnavailable`] if generation stayed unavailable
    /// through every retry attempt.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let results = self.retrieve(question).await?;
        if results.is_empty() {
            tracing::debug!("no chunk cleared the similarity threshold");
            return Ok(Answer::NoRelevantContent);
        }

        let prompt = build_prompt(question, &results);
        let text = self.generate_with_retry(&prompt).await?;
        Ok(Answer::Grounded {
            text,
            sources: results,
        })
    }

    /// Re-ingests the entire document set and swaps the result in.
    ///
    /// # Errors
    /// Returns [`EngineError::Source`] if the document set cannot be listed
    /// and [`EngineError::Persistence`] if the snapshot cannot be written.
    /// Per-document failures do not fail the rebuild; they are reported in
    /// the returned [`IngestReport`].
    pub async fn rebuild(&self, sources: &impl SourceProvider) -> Result<IngestReport> {
        self.rebuild_with_progress(sources, |_| {}).await
    }

    /// [`rebuild`](Self::rebuild) with a progress callback for hosts that
    /// show an indexing indicator.
    ///
    /// # Errors
    /// Same failure modes as [`rebuild`](Self::rebuild).
    pub async fn rebuild_with_progress(
        &self,
        sources: &impl SourceProvider,
        mut on_progress: impl FnMut(IngestProgress),
    ) -> Result<IngestReport> {
        on_progress(IngestProgress {
            processed: 0,
            total: 0,
            current: None,
            stage: IngestStage::Listing,
        });
        let refs = sources.list_sources().await?;
        let total = refs.len();

        let mut fresh = EmbeddingCache::new();
        let mut report = IngestReport::default();

        for (processed, source) in refs.iter().enumerate() {
            on_progress(IngestProgress {
                processed,
                total,
                current: Some(source.id.clone()),
                stage: IngestStage::Embedding,
            });

            let text = match sources.read_source(&source.id).await {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(source = %source.id, error = %err, "skipping unreadable source");
                    report.skipped.push(SkippedSource {
                        source_id: source.id.clone(),
                        reason: err.to_string(),
                    });
                    on_progress(IngestProgress {
                        processed,
                        total,
                        current: Some(source.id.clone()),
                        stage: IngestStage::Skipped {
                            reason: err.to_string(),
                        },
                    });
                    continue;
                }
            };

            let outcome = ingest::ingest_source(
                &self.embedder,
                &self.config.embedding_model,
                &self.chunker,
                source,
                &text,
            )
            .await;
            report.sources_indexed += 1;
            report.chunks_embedded += outcome.embedded;
            report.chunks_dropped += outcome.dropped;
            fresh.put(outcome.record);
        }

        // One brief write lock to swap the rebuilt cache in.
        *self.cache.write().expect("cache lock poisoned") = fresh;

        on_progress(IngestProgress {
            processed: total,
            total,
            current: None,
            stage: IngestStage::Saving,
        });
        self.cache
            .read()
            .expect("cache lock poisoned")
            .save(&self.config.cache_path)?;

        on_progress(IngestProgress {
            processed: total,
            total,
            current: None,
            stage: IngestStage::Done,
        });
        tracing::info!(
            sources = report.sources_indexed,
            chunks = report.chunks_embedded,
            dropped = report.chunks_dropped,
            skipped = report.skipped.len(),
            "rebuild complete"
        );
        Ok(report)
    }

    /// Re-ingests a single document, replacing its record wholesale, and
    /// persists the updated snapshot.
    ///
    /// # Errors
    /// Returns [`EngineError::Source`] if the document cannot be read and
    /// [`EngineError::Persistence`] if the snapshot cannot be written.
    pub async fn reindex_source(
        &self,
        sources: &impl SourceProvider,
        source: &SourceRef,
    ) -> Result<IngestReport> {
        let text = sources.read_source(&source.id).await?;
        let outcome = ingest::ingest_source(
            &self.embedder,
            &self.config.embedding_model,
            &self.chunker,
            source,
            &text,
        )
        .await;

        let report = IngestReport {
            sources_indexed: 1,
            chunks_embedded: outcome.embedded,
            chunks_dropped: outcome.dropped,
            skipped: Vec::new(),
        };

        let mut cache = self.cache.write().expect("cache lock poisoned");
        cache.put(outcome.record);
        cache.save(&self.config.cache_path)?;
        Ok(report)
    }

    async fn generate_with_retry(&self, prompt: &str) -> Result<String> {
        let mut model = self.config.generative_model.as_str();

        for attempt in 0..self.retry.max_attempts.max(1) {
            if attempt > 0 {
                // Switch model once, before the first retry.
                if attempt == 1 {
                    if let Some(fallback) = self.retry.fallback_models.first() {
                        tracing::warn!(from = %model, to = %fallback, "switching to fallback model");
                        model = fallback;
                    }
                }
                sleep(self.retry.delay_for(attempt)).await;
            }

            match self.generator.generate(model, prompt).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_transient() => {
                    tracing::warn!(attempt, %model, error = %err, "generation unavailable");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(EngineError::ServiceUnavailable {
            attempts: self.retry.max_attempts.max(1),
        })
    }
}

fn build_prompt(question: &str, results: &[SearchResult]) -> String {
    let context = results
        .iter()
        .map(|result| {
            format!(
                "From {}:\n{}",
                result.chunk.source_label, result.chunk.content
            )
        })
        .collect::<Vec<_>>()
        .join(CONTEXT_DELIMITER);

    format!(
        "Answer the question using only the context below. \
         If the context does not contain enough information, say so.\n\n\
         Context:\n{context}\n\nQuestion: {question}"
    )
}

/// Runtime-agnostic async sleep.
async fn sleep(duration: Duration) {
    if duration.is_zero() {
        return;
    }
    async_io::Timer::after(duration).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorebase_core::{ProviderError, SourceError};
    use std::result::Result;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    #[derive(Clone, Default)]
    struct MockEmbedder {
        calls: Arc<AtomicUsize>,
        fail_queries: bool,
    }

    impl Embedder for MockEmbedder {
        async fn embed(&self, _model: &str, text: &str) -> Result<Vec<f32>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_queries && text.ends_with('?') {
                return Err(ProviderError::Unavailable("embedder down".into()));
            }
            // Two-axis toy embedding: "rust" content on one axis, everything
            // else on the other.
            if text.to_lowercase().contains("rust") {
                Ok(vec![1.0, 0.0])
            } else {
                Ok(vec![0.0, 1.0])
            }
        }
    }

    #[derive(Clone, Default)]
    struct ScriptedGenerator {
        script: Arc<Mutex<VecDeque<Result<String, ProviderError>>>>,
        models: Arc<Mutex<Vec<String>>>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedGenerator {
        fn scripted(steps: Vec<Result<String, ProviderError>>) -> Self {
            Self {
                script: Arc::new(Mutex::new(steps.into())),
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.models.lock().unwrap().len()
        }
    }

    impl Generator for ScriptedGenerator {
        async fn generate(&self, model: &str, prompt: &str) -> Result<String, ProviderError> {
            self.models.lock().unwrap().push(model.to_string());
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("scripted answer".to_string()))
        }
    }

    #[derive(Clone)]
    struct VaultProvider {
        // (id, label, text); text is None for unreadable notes.
        notes: Arc<Mutex<Vec<(String, String, Option<String>)>>>,
    }

    impl VaultProvider {
        fn new(notes: &[(&str, &str, &str)]) -> Self {
            Self {
                notes: Arc::new(Mutex::new(
                    notes
                        .iter()
                        .map(|(id, label, text)| {
                            ((*id).to_string(), (*label).to_string(), Some((*text).to_string()))
                        })
                        .collect(),
                )),
            }
        }

        fn set_text(&self, id: &str, text: &str) {
            let mut notes = self.notes.lock().unwrap();
            for note in notes.iter_mut() {
                if note.0 == id {
                    note.2 = Some(text.to_string());
                }
            }
        }

        fn make_unreadable(&self, id: &str) {
            let mut notes = self.notes.lock().unwrap();
            for note in notes.iter_mut() {
                if note.0 == id {
                    note.2 = None;
                }
            }
        }
    }

    impl SourceProvider for VaultProvider {
        async fn list_sources(&self) -> Result<Vec<SourceRef>, SourceError> {
            Ok(self
                .notes
                .lock()
                .unwrap()
                .iter()
                .map(|(id, label, _)| SourceRef::new(id, label))
                .collect())
        }

        async fn read_source(&self, id: &str) -> Result<String, SourceError> {
            let notes = self.notes.lock().unwrap();
            let note = notes
                .iter()
                .find(|(note_id, _, _)| note_id == id)
                .ok_or_else(|| SourceError::NotFound(id.to_string()))?;
            note.2.clone().ok_or_else(|| SourceError::Unreadable {
                id: id.to_string(),
                reason: "permission denied".to_string(),
            })
        }
    }

    const RUST_NOTE: &str = "Rust uses ownership and borrowing to manage memory \
        without a garbage collector, and the borrow checker enforces it at compile time.";
    const COOKING_NOTE: &str = "Slow-roasting vegetables at low heat concentrates \
        their sugars and gives a far deeper flavor than boiling ever could.";

    fn no_delay_policy() -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::ZERO,
            fallback_models: vec!["backup-1".to_string()],
            ..RetryPolicy::default()
        }
    }

    fn config_in(dir: &std::path::Path) -> EngineConfig {
        EngineConfig::builder()
            .cache_path(dir.join("cache.json"))
            .build()
    }

    #[tokio::test]
    async fn answer_uses_retrieved_context() {
        let dir = tempdir().unwrap();
        let generator = ScriptedGenerator::default();
        let engine =
            RetrievalEngine::new(MockEmbedder::default(), generator.clone(), config_in(dir.path()))
                .unwrap();

        let vault = VaultProvider::new(&[("rust.md", "Rust Notes", RUST_NOTE)]);
        engine.rebuild(&vault).await.unwrap();

        let answer = engine.answer("how does rust manage memory").await.unwrap();
        let Answer::Grounded { text, sources } = answer else {
            panic!("expected a grounded answer");
        };
        assert_eq!(text, "scripted answer");
        assert_eq!(sources[0].chunk.source_id, "rust.md");

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("From Rust Notes:"));
        assert!(prompts[0].contains("ownership and borrowing"));
        assert!(prompts[0].contains("Question: how does rust manage memory"));
        assert_eq!(generator.models.lock().unwrap()[0], "gpt-4o");
    }

    #[tokio::test]
    async fn empty_cache_short_circuits_generation() {
        let dir = tempdir().unwrap();
        let generator = ScriptedGenerator::default();
        let engine =
            RetrievalEngine::new(MockEmbedder::default(), generator.clone(), config_in(dir.path()))
                .unwrap();

        let answer = engine.answer("anything at all").await.unwrap();
        assert!(matches!(answer, Answer::NoRelevantContent));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn below_threshold_short_circuits_generation() {
        let dir = tempdir().unwrap();
        let generator = ScriptedGenerator::default();
        let engine =
            RetrievalEngine::new(MockEmbedder::default(), generator.clone(), config_in(dir.path()))
                .unwrap();

        // Cooking content is orthogonal to a rust query in the toy space.
        let vault = VaultProvider::new(&[("cooking.md", "Cooking", COOKING_NOTE)]);
        engine.rebuild(&vault).await.unwrap();

        let answer = engine.answer("rust borrow checker").await.unwrap();
        assert!(matches!(answer, Answer::NoRelevantContent));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn transient_failures_retry_on_the_fallback_model() {
        let dir = tempdir().unwrap();
        let generator = ScriptedGenerator::scripted(vec![
            Err(ProviderError::Unavailable("overloaded".into())),
            Err(ProviderError::Unavailable("still overloaded".into())),
            Ok("third try".to_string()),
        ]);
        let engine =
            RetrievalEngine::new(MockEmbedder::default(), generator.clone(), config_in(dir.path()))
                .unwrap()
                .with_retry_policy(no_delay_policy());

        let vault = VaultProvider::new(&[("rust.md", "Rust Notes", RUST_NOTE)]);
        engine.rebuild(&vault).await.unwrap();

        let answer = engine.answer("rust ownership").await.unwrap();
        let Answer::Grounded { text, .. } = answer else {
            panic!("expected a grounded answer");
        };
        assert_eq!(text, "third try");
        // Primary model first, then the fallback for every retry.
        assert_eq!(
            *generator.models.lock().unwrap(),
            vec!["gpt-4o", "backup-1", "backup-1"]
        );
    }

    #[tokio::test]
    async fn auth_failure_is_not_retried() {
        let dir = tempdir().unwrap();
        let generator =
            ScriptedGenerator::scripted(vec![Err(ProviderError::Auth("bad key".into()))]);
        let engine =
            RetrievalEngine::new(MockEmbedder::default(), generator.clone(), config_in(dir.path()))
                .unwrap()
                .with_retry_policy(no_delay_policy());

        let vault = VaultProvider::new(&[("rust.md", "Rust Notes", RUST_NOTE)]);
        engine.rebuild(&vault).await.unwrap();

        let err = engine.answer("rust ownership").await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Provider(ProviderError::Auth(_))
        ));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn rate_limit_is_not_retried() {
        let dir = tempdir().unwrap();
        let generator =
            ScriptedGenerator::scripted(vec![Err(ProviderError::RateLimited("slow down".into()))]);
        let engine =
            RetrievalEngine::new(MockEmbedder::default(), generator.clone(), config_in(dir.path()))
                .unwrap()
                .with_retry_policy(no_delay_policy());

        let vault = VaultProvider::new(&[("rust.md", "Rust Notes", RUST_NOTE)]);
        engine.rebuild(&vault).await.unwrap();

        let err = engine.answer("rust ownership").await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Provider(ProviderError::RateLimited(_))
        ));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn exhausted_retries_report_service_unavailable() {
        let dir = tempdir().unwrap();
        let generator = ScriptedGenerator::scripted(vec![
            Err(ProviderError::Unavailable("1".into())),
            Err(ProviderError::Unavailable("2".into())),
            Err(ProviderError::Unavailable("3".into())),
        ]);
        let engine =
            RetrievalEngine::new(MockEmbedder::default(), generator.clone(), config_in(dir.path()))
                .unwrap()
                .with_retry_policy(no_delay_policy());

        let vault = VaultProvider::new(&[("rust.md", "Rust Notes", RUST_NOTE)]);
        engine.rebuild(&vault).await.unwrap();

        let err = engine.answer("rust ownership").await.unwrap_err();
        assert!(matches!(err, EngineError::ServiceUnavailable { attempts: 3 }));
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test]
    async fn rebuild_replaces_shrunken_sources() {
        let dir = tempdir().unwrap();
        let engine = RetrievalEngine::new(
            MockEmbedder::default(),
            ScriptedGenerator::default(),
            EngineConfig::builder()
                .chunk_size(80)
                .chunk_overlap(10)
                .cache_path(dir.path().join("cache.json"))
                .build(),
        )
        .unwrap();

        let long_note = format!("{RUST_NOTE} {RUST_NOTE} {RUST_NOTE}");
        let vault = VaultProvider::new(&[("rust.md", "Rust Notes", &long_note)]);
        engine.rebuild(&vault).await.unwrap();
        let before = engine.cached_chunks();
        assert!(before > 1);

        vault.set_text("rust.md", RUST_NOTE);
        engine.rebuild(&vault).await.unwrap();

        assert_eq!(engine.cached_sources(), 1);
        assert!(engine.cached_chunks() < before, "stale chunks were merged in");
    }

    #[tokio::test]
    async fn unreadable_source_is_skipped_not_fatal() {
        let dir = tempdir().unwrap();
        let engine = RetrievalEngine::new(
            MockEmbedder::default(),
            ScriptedGenerator::default(),
            config_in(dir.path()),
        )
        .unwrap();

        let vault = VaultProvider::new(&[
            ("locked.md", "Locked", "irrelevant"),
            ("rust.md", "Rust Notes", RUST_NOTE),
        ]);
        vault.make_unreadable("locked.md");

        let report = engine.rebuild(&vault).await.unwrap();
        assert_eq!(report.sources_indexed, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].source_id, "locked.md");
        assert!(report.is_partial());
        assert_eq!(engine.cached_sources(), 1);
    }

    #[tokio::test]
    async fn query_embed_failure_propagates_without_retry() {
        let dir = tempdir().unwrap();
        let embedder = MockEmbedder {
            fail_queries: true,
            ..MockEmbedder::default()
        };
        let generator = ScriptedGenerator::default();
        let engine =
            RetrievalEngine::new(embedder.clone(), generator.clone(), config_in(dir.path()))
                .unwrap();

        let vault = VaultProvider::new(&[("rust.md", "Rust Notes", RUST_NOTE)]);
        engine.rebuild(&vault).await.unwrap();
        let calls_after_rebuild = embedder.calls.load(Ordering::SeqCst);

        let err = engine.answer("what about rust?").await.unwrap_err();
        assert!(matches!(err, EngineError::Provider(_)));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), calls_after_rebuild + 1);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn cache_persists_across_engine_instances() {
        let dir = tempdir().unwrap();
        let vault = VaultProvider::new(&[("rust.md", "Rust Notes", RUST_NOTE)]);

        {
            let engine = RetrievalEngine::new(
                MockEmbedder::default(),
                ScriptedGenerator::default(),
                config_in(dir.path()),
            )
            .unwrap();
            engine.rebuild(&vault).await.unwrap();
        }

        // A fresh engine with a fresh embedder answers straight from the
        // snapshot; only the query itself gets embedded.
        let embedder = MockEmbedder::default();
        let engine = RetrievalEngine::new(
            embedder.clone(),
            ScriptedGenerator::default(),
            config_in(dir.path()),
        )
        .unwrap();

        assert_eq!(engine.cached_sources(), 1);
        let answer = engine.answer("rust ownership").await.unwrap();
        assert!(matches!(answer, Answer::Grounded { .. }));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn explicit_load_picks_up_a_snapshot_written_elsewhere() {
        let dir = tempdir().unwrap();
        let vault = VaultProvider::new(&[("rust.md", "Rust Notes", RUST_NOTE)]);

        // First engine starts before any snapshot exists.
        let reader = RetrievalEngine::new(
            MockEmbedder::default(),
            ScriptedGenerator::default(),
            config_in(dir.path()),
        )
        .unwrap();
        assert_eq!(reader.cached_sources(), 0);

        let writer = RetrievalEngine::new(
            MockEmbedder::default(),
            ScriptedGenerator::default(),
            config_in(dir.path()),
        )
        .unwrap();
        writer.rebuild(&vault).await.unwrap();

        let report = reader.load_cache();
        assert_eq!(report.sources, 1);
        assert_eq!(report.issue, None);
        assert_eq!(reader.cached_sources(), 1);
    }

    #[tokio::test]
    async fn reindex_single_source_updates_and_persists() {
        let dir = tempdir().unwrap();
        let engine = RetrievalEngine::new(
            MockEmbedder::default(),
            ScriptedGenerator::default(),
            config_in(dir.path()),
        )
        .unwrap();

        let vault = VaultProvider::new(&[
            ("rust.md", "Rust Notes", RUST_NOTE),
            ("cooking.md", "Cooking", COOKING_NOTE),
        ]);
        engine.rebuild(&vault).await.unwrap();
        assert_eq!(engine.cached_sources(), 2);

        vault.set_text("rust.md", &format!("{RUST_NOTE} And rust macros expand at compile time."));
        let report = engine
            .reindex_source(&vault, &SourceRef::new("rust.md", "Rust Notes"))
            .await
            .unwrap();
        assert_eq!(report.sources_indexed, 1);
        // The untouched source is still there.
        assert_eq!(engine.cached_sources(), 2);
    }

    #[tokio::test]
    async fn rebuild_emits_progress_stages() {
        let dir = tempdir().unwrap();
        let engine = RetrievalEngine::new(
            MockEmbedder::default(),
            ScriptedGenerator::default(),
            config_in(dir.path()),
        )
        .unwrap();

        let vault = VaultProvider::new(&[("rust.md", "Rust Notes", RUST_NOTE)]);
        let mut stages = Vec::new();
        engine
            .rebuild_with_progress(&vault, |progress| stages.push(progress.stage))
            .await
            .unwrap();

        assert!(matches!(stages.first(), Some(IngestStage::Listing)));
        assert!(stages.iter().any(|s| matches!(s, IngestStage::Embedding)));
        assert!(stages.iter().any(|s| matches!(s, IngestStage::Saving)));
        assert!(matches!(stages.last(), Some(IngestStage::Done)));
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = EngineConfig::builder().chunk_size(10).chunk_overlap(10).build();
        let result =
            RetrievalEngine::new(MockEmbedder::default(), ScriptedGenerator::default(), config);
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn backoff_doubles_per_retry() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(2000),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(8000));
    }
}
