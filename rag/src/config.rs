//! Engine configuration.

use std::path::PathBuf;

use crate::error::{EngineError, Result};

/// Configuration for a [`RetrievalEngine`](crate::RetrievalEngine).
///
/// The host owns these settings (they usually come from a settings form) and
/// hands them to the engine by value. Every value is validated at the
/// construction boundary, before any document is touched.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Model identifier passed to the embedding capability.
    pub embedding_model: String,
    /// Model identifier passed to the generation capability.
    pub generative_model: String,
    /// Maximum number of retrieved chunks per query (at least 1).
    pub max_results: usize,
    /// Minimum cosine similarity for a chunk to be retrieved, in `[0, 1]`.
    pub similarity_threshold: f32,
    /// Chunk window size in characters (greater than 0).
    pub chunk_size: usize,
    /// Characters of overlap between consecutive chunks (less than `chunk_size`).
    pub chunk_overlap: usize,
    /// Path of the persisted embedding cache snapshot.
    pub cache_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            embedding_model: "text-embedding-3-small".to_string(),
            generative_model: "gpt-4o".to_string(),
            max_results: 5,
            similarity_threshold: 0.5,
            chunk_size: 1000,
            chunk_overlap: 200,
            cache_path: PathBuf::from("./lorebase_cache.json"),
        }
    }
}

impl EngineConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for custom configuration.
    #[must_use]
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }

    /// Checks every setting against its documented domain.
    ///
    /// # Errors
    /// Returns [`EngineError::Config`] on the first violation found. In
    /// particular `chunk_overlap >= chunk_size` is rejected here: it would
    /// make the chunker's advance non-positive and chunking would never
    /// terminate.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(EngineError::Config("chunk_size must be greater than 0".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(EngineError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.max_results == 0 {
            return Err(EngineError::Config("max_results must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(EngineError::Config(format!(
                "similarity_threshold ({}) must be within [0, 1]",
                self.similarity_threshold
            )));
        }
        Ok(())
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Creates a builder seeded with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Sets the embedding model identifier.
    #[must_use]
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.config.embedding_model = model.into();
        self
    }

    /// Sets the generation model identifier.
    #[must_use]
    pub fn generative_model(mut self, model: impl Into<String>) -> Self {
        self.config.generative_model = model.into();
        self
    }

    /// Sets the maximum number of retrieved chunks per query.
    #[must_use]
    pub const fn max_results(mut self, n: usize) -> Self {
        self.config.max_results = n;
        self
    }

    /// Sets the minimum similarity for retrieval.
    #[must_use]
    pub const fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Sets the chunk window size in characters.
    #[must_use]
    pub const fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Sets the chunk overlap in characters.
    #[must_use]
    pub const fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Sets the cache snapshot path.
    #[must_use]
    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cache_path = path.into();
        self
    }

    /// Builds the configuration without validating it; validation happens
    /// when the engine is constructed.
    #[must_use]
    pub fn build(self) -> EngineConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn builder_overrides() {
        let config = EngineConfig::builder()
            .embedding_model("custom-embed")
            .generative_model("custom-gen")
            .max_results(10)
            .similarity_threshold(0.7)
            .chunk_size(500)
            .chunk_overlap(50)
            .cache_path("/tmp/cache.json")
            .build();

        assert_eq!(config.embedding_model, "custom-embed");
        assert_eq!(config.generative_model, "custom-gen");
        assert_eq!(config.max_results, 10);
        assert!((config.similarity_threshold - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 50);
        assert_eq!(config.cache_path, PathBuf::from("/tmp/cache.json"));
    }

    #[test]
    fn overlap_must_be_less_than_chunk_size() {
        let config = EngineConfig::builder().chunk_size(100).chunk_overlap(100).build();
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let config = EngineConfig::builder().chunk_size(0).build();
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));
    }

    #[test]
    fn zero_max_results_rejected() {
        let config = EngineConfig::builder().max_results(0).build();
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        let config = EngineConfig::builder().similarity_threshold(1.5).build();
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));
    }
}
