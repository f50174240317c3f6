//! Configuration for chunking, retrieval and context building.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for index building and querying.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of results returned by a search when the caller does not override it.
    pub top_k: usize,
    /// Maximum number of deduplicated chunks rendered into the LLM context.
    pub max_context_chunks: usize,
    /// Candidate multiplier applied when a search carries an active filter.
    pub over_fetch_factor: usize,
    /// Number of texts sent to the embedding provider per call.
    pub batch_size: usize,
    /// Records with a shorter description are skipped at index build time. `0` keeps all.
    pub min_description_length: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1500,
            chunk_overlap: 200,
            top_k: 10,
            max_context_chunks: 5,
            over_fetch_factor: 5,
            batch_size: 64,
            min_description_length: 30,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Load a config from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Io`] if the file cannot be read, [`RagError::Serialization`]
    /// if it is not valid JSON, and [`RagError::Config`] if validation fails.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| RagError::io(path, e))?;
        let config: RagConfig = serde_json::from_str(&raw)?;
        RagConfigBuilder { config }.build()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the default number of search results.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the number of deduplicated chunks rendered into the context.
    pub fn max_context_chunks(mut self, n: usize) -> Self {
        self.config.max_context_chunks = n;
        self
    }

    /// Set the candidate multiplier used for filtered searches.
    pub fn over_fetch_factor(mut self, factor: usize) -> Self {
        self.config.over_fetch_factor = factor;
        self
    }

    /// Set the embedding batch size.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// Set the minimum description length for records admitted to the index.
    pub fn min_description_length(mut self, len: usize) -> Self {
        self.config.min_description_length = len;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k`, `max_context_chunks`, `over_fetch_factor` or `batch_size` is zero
    pub fn build(self) -> Result<RagConfig> {
        let c = &self.config;
        if c.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
        }
        if c.chunk_overlap >= c.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                c.chunk_overlap, c.chunk_size
            )));
        }
        for (name, value) in [
            ("top_k", c.top_k),
            ("max_context_chunks", c.max_context_chunks),
            ("over_fetch_factor", c.over_fetch_factor),
            ("batch_size", c.batch_size),
        ] {
            if value == 0 {
                return Err(RagError::Config(format!("{name} must be greater than zero")));
            }
        }
        Ok(self.config)
    }
}
