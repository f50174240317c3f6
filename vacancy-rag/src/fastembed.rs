//! Local ONNX embedding provider backed by the `fastembed` crate.
//!
//! This module is only available when the `fastembed` feature is enabled.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use ::fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::{debug, error, info};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// The default model: multilingual, handles Russian and Kazakh postings.
pub const DEFAULT_MODEL: &str = "intfloat/multilingual-e5-small";

/// Map a model identifier to a fastembed model.
pub fn resolve_model(model_name: &str) -> Option<EmbeddingModel> {
    let model = match model_name {
        "intfloat/multilingual-e5-small" => EmbeddingModel::MultilingualE5Small,
        "intfloat/multilingual-e5-base" => EmbeddingModel::MultilingualE5Base,
        "intfloat/multilingual-e5-large" => EmbeddingModel::MultilingualE5Large,
        "sentence-transformers/all-MiniLM-L6-v2" => EmbeddingModel::AllMiniLML6V2,
        "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2" => {
            EmbeddingModel::ParaphraseMLMiniLML12V2
        }
        "BAAI/bge-small-en-v1.5" => EmbeddingModel::BGESmallENV15,
        _ => return None,
    };
    Some(model)
}

/// An [`EmbeddingProvider`] running a sentence-embedding model in-process.
///
/// The model is downloaded into the cache directory on first use. Encoding is
/// serialized through a mutex since the runtime needs exclusive access.
///
/// # Example
///
/// ```rust,ignore
/// use vacancy_rag::fastembed::FastEmbedProvider;
///
/// let provider = FastEmbedProvider::try_new("intfloat/multilingual-e5-small")?;
/// ```
pub struct FastEmbedProvider {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimensions: usize,
}

impl FastEmbedProvider {
    /// Load a model by identifier using fastembed's default cache directory.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ModelLoad`] if the identifier is unknown or the model
    /// cannot be downloaded or initialized.
    pub fn try_new(model_name: &str) -> Result<Self> {
        Self::load(model_name, None)
    }

    /// Load a model, caching downloaded files under `cache_dir`.
    pub fn with_cache_dir(model_name: &str, cache_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::load(model_name, Some(cache_dir.into()))
    }

    fn load(model_name: &str, cache_dir: Option<PathBuf>) -> Result<Self> {
        let model_load =
            |message: String| RagError::ModelLoad { model: model_name.to_string(), message };

        let model = resolve_model(model_name)
            .ok_or_else(|| model_load("unsupported model identifier".to_string()))?;

        info!(model = model_name, "loading embedding model");

        let mut options = InitOptions::new(model).with_show_download_progress(true);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }

        let mut text_model = TextEmbedding::try_new(options).map_err(|e| {
            error!(model = model_name, error = %e, "model initialization failed");
            model_load(e.to_string())
        })?;

        // Probe once to learn the output dimension.
        let dimensions = text_model
            .embed(vec!["test"], None)
            .map_err(|e| model_load(e.to_string()))?
            .into_iter()
            .next()
            .map(|v| v.len())
            .ok_or_else(|| model_load("probe embedding was empty".to_string()))?;

        info!(model = model_name, dimensions, "embedding model ready");

        Ok(Self { model: Mutex::new(text_model), model_name: model_name.to_string(), dimensions })
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(provider = "fastembed", batch_size = texts.len(), "embedding batch");

        let mut model = self.model.lock().map_err(|_| RagError::Embedding {
            provider: self.model_name.clone(),
            message: "model mutex poisoned".into(),
        })?;
        model.embed(texts.to_vec(), None).map_err(|e| RagError::Embedding {
            provider: self.model_name.clone(),
            message: e.to_string(),
        })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
