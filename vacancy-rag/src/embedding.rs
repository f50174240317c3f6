//! Embedding providers and the prompt policy applied in front of them.
//!
//! [`EmbeddingProvider`] is the raw backend. [`Embedder`] wraps one and adds the
//! pieces retrieval depends on: asymmetric `query: ` / `passage: ` prefixes for
//! models trained with them, batching, and L2 normalisation so that inner
//! product equals cosine similarity.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{RagError, Result};
use crate::index::IndexConfig;

/// Prefix for texts being searched through.
pub const PASSAGE_PREFIX: &str = "passage: ";
/// Prefix for texts being searched for.
pub const QUERY_PREFIX: &str = "query: ";

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap a specific model runtime behind a unified async
/// interface. The default [`embed`](EmbeddingProvider::embed) forwards to
/// [`embed_batch`](EmbeddingProvider::embed_batch).
///
/// # Example
///
/// ```rust,ignore
/// use vacancy_rag::EmbeddingProvider;
///
/// let vectors = provider.embed_batch(&["hello", "world"]).await?;
/// assert_eq!(vectors[0].len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding vectors for a batch of text inputs, one per input, in order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text]).await?.into_iter().next().ok_or_else(|| RagError::Embedding {
            provider: self.model_name().to_string(),
            message: "provider returned no embedding".into(),
        })
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Return the model identifier, e.g. `intfloat/multilingual-e5-small`.
    fn model_name(&self) -> &str;
}

/// Which side of an asymmetric search a text is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedRole {
    Passage,
    Query,
}

impl EmbedRole {
    fn prefix(self) -> &'static str {
        match self {
            Self::Passage => PASSAGE_PREFIX,
            Self::Query => QUERY_PREFIX,
        }
    }
}

/// Whether a model expects `query: ` / `passage: ` prefixes.
///
/// Resolved once from the identifier when an index is built, then persisted in
/// [`IndexConfig`] and never re-derived at query time.
pub fn is_asymmetric_model(model_name: &str) -> bool {
    model_name.to_lowercase().contains("e5")
}

/// Scale a vector to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Encodes passages and queries with a fixed prompt policy.
///
/// # Example
///
/// ```rust,ignore
/// let embedder = Embedder::new(provider.clone());
/// let vectors = embedder.encode(&texts, EmbedRole::Passage).await?;
///
/// // At query time, follow the policy the index was built with.
/// let embedder = Embedder::for_index(provider, index.config());
/// ```
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    asymmetric: bool,
    batch_size: usize,
}

impl std::fmt::Debug for Embedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Embedder")
            .field("model", &self.provider.model_name())
            .field("asymmetric", &self.asymmetric)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl Embedder {
    const DEFAULT_BATCH_SIZE: usize = 64;

    /// Wrap a provider, deriving the prompt policy from its model identifier.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        let asymmetric = is_asymmetric_model(provider.model_name());
        Self { provider, asymmetric, batch_size: Self::DEFAULT_BATCH_SIZE }
    }

    /// Wrap a provider using the prompt policy recorded in a persisted index.
    pub fn for_index(provider: Arc<dyn EmbeddingProvider>, config: &IndexConfig) -> Self {
        if provider.model_name() != config.model_name {
            warn!(
                provider_model = provider.model_name(),
                index_model = %config.model_name,
                "embedding provider model differs from the model the index was built with"
            );
        }
        Self { provider, asymmetric: config.asymmetric_prefix, batch_size: Self::DEFAULT_BATCH_SIZE }
    }

    /// Set the number of texts per provider call. Values below one are raised to one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn is_asymmetric(&self) -> bool {
        self.asymmetric
    }

    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Encode texts for the given role, returning one unit-length vector per text.
    ///
    /// # Errors
    ///
    /// Propagates provider failures, and returns [`RagError::Embedding`] if the
    /// provider returns the wrong number of vectors.
    pub async fn encode(&self, texts: &[&str], role: EmbedRole) -> Result<Vec<Vec<f32>>> {
        let prompts: Vec<String> = texts.iter().map(|t| self.prompt(t, role)).collect();
        let mut vectors = Vec::with_capacity(prompts.len());

        for (batch_no, batch) in prompts.chunks(self.batch_size).enumerate() {
            let refs: Vec<&str> = batch.iter().map(String::as_str).collect();
            let embeddings = self.provider.embed_batch(&refs).await?;
            if embeddings.len() != refs.len() {
                return Err(RagError::Embedding {
                    provider: self.model_name().to_string(),
                    message: format!(
                        "expected {} embeddings, provider returned {}",
                        refs.len(),
                        embeddings.len()
                    ),
                });
            }
            debug!(batch_no, batch_size = refs.len(), ?role, "encoded batch");
            vectors.extend(embeddings);
        }

        vectors.iter_mut().for_each(|v| l2_normalize(v));
        Ok(vectors)
    }

    /// Encode a single query.
    pub async fn encode_query(&self, query: &str) -> Result<Vec<f32>> {
        self.encode(&[query], EmbedRole::Query).await?.into_iter().next().ok_or_else(|| {
            RagError::Embedding {
                provider: self.model_name().to_string(),
                message: "provider returned no embedding".into(),
            }
        })
    }

    fn prompt(&self, text: &str, role: EmbedRole) -> String {
        if self.asymmetric { format!("{}{text}", role.prefix()) } else { text.to_string() }
    }
}
