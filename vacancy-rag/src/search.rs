//! Query execution: encode → exact search → filter → truncate.
//!
//! Filters are applied after retrieval. When any filter field is present the
//! engine over-fetches `top_k * over_fetch_factor` candidates so that filtering
//! does not starve the result list. This is a heuristic: a selective filter
//! whose matches rank below the over-fetch window yields fewer than `top_k`
//! results even though more matches exist further down the ranking.
//!
//! Chunks of the same vacancy are distinct hits here; deduplication happens
//! when building LLM context.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::RagConfig;
use crate::document::SearchResult;
use crate::embedding::{EmbeddingProvider, Embedder};
use crate::error::{RagError, Result};
use crate::filter::SearchFilters;
use crate::index::VacancyIndex;

/// Default candidate multiplier for filtered searches.
pub const DEFAULT_OVER_FETCH_FACTOR: usize = 5;

/// Search over one immutable [`VacancyIndex`].
///
/// The engine holds no mutable state, so one instance can serve any number of
/// concurrent searches.
///
/// # Example
///
/// ```rust,ignore
/// let index = Arc::new(VacancyIndex::load("data/index")?);
/// let engine = SearchEngine::from_index(index, provider);
/// let hits = engine.search("Python разработчик", None, 10).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SearchEngine {
    index: Arc<VacancyIndex>,
    embedder: Embedder,
    over_fetch_factor: usize,
}

impl SearchEngine {
    /// Create an engine from an index and an embedder already configured for it.
    pub fn new(index: Arc<VacancyIndex>, embedder: Embedder) -> Self {
        Self { index, embedder, over_fetch_factor: DEFAULT_OVER_FETCH_FACTOR }
    }

    /// Create an engine whose query prompting follows the index's persisted config.
    pub fn from_index(index: Arc<VacancyIndex>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        let embedder = Embedder::for_index(provider, index.config());
        Self::new(index, embedder)
    }

    /// Set the over-fetch multiplier. Values below one are raised to one.
    pub fn with_over_fetch_factor(mut self, factor: usize) -> Self {
        self.over_fetch_factor = factor.max(1);
        self
    }

    /// Apply the search settings of a [`RagConfig`].
    pub fn with_config(self, config: &RagConfig) -> Self {
        self.with_over_fetch_factor(config.over_fetch_factor)
    }

    pub fn index(&self) -> &Arc<VacancyIndex> {
        &self.index
    }

    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    /// Number of candidates requested from the index for a search.
    pub fn fetch_k(&self, filters: Option<&SearchFilters>, top_k: usize) -> usize {
        if filters.is_some_and(SearchFilters::is_active) {
            top_k.saturating_mul(self.over_fetch_factor)
        } else {
            top_k
        }
    }

    /// Return up to `top_k` chunks most similar to `query` that pass `filters`.
    ///
    /// Results are ordered by descending score. Fewer than `top_k` results,
    /// including none at all, is a valid outcome.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmptyQuery`] for a blank query and
    /// [`RagError::InvalidInput`] for `top_k == 0`, both before any encoding.
    /// Embedding failures are propagated unchanged.
    pub async fn search(
        &self,
        query: &str,
        filters: Option<&SearchFilters>,
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        if query.trim().is_empty() {
            return Err(RagError::EmptyQuery);
        }
        if top_k == 0 {
            return Err(RagError::InvalidInput("top_k must be greater than zero".to_string()));
        }

        let filters = filters.filter(|f| f.is_active());
        let fetch_k = self.fetch_k(filters, top_k);

        let query_vector = self.embedder.encode_query(query).await?;
        let candidates = self.index.search(&query_vector, fetch_k)?;
        debug!(fetch_k, candidates = candidates.len(), filtered = filters.is_some(), "scanned index");

        let mut results = Vec::with_capacity(top_k.min(candidates.len()));
        for (position, score) in candidates {
            let Some(chunk) = self.index.chunk(position) else {
                continue;
            };
            if filters.is_some_and(|f| !f.matches(chunk)) {
                continue;
            }
            results.push(SearchResult { chunk: chunk.clone(), score });
            if results.len() >= top_k {
                break;
            }
        }

        info!(top_k, fetch_k, result_count = results.len(), "search completed");
        Ok(results)
    }
}

/// A swappable reference to the engine currently serving queries.
///
/// Callers take a snapshot with [`current`](Self::current) and search against
/// it; a rebuild installs a new engine with [`replace`](Self::replace) without
/// disturbing searches already running on the previous one.
#[derive(Debug)]
pub struct IndexHandle {
    engine: RwLock<Arc<SearchEngine>>,
}

impl IndexHandle {
    pub fn new(engine: SearchEngine) -> Self {
        Self { engine: RwLock::new(Arc::new(engine)) }
    }

    /// The engine serving queries right now.
    pub async fn current(&self) -> Arc<SearchEngine> {
        self.engine.read().await.clone()
    }

    /// Install a new engine and return the one it replaced.
    pub async fn replace(&self, engine: SearchEngine) -> Arc<SearchEngine> {
        let mut guard = self.engine.write().await;
        let previous = std::mem::replace(&mut *guard, Arc::new(engine));
        info!(
            previous_chunks = previous.index().count(),
            chunks = guard.index().count(),
            "search engine replaced"
        );
        previous
    }
}
