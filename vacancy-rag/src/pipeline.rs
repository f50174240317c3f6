//! Retrieval pipeline: search → dedup → context → answer.
//!
//! The [`RetrievalPipeline`] turns a question into LLM-ready context and a
//! citation list, then hands both prompts to an injected
//! [`AnswerGenerator`]. Without a generator it returns the raw context.
//!
//! # Example
//!
//! ```rust,ignore
//! use vacancy_rag::{RetrievalPipeline, SearchEngine, SearchFilters};
//!
//! let pipeline = RetrievalPipeline::builder()
//!     .engine(Arc::new(engine))
//!     .generator(Arc::new(OllamaGenerator::new(OllamaConfig::default())?))
//!     .build()?;
//!
//! let filters = SearchFilters::new().city("Алматы");
//! let answer = pipeline.answer("Какие навыки нужны Python-разработчику?", Some(&filters), None).await?;
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::RagConfig;
use crate::document::{SearchResult, Source};
use crate::error::{RagError, Result};
use crate::filter::SearchFilters;
use crate::generation::AnswerGenerator;
use crate::search::SearchEngine;

/// System prompt sent with every generation request.
pub const SYSTEM_PROMPT: &str = "Ты — умный ассистент по вакансиям с hh.kz.
Отвечай на вопросы пользователя ТОЛЬКО на основе предоставленных вакансий.
Если в данных нет ответа — честно скажи об этом.
Отвечай структурированно, используй списки и таблицы где уместно.
Язык ответа: русский.";

/// User prompt template with `{context}` and `{question}` placeholders.
pub const RAG_PROMPT_TEMPLATE: &str = "Вот релевантные вакансии из базы hh.kz:

{context}

---
Вопрос пользователя: {question}

Ответь на вопрос, опираясь ТОЛЬКО на вакансии выше. Приводи конкретные примеры (названия компаний, зарплаты, навыки).";

/// Separator placed between context blocks.
pub const CONTEXT_SEPARATOR: &str = "\n---\n";

/// Prepended to the context when no generator is configured.
pub const NO_GENERATOR_NOTICE: &str = "(LLM not configured — showing raw search results)";

/// Fill [`RAG_PROMPT_TEMPLATE`].
pub fn format_prompt(context: &str, question: &str) -> String {
    // Context goes in last so braces inside vacancy text are never re-expanded.
    RAG_PROMPT_TEMPLATE.replace("{question}", question).replacen("{context}", context, 1)
}

/// Rendered context and the sources it cites.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RetrievalContext {
    pub context: String,
    /// One entry per rendered block, in the same order.
    pub sources: Vec<Source>,
}

/// Build LLM context from score-ordered search results.
///
/// Keeps the first (highest-scoring) chunk of each vacancy, then keeps at most
/// `max_chunks` of those. Each surviving chunk becomes a block
/// `[Вакансия: name | employer | area]\n{text}\n`, and blocks are joined with
/// [`CONTEXT_SEPARATOR`].
pub fn build_context(results: &[SearchResult], max_chunks: usize) -> RetrievalContext {
    let mut seen = HashSet::new();
    let kept: Vec<&SearchResult> = results
        .iter()
        .filter(|r| seen.insert(r.chunk.vacancy_id.as_str()))
        .take(max_chunks)
        .collect();

    let context = kept
        .iter()
        .map(|r| {
            let c = &r.chunk;
            format!("[Вакансия: {} | {} | {}]\n{}\n", c.vacancy_name, c.employer, c.area, c.text)
        })
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR);

    let sources = kept.into_iter().map(Source::from).collect();
    RetrievalContext { context, sources }
}

/// The result of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<Source>,
    pub context: String,
    /// Number of search results before deduplication.
    pub n_results: usize,
}

/// Composes a [`SearchEngine`] with an optional [`AnswerGenerator`].
///
/// The pipeline holds no per-query state. Construct one via
/// [`RetrievalPipeline::builder()`].
pub struct RetrievalPipeline {
    config: RagConfig,
    engine: Arc<SearchEngine>,
    generator: Option<Arc<dyn AnswerGenerator>>,
}

impl RetrievalPipeline {
    /// Create a new [`RetrievalPipelineBuilder`].
    pub fn builder() -> RetrievalPipelineBuilder {
        RetrievalPipelineBuilder::default()
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<SearchEngine> {
        &self.engine
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Search and build context without calling the generator.
    pub async fn retrieve(
        &self,
        question: &str,
        filters: Option<&SearchFilters>,
        top_k: Option<usize>,
    ) -> Result<(Vec<SearchResult>, RetrievalContext)> {
        let top_k = top_k.unwrap_or(self.config.top_k);
        let results = self.engine.search(question, filters, top_k).await?;
        let context = build_context(&results, self.config.max_context_chunks);
        Ok((results, context))
    }

    /// Answer a question from the indexed vacancies.
    ///
    /// `top_k` defaults to the configured value. The generator is called even
    /// when nothing was retrieved; the system prompt tells it to say so.
    ///
    /// # Errors
    ///
    /// Search errors are returned as-is. Generator errors are returned
    /// unmodified and no partial answer is produced.
    pub async fn answer(
        &self,
        question: &str,
        filters: Option<&SearchFilters>,
        top_k: Option<usize>,
    ) -> Result<RagAnswer> {
        let (results, RetrievalContext { context, sources }) =
            self.retrieve(question, filters, top_k).await?;

        let answer = match &self.generator {
            Some(generator) => {
                let prompt = format_prompt(&context, question);
                generator.generate(SYSTEM_PROMPT, &prompt).await.map_err(|e| {
                    error!(generator = generator.name(), error = %e, "generation failed");
                    e
                })?
            }
            None => format!("{NO_GENERATOR_NOTICE}\n\n{context}"),
        };

        info!(
            n_results = results.len(),
            sources = sources.len(),
            generated = self.generator.is_some(),
            "answer ready"
        );

        Ok(RagAnswer { answer, sources, context, n_results: results.len() })
    }
}

impl std::fmt::Debug for RetrievalPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalPipeline")
            .field("config", &self.config)
            .field("engine", &self.engine)
            .field("generator", &self.generator.as_ref().map(|g| g.name().to_string()))
            .finish()
    }
}

/// Builder for constructing a [`RetrievalPipeline`].
///
/// `engine` is required. `config` defaults to [`RagConfig::default()`] and
/// `generator` is optional.
#[derive(Default)]
pub struct RetrievalPipelineBuilder {
    config: Option<RagConfig>,
    engine: Option<Arc<SearchEngine>>,
    generator: Option<Arc<dyn AnswerGenerator>>,
}

impl RetrievalPipelineBuilder {
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn engine(mut self, engine: Arc<SearchEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn AnswerGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Build the [`RetrievalPipeline`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if no engine was set.
    pub fn build(self) -> Result<RetrievalPipeline> {
        let engine =
            self.engine.ok_or_else(|| RagError::Config("engine is required".to_string()))?;
        Ok(RetrievalPipeline {
            config: self.config.unwrap_or_default(),
            engine,
            generator: self.generator,
        })
    }
}
