//! # vacancy-rag
//!
//! Semantic retrieval over job-posting records.
//!
//! ## Overview
//!
//! The crate turns a corpus of [`Vacancy`] records into a persisted vector
//! index and answers natural-language questions against it:
//!
//! ```text
//! records ─▶ Chunker ─▶ chunks ─▶ Embedder (passage) ─▶ VacancyIndex ─▶ disk
//!
//! question ─▶ Embedder (query) ─▶ VacancyIndex::search ─▶ filter ─▶ SearchEngine results
//!          ─▶ RetrievalPipeline (dedup, context, sources) ─▶ AnswerGenerator ─▶ RagAnswer
//! ```
//!
//! - [`SlidingWindowChunker`] renders each record with [`vacancy_to_document`]
//!   and splits long documents into overlapping character windows.
//! - [`Embedder`] wraps an [`EmbeddingProvider`] and applies the `query: ` /
//!   `passage: ` prefixes that e5-family models expect.
//! - [`VacancyIndex`] is an exact inner-product index over unit vectors with
//!   positionally aligned chunk metadata.
//! - [`SearchEngine`] applies [`SearchFilters`] after retrieval, over-fetching
//!   when a filter is active.
//! - [`RetrievalPipeline`] deduplicates by vacancy, builds the context and
//!   delegates to an [`AnswerGenerator`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vacancy_rag::{Embedder, RagConfig, SearchEngine, VacancyIndex, build_index, load_vacancies};
//! use vacancy_rag::fastembed::FastEmbedProvider;
//!
//! let provider = Arc::new(FastEmbedProvider::try_new("intfloat/multilingual-e5-small")?);
//! let vacancies = load_vacancies("data/vacancies.json")?;
//!
//! let index = build_index(&vacancies, &Embedder::new(provider.clone()), &RagConfig::default()).await?;
//! index.persist("data/index")?;
//!
//! let engine = SearchEngine::from_index(Arc::new(VacancyIndex::load("data/index")?), provider);
//! let hits = engine.search("Python Django Алматы", None, 10).await?;
//! ```
//!
//! ## Features
//!
//! | Feature | Adds |
//! |---------|------|
//! | `fastembed` | `fastembed::FastEmbedProvider`, local ONNX embeddings |
//! | `ollama` | `ollama::OllamaGenerator`, local chat models |
//! | `openai` | `openai::OpenAIGenerator`, OpenAI chat completions |
//! | `full` | all of the above |

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod filter;
pub mod generation;
pub mod index;
pub mod pipeline;
pub mod search;
pub mod telemetry;
pub mod vacancy;

#[cfg(feature = "fastembed")]
pub mod fastembed;
#[cfg(feature = "ollama")]
pub mod ollama;
#[cfg(feature = "openai")]
pub mod openai;

pub use chunking::{Chunker, SlidingWindowChunker, chunk_documents, vacancy_to_document};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, SearchResult, Source};
pub use embedding::{
    EmbedRole, Embedder, EmbeddingProvider, PASSAGE_PREFIX, QUERY_PREFIX, is_asymmetric_model,
    l2_normalize,
};
pub use error::{RagError, Result};
pub use filter::SearchFilters;
pub use generation::AnswerGenerator;
pub use index::{FlatIndex, IndexConfig, VacancyIndex, build_index};
pub use pipeline::{
    RagAnswer, RetrievalContext, RetrievalPipeline, RetrievalPipelineBuilder, build_context,
    format_prompt,
};
pub use search::{IndexHandle, SearchEngine};
pub use telemetry::{LoggingConfig, init_logging};
pub use vacancy::{CorpusStats, Vacancy, dedup_by_id, load_vacancies, with_description};

#[cfg(feature = "fastembed")]
pub use self::fastembed::FastEmbedProvider;
#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaGenerator};
#[cfg(feature = "openai")]
pub use openai::{OpenAIConfig, OpenAIGenerator};
