//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use vacancy_rag::{
    AnswerGenerator, Chunk, EmbeddingProvider, RagError, Result, SearchResult, Vacancy,
};

/// Deterministic bag-of-words embedder: lowercase alphanumeric tokens hashed
/// into a fixed number of buckets.
pub struct HashEmbedder {
    dims: usize,
    name: String,
}

impl HashEmbedder {
    pub const DIMS: usize = 256;

    pub fn new() -> Self {
        Self { dims: Self::DIMS, name: "mock-hash".to_string() }
    }

    /// Same vectors, but with an identifier that enables query/passage prefixes.
    pub fn named(name: &str) -> Self {
        Self { dims: Self::DIMS, name: name.to_string() }
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dims];
        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            v[(hasher.finish() % self.dims as u64) as usize] += 1.0;
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

/// Returns the same vector for every input.
pub struct ConstantEmbedder(pub Vec<f32>);

#[async_trait]
impl EmbeddingProvider for ConstantEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| self.0.clone()).collect())
    }

    fn dimensions(&self) -> usize {
        self.0.len()
    }

    fn model_name(&self) -> &str {
        "mock-constant"
    }
}

/// Records every text it is asked to embed.
pub struct RecordingEmbedder {
    inner: HashEmbedder,
    pub seen: Mutex<Vec<String>>,
}

impl RecordingEmbedder {
    pub fn named(name: &str) -> Self {
        Self { inner: HashEmbedder::named(name), seen: Mutex::new(Vec::new()) }
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingProvider for RecordingEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.seen.lock().unwrap().extend(texts.iter().map(|t| t.to_string()));
        self.inner.embed_batch(texts).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

/// Fails every call.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Err(RagError::Embedding { provider: "mock".into(), message: "offline".into() })
    }

    fn dimensions(&self) -> usize {
        4
    }

    fn model_name(&self) -> &str {
        "mock-failing"
    }
}

/// Captures the prompts it receives and answers with a fixed string.
#[derive(Default)]
pub struct RecordingGenerator {
    pub prompts: Mutex<Vec<(String, String)>>,
}

impl RecordingGenerator {
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnswerGenerator for RecordingGenerator {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push((system_prompt.to_string(), user_prompt.to_string()));
        Ok("generated answer".to_string())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Fails every call with a fixed generation error.
pub struct FailingGenerator;

#[async_trait]
impl AnswerGenerator for FailingGenerator {
    async fn generate(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String> {
        Err(RagError::Generation { provider: "mock".into(), message: "model overloaded".into() })
    }

    fn name(&self) -> &str {
        "failing"
    }
}

fn s(value: &str) -> Option<String> {
    Some(value.to_string())
}

/// A Python developer posting in Almaty, 500 000 to 800 000 KZT.
pub fn python_developer() -> Vacancy {
    Vacancy {
        id: s("12345"),
        name: s("Python Developer"),
        employer_name: s("ТОО Тест"),
        area: s("Алматы"),
        url: s("https://hh.kz/vacancy/12345"),
        salary_from: Some(500_000),
        salary_to: Some(800_000),
        salary_currency: s("KZT"),
        salary_gross: Some(false),
        experience: s("От 1 до 3 лет"),
        schedule: s("Полный день"),
        employment: s("Полная занятость"),
        key_skills: s("Python, Django, PostgreSQL, REST API"),
        description: s(
            "Мы ищем опытного Python-разработчика для работы над внутренними продуктами.",
        ),
    }
}

/// The three-record corpus used across tests.
pub fn sample_vacancies() -> Vec<Vacancy> {
    vec![
        python_developer(),
        Vacancy {
            id: s("67890"),
            name: s("Data Scientist"),
            employer_name: s("DataCorp KZ"),
            area: s("Астана"),
            url: s("https://hh.kz/vacancy/67890"),
            salary_from: Some(700_000),
            salary_to: None,
            salary_currency: s("KZT"),
            salary_gross: Some(true),
            experience: s("От 3 до 6 лет"),
            schedule: s("Удалённая работа"),
            employment: s("Полная занятость"),
            key_skills: s("Python, Pandas, ML, TensorFlow"),
            description: s("Ищем Data Scientist для построения ML-моделей."),
        },
        Vacancy {
            id: s("11111"),
            name: s("Junior Frontend"),
            employer_name: s("WebStudio"),
            area: s("Алматы"),
            url: s("https://hh.kz/vacancy/11111"),
            salary_from: None,
            salary_to: Some(350_000),
            salary_currency: s("KZT"),
            salary_gross: Some(false),
            experience: s("Нет опыта"),
            schedule: s("Полный день"),
            employment: s("Полная занятость"),
            key_skills: s("JavaScript, React, CSS"),
            description: s("Начинающий фронтенд-разработчик в дружную команду."),
        },
    ]
}

/// A chunk with the metadata the filters look at.
pub fn chunk(vacancy_id: &str, area: &str) -> Chunk {
    Chunk {
        text: format!("Вакансия: {vacancy_id}"),
        vacancy_id: vacancy_id.to_string(),
        vacancy_name: format!("Vacancy {vacancy_id}"),
        employer: "Co".to_string(),
        area: area.to_string(),
        url: format!("https://hh.kz/vacancy/{vacancy_id}"),
        ..Chunk::default()
    }
}

pub fn result(vacancy_id: &str, chunk_index: usize, score: f32) -> SearchResult {
    SearchResult { chunk: Chunk { chunk_index, ..chunk(vacancy_id, "Алматы") }, score }
}

pub fn hash_provider() -> Arc<dyn EmbeddingProvider> {
    Arc::new(HashEmbedder::new())
}
