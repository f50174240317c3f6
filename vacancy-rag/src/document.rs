//! Data types for chunks, search results and citation sources.

use serde::{Deserialize, Serialize};

/// A searchable segment of one [`Vacancy`](crate::Vacancy).
///
/// All chunks cut from the same vacancy carry identical metadata; only `text`
/// and `chunk_index` differ between them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// The assembled (and possibly windowed) text.
    pub text: String,
    /// Back-reference to the source vacancy.
    pub vacancy_id: String,
    pub vacancy_name: String,
    pub employer: String,
    pub area: String,
    pub url: String,
    pub salary_from: Option<i64>,
    pub salary_to: Option<i64>,
    pub salary_currency: Option<String>,
    pub experience: String,
    /// Zero-based position within the vacancy's chunk family.
    pub chunk_index: usize,
}

impl Chunk {
    /// The higher of the two salary bounds, `0` when neither is given.
    pub fn best_salary(&self) -> i64 {
        self.salary_from.unwrap_or(0).max(self.salary_to.unwrap_or(0))
    }
}

/// A retrieved [`Chunk`] paired with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Cosine similarity to the query, in `[-1, 1]`.
    pub score: f32,
}

/// A citation entry for one deduplicated vacancy in an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    pub name: String,
    pub employer: String,
    pub area: String,
    pub url: String,
    pub score: f32,
}

impl From<&SearchResult> for Source {
    fn from(result: &SearchResult) -> Self {
        let chunk = &result.chunk;
        Self {
            name: chunk.vacancy_name.clone(),
            employer: chunk.employer.clone(),
            area: chunk.area.clone(),
            url: chunk.url.clone(),
            score: result.score,
        }
    }
}
