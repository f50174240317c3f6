//! Structured metadata filters applied after vector retrieval.
//!
//! Each field is either absent (not requested) or present (requested with the
//! given value). A chunk passes when it satisfies every present field. Matching
//! never fails: a value that cannot match anything simply rejects the chunk.

use serde::{Deserialize, Serialize};

use crate::document::Chunk;

/// Optional per-query predicates over chunk metadata.
///
/// # Example
///
/// ```rust,ignore
/// use vacancy_rag::SearchFilters;
///
/// let filters = SearchFilters::new().city("Алматы").salary_min(600_000);
/// let results = engine.search("Python", Some(&filters), 10).await?;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchFilters {
    /// Exact city match, case-insensitive, surrounding whitespace ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// The chunk's best salary must be specified and at least this value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<i64>,
    /// Case-insensitive substring of the experience field, or of the chunk text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn salary_min(mut self, salary_min: i64) -> Self {
        self.salary_min = Some(salary_min);
        self
    }

    pub fn experience(mut self, experience: impl Into<String>) -> Self {
        self.experience = Some(experience.into());
        self
    }

    /// `true` when at least one field is present.
    pub fn is_active(&self) -> bool {
        self.city.is_some() || self.salary_min.is_some() || self.experience.is_some()
    }

    /// Evaluate every present field against a chunk.
    pub fn matches(&self, chunk: &Chunk) -> bool {
        self.city.as_deref().is_none_or(|city| city_matches(city, &chunk.area))
            && self.salary_min.is_none_or(|min| salary_matches(min, chunk))
            && self.experience.as_deref().is_none_or(|exp| experience_matches(exp, chunk))
    }
}

fn city_matches(city: &str, area: &str) -> bool {
    let wanted = city.trim().to_lowercase();
    // A blank city cannot name a location.
    !wanted.is_empty() && wanted == area.trim().to_lowercase()
}

fn salary_matches(min: i64, chunk: &Chunk) -> bool {
    let best = chunk.best_salary();
    best != 0 && best >= min
}

fn experience_matches(experience: &str, chunk: &Chunk) -> bool {
    let wanted = experience.trim().to_lowercase();
    if wanted.is_empty() {
        return false;
    }
    // Older records only mention experience inside the text.
    chunk.experience.to_lowercase().contains(&wanted) || chunk.text.to_lowercase().contains(&wanted)
}
