//! Job-posting records as handed over by the acquisition layer.
//!
//! Every field except `id` may be absent or `null` in the source JSON; accessors
//! return `""` for missing text so callers never branch on `Option<String>` just
//! to render a value.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{RagError, Result};

/// A single job posting.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Vacancy {
    /// Stable unique identifier.
    pub id: Option<String>,
    /// Posting title.
    pub name: Option<String>,
    /// Human-readable posting URL.
    pub url: Option<String>,
    pub employer_name: Option<String>,
    /// Location name, e.g. `Алматы`.
    pub area: Option<String>,
    pub salary_from: Option<i64>,
    pub salary_to: Option<i64>,
    pub salary_currency: Option<String>,
    /// `true` when the salary is quoted before tax.
    pub salary_gross: Option<bool>,
    /// Experience band label, e.g. `От 1 до 3 лет`.
    pub experience: Option<String>,
    pub schedule: Option<String>,
    pub employment: Option<String>,
    /// Comma-joined skill list.
    pub key_skills: Option<String>,
    pub description: Option<String>,
}

fn text(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or("")
}

impl Vacancy {
    pub fn id(&self) -> &str {
        text(&self.id)
    }

    pub fn name(&self) -> &str {
        text(&self.name)
    }

    pub fn employer_name(&self) -> &str {
        text(&self.employer_name)
    }

    pub fn area(&self) -> &str {
        text(&self.area)
    }

    pub fn url(&self) -> &str {
        text(&self.url)
    }

    pub fn experience(&self) -> &str {
        text(&self.experience)
    }

    pub fn schedule(&self) -> &str {
        text(&self.schedule)
    }

    pub fn employment(&self) -> &str {
        text(&self.employment)
    }

    pub fn key_skills(&self) -> &str {
        text(&self.key_skills)
    }

    pub fn description(&self) -> &str {
        text(&self.description)
    }

    pub fn salary_currency(&self) -> &str {
        text(&self.salary_currency)
    }

    /// A salary bound of zero carries no information and is treated as absent.
    pub fn has_salary(&self) -> bool {
        self.salary_from.is_some_and(|v| v != 0) || self.salary_to.is_some_and(|v| v != 0)
    }
}

/// Parse a JSON array of vacancies.
///
/// # Errors
///
/// Returns [`RagError::Io`] if the file cannot be read and
/// [`RagError::Serialization`] if it is not a JSON array of records.
pub fn load_vacancies(path: impl AsRef<Path>) -> Result<Vec<Vacancy>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| RagError::io(path, e))?;
    let vacancies: Vec<Vacancy> = serde_json::from_str(&raw)?;
    info!(path = %path.display(), count = vacancies.len(), "loaded vacancies");
    Ok(vacancies)
}

/// Drop repeated records, keeping the first occurrence of each id.
///
/// Records without an id cannot be referenced by chunks and are dropped too.
pub fn dedup_by_id(vacancies: impl IntoIterator<Item = Vacancy>) -> Vec<Vacancy> {
    let mut seen = HashSet::new();
    vacancies
        .into_iter()
        .filter(|v| match v.id.as_deref() {
            Some(id) if !id.is_empty() => seen.insert(id.to_string()),
            _ => false,
        })
        .collect()
}

/// Keep only records whose description is longer than `min_len` characters.
pub fn with_description(vacancies: &[Vacancy], min_len: usize) -> Vec<Vacancy> {
    vacancies.iter().filter(|v| v.description().chars().count() > min_len).cloned().collect()
}

/// Summary counts over a corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CorpusStats {
    pub total: usize,
    pub with_salary: usize,
    pub unique_employers: usize,
}

impl CorpusStats {
    pub fn collect(vacancies: &[Vacancy]) -> Self {
        let employers: HashSet<&str> = vacancies.iter().map(Vacancy::employer_name).collect();
        Self {
            total: vacancies.len(),
            with_salary: vacancies.iter().filter(|v| v.has_salary()).count(),
            unique_employers: employers.len(),
        }
    }

    /// Share of records that quote a salary, in whole percent.
    pub fn salary_percent(&self) -> usize {
        100 * self.with_salary / self.total.max(1)
    }
}
