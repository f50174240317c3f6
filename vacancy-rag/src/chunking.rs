//! Turning vacancies into searchable chunks.
//!
//! Each vacancy is rendered into one canonical text block (see
//! [`vacancy_to_document`]). Blocks that fit in `chunk_size` characters become a
//! single chunk; longer ones are cut with a sliding window of `chunk_size`
//! characters advancing by `chunk_size - chunk_overlap`.
//!
//! Lengths are counted in `char`s, not bytes, so Cyrillic text is never split
//! inside a code point.

use tracing::debug;

use crate::document::Chunk;
use crate::error::{RagError, Result};
use crate::vacancy::Vacancy;

/// A strategy for splitting vacancies into chunks.
pub trait Chunker: Send + Sync {
    /// Split a vacancy into one or more chunks with `chunk_index` counting from zero.
    fn chunk(&self, vacancy: &Vacancy) -> Vec<Chunk>;
}

/// Sliding-window chunker over the rendered vacancy text.
///
/// # Example
///
/// ```rust,ignore
/// use vacancy_rag::SlidingWindowChunker;
///
/// let chunker = SlidingWindowChunker::new(1500, 200)?;
/// let chunks = chunker.chunk(&vacancy);
/// ```
#[derive(Debug, Clone)]
pub struct SlidingWindowChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl SlidingWindowChunker {
    /// Create a new `SlidingWindowChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` - maximum number of characters per chunk
    /// * `chunk_overlap` - number of characters shared by consecutive chunks
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidInput`] if `chunk_overlap >= chunk_size`, since the
    /// window would never advance.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_overlap >= chunk_size {
            return Err(RagError::InvalidInput(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

impl Chunker for SlidingWindowChunker {
    fn chunk(&self, vacancy: &Vacancy) -> Vec<Chunk> {
        let full_text = vacancy_to_document(vacancy);
        let template = Chunk {
            text: String::new(),
            vacancy_id: vacancy.id().to_string(),
            vacancy_name: vacancy.name().to_string(),
            employer: vacancy.employer_name().to_string(),
            area: vacancy.area().to_string(),
            url: vacancy.url().to_string(),
            salary_from: vacancy.salary_from,
            salary_to: vacancy.salary_to,
            salary_currency: vacancy.salary_currency.clone(),
            experience: vacancy.experience().to_string(),
            chunk_index: 0,
        };

        split_by_size(&full_text, self.chunk_size, self.chunk_overlap)
            .into_iter()
            .enumerate()
            .map(|(chunk_index, text)| Chunk { text: text.to_string(), chunk_index, ..template.clone() })
            .collect()
    }
}

/// Chunk every vacancy in order.
///
/// An empty input yields an empty output.
///
/// # Errors
///
/// Returns [`RagError::InvalidInput`] if `overlap >= max_chunk_length`.
pub fn chunk_documents(
    vacancies: &[Vacancy],
    max_chunk_length: usize,
    overlap: usize,
) -> Result<Vec<Chunk>> {
    let chunker = SlidingWindowChunker::new(max_chunk_length, overlap)?;
    let chunks: Vec<Chunk> = vacancies.iter().flat_map(|v| chunker.chunk(v)).collect();
    debug!(vacancies = vacancies.len(), chunks = chunks.len(), "chunked vacancies");
    Ok(chunks)
}

/// Character-window splitting with overlap.
///
/// Text that fits in one window is returned whole. Otherwise windows start at
/// `0, step, 2*step, ...` until the start reaches the end of the text, so the
/// trailing windows may be shorter than `chunk_size`.
fn split_by_size(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<&str> {
    let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let char_len = offsets.len();
    offsets.push(text.len());

    if char_len <= chunk_size {
        return vec![text];
    }

    let step = chunk_size - chunk_overlap;
    let mut windows = Vec::with_capacity(char_len / step + 1);
    let mut start = 0;
    while start < char_len {
        let end = (start + chunk_size).min(char_len);
        windows.push(&text[offsets[start]..offsets[end]]);
        start += step;
    }
    windows
}

/// Render a vacancy as the canonical text block that gets embedded.
///
/// Lines appear in a fixed order: title, employer, city, salary, experience,
/// schedule, employment, skills, then a blank line and the description. Title,
/// employer and city lines are always present; the others are omitted when
/// their value is empty.
pub fn vacancy_to_document(vacancy: &Vacancy) -> String {
    let mut parts = vec![
        format!("Вакансия: {}", vacancy.name()),
        format!("Компания: {}", vacancy.employer_name()),
        format!("Город: {}", vacancy.area()),
    ];

    if let Some(salary) = salary_line(vacancy) {
        parts.push(format!("Зарплата: {salary}"));
    }

    for (label, value) in [
        ("Опыт", vacancy.experience()),
        ("График", vacancy.schedule()),
        ("Занятость", vacancy.employment()),
        ("Ключевые навыки", vacancy.key_skills()),
    ] {
        if !value.is_empty() {
            parts.push(format!("{label}: {value}"));
        }
    }

    let description = vacancy.description();
    if !description.is_empty() {
        parts.push(format!("\nОписание:\n{description}"));
    }

    parts.join("\n")
}

fn salary_line(vacancy: &Vacancy) -> Option<String> {
    let from = vacancy.salary_from.filter(|v| *v != 0);
    let to = vacancy.salary_to.filter(|v| *v != 0);

    let mut line = match (from, to) {
        (Some(from), Some(to)) => format!("от {from} до {to}"),
        (Some(from), None) => format!("от {from}"),
        (None, Some(to)) => format!("до {to}"),
        (None, None) => return None,
    };

    let currency = vacancy.salary_currency();
    if !currency.is_empty() {
        line.push(' ');
        line.push_str(currency);
    }
    if vacancy.salary_gross == Some(true) {
        line.push_str(" (до вычета налогов)");
    }
    Some(line)
}
