//! Exact inner-product vector index and its on-disk layout.
//!
//! [`FlatIndex`] stores unit-length vectors contiguously and answers top-k
//! queries with an exhaustive scan. [`VacancyIndex`] pairs it with the
//! positionally aligned [`Chunk`] array and an [`IndexConfig`] record.
//!
//! A persisted index is a directory holding three artifacts that are always
//! loaded together:
//!
//! ```text
//! vacancies.index   magic "VIDX" | version u16 | dimension u32 | count u64 | count*dimension f32 (LE)
//! chunks.json       JSON array of chunks, one per vector, same order
//! config.json       model identifier, dimension, chunk count, asymmetric-prefix flag
//! ```
//!
//! An index is never mutated after construction. Rebuilding means writing a new
//! directory and swapping handles; see [`IndexHandle`](crate::IndexHandle).

use std::cmp::Ordering;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::chunking::chunk_documents;
use crate::config::RagConfig;
use crate::document::Chunk;
use crate::embedding::{EmbedRole, Embedder};
use crate::error::{RagError, Result};
use crate::vacancy::{Vacancy, with_description};

pub const VECTORS_FILE: &str = "vacancies.index";
pub const CHUNKS_FILE: &str = "chunks.json";
pub const CONFIG_FILE: &str = "config.json";

const MAGIC: u32 = 0x5844_4956; // "VIDX" little-endian
const FORMAT_VERSION: u16 = 1;
const HEADER_LEN: usize = 4 + 2 + 4 + 8;

/// Dense vectors searched by exhaustive inner product.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Build an index from vectors, inferring the dimension from the first one.
    ///
    /// An empty input produces an empty index of dimension zero.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidInput`] if the vectors differ in length.
    pub fn build(vectors: Vec<Vec<f32>>) -> Result<Self> {
        let dimension = vectors.first().map_or(0, Vec::len);
        Self::from_vectors(dimension, vectors)
    }

    /// Build an index of a known dimension, validating every vector against it.
    pub fn from_vectors(dimension: usize, vectors: Vec<Vec<f32>>) -> Result<Self> {
        let mut data = Vec::with_capacity(dimension * vectors.len());
        for (position, vector) in vectors.into_iter().enumerate() {
            if vector.len() != dimension {
                return Err(RagError::InvalidInput(format!(
                    "vector {position} has dimension {}, expected {dimension}",
                    vector.len()
                )));
            }
            data.extend(vector);
        }
        Ok(Self { dimension, data })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors.
    pub fn count(&self) -> usize {
        if self.dimension == 0 { 0 } else { self.data.len() / self.dimension }
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// The vector stored at `position`.
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        if position >= self.count() {
            return None;
        }
        let start = position * self.dimension;
        Some(&self.data[start..start + self.dimension])
    }

    /// Return up to `k` `(position, score)` pairs by descending inner product.
    ///
    /// Equal scores are ordered by ascending position, so results are
    /// deterministic for a fixed index and query.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidInput`] if the query dimension does not match.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimension && !self.is_empty() {
            return Err(RagError::InvalidInput(format!(
                "query has dimension {}, index has dimension {}",
                query.len(),
                self.dimension
            )));
        }

        let k = k.min(self.count());
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dimension)
            .map(|v| v.iter().zip(query).map(|(a, b)| a * b).sum::<f32>())
            .enumerate()
            .collect();

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, rank_order);
            scored.truncate(k);
        }
        scored.sort_by(rank_order);
        Ok(scored)
    }

    /// Serialize to the `vacancies.index` byte layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(HEADER_LEN + self.data.len() * 4);
        buffer.extend_from_slice(&MAGIC.to_le_bytes());
        buffer.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        buffer.extend_from_slice(&(self.dimension as u32).to_le_bytes());
        buffer.extend_from_slice(&(self.count() as u64).to_le_bytes());
        for value in &self.data {
            buffer.extend_from_slice(&value.to_le_bytes());
        }
        buffer
    }

    /// Parse the `vacancies.index` byte layout.
    ///
    /// The error string describes which part of the layout is invalid.
    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, String> {
        if bytes.len() < HEADER_LEN {
            return Err(format!("file is {} bytes, shorter than the header", bytes.len()));
        }
        let (header, body) = bytes.split_at(HEADER_LEN);

        let magic = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        if magic != MAGIC {
            return Err(format!("bad magic {magic:#010x}"));
        }
        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != FORMAT_VERSION {
            return Err(format!("unsupported format version {version}"));
        }
        let dimension = u32::from_le_bytes([header[6], header[7], header[8], header[9]]) as usize;
        let mut count_bytes = [0u8; 8];
        count_bytes.copy_from_slice(&header[10..18]);
        let count = u64::from_le_bytes(count_bytes) as usize;

        let expected = count
            .checked_mul(dimension)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| format!("header overflows: {count} vectors of dimension {dimension}"))?;
        if body.len() != expected {
            return Err(format!(
                "header declares {count} vectors of dimension {dimension} ({expected} bytes), \
                 body has {} bytes",
                body.len()
            ));
        }

        let data = body
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Ok(Self { dimension, data })
    }
}

fn rank_order(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}

/// The persisted config record of an index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexConfig {
    /// Identifier of the embedding model that produced the vectors.
    pub model_name: String,
    pub dimension: usize,
    pub n_chunks: usize,
    /// Whether passages were encoded with the `passage: ` prefix, and queries
    /// must therefore use `query: `.
    pub asymmetric_prefix: bool,
}

/// Vectors plus the chunk metadata they were computed from.
///
/// Invariant: `count() == chunks().len()`; position `i` in the vector store
/// belongs to `chunks()[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct VacancyIndex {
    vectors: FlatIndex,
    chunks: Vec<Chunk>,
    config: IndexConfig,
}

impl VacancyIndex {
    /// Pair vectors with their chunks.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidInput`] if the counts differ.
    pub fn new(
        vectors: FlatIndex,
        chunks: Vec<Chunk>,
        model_name: impl Into<String>,
        asymmetric_prefix: bool,
    ) -> Result<Self> {
        if vectors.count() != chunks.len() {
            return Err(RagError::InvalidInput(format!(
                "{} vectors cannot be paired with {} chunks",
                vectors.count(),
                chunks.len()
            )));
        }
        let config = IndexConfig {
            model_name: model_name.into(),
            dimension: vectors.dimension(),
            n_chunks: chunks.len(),
            asymmetric_prefix,
        };
        Ok(Self { vectors, chunks, config })
    }

    pub fn count(&self) -> usize {
        self.vectors.count()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.vectors.dimension()
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn chunk(&self, position: usize) -> Option<&Chunk> {
        self.chunks.get(position)
    }

    pub fn vectors(&self) -> &FlatIndex {
        &self.vectors
    }

    /// Exact top-k search; see [`FlatIndex::search`].
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        self.vectors.search(query, k)
    }

    /// Write the three index artifacts into `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Io`] if any artifact cannot be written.
    pub fn persist(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| RagError::io(dir, e))?;

        write_file(&dir.join(VECTORS_FILE), &self.vectors.to_bytes())?;
        write_file(&dir.join(CHUNKS_FILE), &serde_json::to_vec(&self.chunks)?)?;
        write_file(&dir.join(CONFIG_FILE), &serde_json::to_vec_pretty(&self.config)?)?;

        info!(
            dir = %dir.display(),
            vectors = self.count(),
            dimension = self.dimension(),
            model = %self.config.model_name,
            "index saved"
        );
        Ok(())
    }

    /// Load an index written by [`persist`](Self::persist).
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Io`] if an artifact is missing or unreadable, and
    /// [`RagError::IndexCorrupt`] if an artifact is malformed or the vector
    /// count, chunk count and config disagree.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();

        let config_path = dir.join(CONFIG_FILE);
        let config: IndexConfig = serde_json::from_slice(&read_file(&config_path)?)
            .map_err(|e| RagError::corrupt(&config_path, e.to_string()))?;

        let vectors_path = dir.join(VECTORS_FILE);
        let vectors = FlatIndex::from_bytes(&read_file(&vectors_path)?)
            .map_err(|message| RagError::corrupt(&vectors_path, message))?;

        let chunks_path = dir.join(CHUNKS_FILE);
        let chunks: Vec<Chunk> = serde_json::from_slice(&read_file(&chunks_path)?)
            .map_err(|e| RagError::corrupt(&chunks_path, e.to_string()))?;

        let mismatch = if chunks.len() != vectors.count() {
            Some(format!("{} chunks but {} vectors", chunks.len(), vectors.count()))
        } else if config.n_chunks != chunks.len() {
            Some(format!("config declares {} chunks, found {}", config.n_chunks, chunks.len()))
        } else if config.dimension != vectors.dimension() && !vectors.is_empty() {
            Some(format!(
                "config declares dimension {}, vectors have {}",
                config.dimension,
                vectors.dimension()
            ))
        } else {
            None
        };
        if let Some(message) = mismatch {
            error!(dir = %dir.display(), %message, "index artifacts disagree");
            return Err(RagError::corrupt(dir, message));
        }

        info!(
            dir = %dir.display(),
            vectors = vectors.count(),
            model = %config.model_name,
            "index loaded"
        );
        Ok(Self { vectors, chunks, config })
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).map_err(|e| RagError::io(path, e))
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| RagError::io(path, e))
}

/// Build an index over a corpus: filter → chunk → encode passages → pair.
///
/// Records whose description is not longer than `config.min_description_length`
/// characters are skipped.
///
/// # Errors
///
/// Returns [`RagError::InvalidInput`] for an invalid chunking setup and
/// propagates embedding failures unchanged.
pub async fn build_index(
    vacancies: &[Vacancy],
    embedder: &Embedder,
    config: &RagConfig,
) -> Result<VacancyIndex> {
    let admitted = if config.min_description_length > 0 {
        with_description(vacancies, config.min_description_length)
    } else {
        vacancies.to_vec()
    };
    info!(
        total = vacancies.len(),
        admitted = admitted.len(),
        min_description_length = config.min_description_length,
        "building index"
    );

    let chunks = chunk_documents(&admitted, config.chunk_size, config.chunk_overlap)?;
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();

    let embedder = embedder.clone().with_batch_size(config.batch_size);
    let vectors = embedder.encode(&texts, EmbedRole::Passage).await.map_err(|e| {
        error!(chunks = texts.len(), error = %e, "encoding failed during index build");
        e
    })?;

    let vectors = FlatIndex::from_vectors(embedder.dimensions(), vectors)?;
    let index = VacancyIndex::new(vectors, chunks, embedder.model_name(), embedder.is_asymmetric())?;

    info!(chunks = index.count(), dimension = index.dimension(), "index built");
    Ok(index)
}
