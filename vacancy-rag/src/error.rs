//! Error types for the `vacancy-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building, loading, or querying a vacancy index.
#[derive(Debug, Error)]
pub enum RagError {
    /// A caller-supplied argument was rejected before any work started.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The query string was empty or whitespace only.
    #[error("Query must not be empty")]
    EmptyQuery,

    /// The embedding model could not be resolved or initialized.
    #[error("Failed to load embedding model '{model}': {message}")]
    ModelLoad {
        /// The model identifier that failed to load.
        model: String,
        /// A description of the failure.
        message: String,
    },

    /// A loaded embedding model failed while encoding text.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The persisted index artifacts are missing, malformed, or disagree with each other.
    #[error("Index at {} is corrupt: {message}", path.display())]
    IndexCorrupt {
        /// The index directory or artifact that failed validation.
        path: PathBuf,
        /// A description of the mismatch.
        message: String,
    },

    /// Reading or writing an index artifact failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// The file that was being read or written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization of records, chunks, or config failed.
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// The answer-generation collaborator failed.
    #[error("Generation error ({provider}): {message}")]
    Generation {
        /// The generator that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RagError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::IndexCorrupt { path: path.into(), message: message.into() }
    }
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
