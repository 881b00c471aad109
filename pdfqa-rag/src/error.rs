//! Error types for the `pdfqa-rag` crate.

use thiserror::Error;

/// Errors that can occur while ingesting documents or answering questions.
#[derive(Debug, Error)]
pub enum RagError {
    /// The uploaded document did not contain any extractable text.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred while generating an answer.
    #[error("Generation error ({provider}): {message}")]
    Generation {
        /// The generative model provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred reading or writing the vector store.
    #[error("Vector store error ({backend}): {message}")]
    VectorStore {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RagError {
    /// Returns `true` if the error came from an external model service.
    pub fn is_provider_error(&self) -> bool {
        matches!(self, Self::Embedding { .. } | Self::Generation { .. })
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
