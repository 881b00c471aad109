//! # pdfqa-rag
//!
//! Retrieval pipeline for answering questions about an uploaded PDF.
//!
//! ## Overview
//!
//! A document is extracted into pages, split into overlapping character
//! windows, embedded, and stored in a persistent vector index. A question is
//! embedded with the same provider, the nearest chunks are rendered into a
//! fixed prompt, and a hosted model composes the answer.
//!
//! - [`FixedSizeChunker`] splits pages into overlapping windows
//! - [`VectorIndex`] embeds and searches chunks over a [`VectorStore`]
//! - [`PersistentVectorStore`] keeps the index in memory and on disk
//! - [`PromptAssembler`] renders the question-answering prompt
//! - [`AnswerEngine`] ties the pieces together
//!
//! ## Features
//!
//! - `gemini` (default): Gemini embedding and generation providers
//! - `pdf` (default): PDF text extraction
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pdfqa_rag::gemini::{GeminiConfig, GeminiEmbeddingProvider, GeminiGenerator};
//! use pdfqa_rag::{AnswerEngine, RagConfig};
//!
//! let gemini = GeminiConfig::from_env()?;
//! let mut engine = AnswerEngine::builder()
//!     .config(RagConfig::from_env()?)
//!     .embedding_provider(Arc::new(GeminiEmbeddingProvider::new(&gemini)?))
//!     .generator(Arc::new(GeminiGenerator::new(&gemini)?))
//!     .build()
//!     .await?;
//!
//! let pages = pdfqa_rag::extract::extract_pages(bytes, "report.pdf".into()).await?;
//! engine.ingest(&pages).await?;
//! println!("{}", engine.answer("What is the report about?").await?);
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod generation;
pub mod index;
pub mod prompt;
pub mod store;
pub mod vectorstore;

#[cfg(feature = "pdf")]
pub mod extract;
#[cfg(feature = "gemini")]
pub mod gemini;

pub use chunking::{Chunker, FixedSizeChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, Page, ScoredChunk};
pub use embedding::EmbeddingProvider;
pub use engine::{
    AnswerEngine, AnswerEngineBuilder, EngineState, IngestSummary, NOT_READY_MESSAGE,
    UNRELATED_MESSAGE,
};
pub use error::{RagError, Result};
pub use generation::TextGenerator;
pub use index::{DEFAULT_TOP_K, VectorIndex};
pub use prompt::{PromptAssembler, QA_TEMPLATE};
pub use store::PersistentVectorStore;
pub use vectorstore::VectorStore;

#[cfg(feature = "gemini")]
pub use gemini::{GeminiConfig, GeminiEmbeddingProvider, GeminiGenerator};
