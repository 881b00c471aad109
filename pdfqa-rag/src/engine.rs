//! Question-answering engine over a single uploaded document.
//!
//! The [`AnswerEngine`] is the composition root: it owns the chunker, the
//! [`VectorIndex`], and the [`TextGenerator`], and moves from
//! [`EngineState::NotReady`] to [`EngineState::Ready`] once a document has
//! been indexed (or an index was found on disk).
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pdfqa_rag::{AnswerEngine, RagConfig};
//!
//! let mut engine = AnswerEngine::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .generator(Arc::new(generator))
//!     .build()
//!     .await?;
//!
//! engine.ingest(&pages).await?;
//! let answer = engine.answer("What color is the sky?").await?;
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::chunking::{Chunker, FixedSizeChunker};
use crate::config::RagConfig;
use crate::document::{Page, ScoredChunk};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::TextGenerator;
use crate::index::VectorIndex;
use crate::prompt::PromptAssembler;
use crate::store::PersistentVectorStore;
use crate::vectorstore::VectorStore;

/// Reply to a question asked before any document was indexed.
pub const NOT_READY_MESSAGE: &str =
    "Knowledge base is not ready. Please upload and process a PDF first.";

/// Reply when retrieval finds nothing usable for the question.
pub const UNRELATED_MESSAGE: &str =
    "I'm unable to answer this question as it doesn't appear related to the uploaded document.";

/// Whether the engine has an index to answer from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// No document has been indexed.
    NotReady,
    /// An index is loaded and can be queried.
    Ready,
}

/// Counts reported after a successful [`AnswerEngine::ingest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    /// Pages that contributed text.
    pub pages: usize,
    /// Chunks stored in the index.
    pub chunks: usize,
}

/// Answers questions about the most recently ingested document.
pub struct AnswerEngine {
    config: RagConfig,
    chunker: Arc<dyn Chunker>,
    index: VectorIndex,
    generator: Arc<dyn TextGenerator>,
    state: EngineState,
}

impl AnswerEngine {
    /// Create a new [`AnswerEngineBuilder`].
    pub fn builder() -> AnswerEngineBuilder {
        AnswerEngineBuilder::default()
    }

    /// Return a reference to the engine configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the vector index.
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Current state of the engine.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Returns `true` when questions can be answered from an index.
    pub fn is_ready(&self) -> bool {
        self.state == EngineState::Ready
    }

    /// Chunk, embed, and index `pages`, replacing any previous document.
    /// Pages with only whitespace are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Extraction`] if no page carries text, leaving the
    /// engine state unchanged. Embedding and store failures propagate as
    /// [`RagError::Embedding`] and [`RagError::VectorStore`].
    pub async fn ingest(&mut self, pages: &[Page]) -> Result<IngestSummary> {
        let pages_with_text: Vec<Page> =
            pages.iter().filter(|p| !p.text.trim().is_empty()).cloned().collect();
        if pages_with_text.is_empty() {
            warn!(page_count = pages.len(), "document has no extractable text");
            return Err(RagError::Extraction("no text found in the uploaded document".into()));
        }

        let chunks = self.chunker.split(&pages_with_text);
        let stored = self.index.ingest(chunks).await?;

        self.state = EngineState::Ready;
        let summary = IngestSummary { pages: pages_with_text.len(), chunks: stored.len() };
        info!(pages = summary.pages, chunks = summary.chunks, "document indexed, engine ready");
        Ok(summary)
    }

    /// Answer `question` from the indexed document.
    ///
    /// Returns [`NOT_READY_MESSAGE`] without any external call when nothing
    /// is indexed, and [`UNRELATED_MESSAGE`] when retrieval yields no usable
    /// chunk. Otherwise the generative model is called once and its text is
    /// returned verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] or [`RagError::Generation`] when the
    /// corresponding service fails. Nothing is retried.
    pub async fn answer(&self, question: &str) -> Result<String> {
        if !self.is_ready() {
            info!("question asked before any document was indexed");
            return Ok(NOT_READY_MESSAGE.to_string());
        }

        let results = self.index.query(question, self.config.top_k).await?;
        for (i, result) in results.iter().enumerate() {
            info!(
                rank = i + 1,
                chunk.id = %result.chunk.id,
                score = result.score,
                "Chunk {}: similarity score = {:.4}",
                i + 1,
                result.score
            );
        }

        let results = self.apply_relevance_floor(results);
        if results.is_empty() {
            return Ok(UNRELATED_MESSAGE.to_string());
        }

        let context = PromptAssembler::context(&results);
        let prompt = PromptAssembler::render(&context, question);
        self.generator.generate(&prompt).await
    }

    fn apply_relevance_floor(&self, results: Vec<ScoredChunk>) -> Vec<ScoredChunk> {
        match self.config.relevance_floor {
            Some(floor) => {
                let before = results.len();
                let kept: Vec<ScoredChunk> =
                    results.into_iter().filter(|r| r.score >= floor).collect();
                if kept.len() < before {
                    info!(
                        floor,
                        dropped = before - kept.len(),
                        "dropped chunks below relevance floor"
                    );
                }
                kept
            }
            None => results,
        }
    }
}

/// Builder for constructing an [`AnswerEngine`].
///
/// `embedding_provider` and `generator` are required. When no vector store is
/// given, a [`PersistentVectorStore`] is opened at the configured
/// `persist_dir`; when no chunker is given, a [`FixedSizeChunker`] with the
/// configured size and overlap is used.
#[derive(Default)]
pub struct AnswerEngineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    generator: Option<Arc<dyn TextGenerator>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl AnswerEngineBuilder {
    /// Set the engine configuration. Defaults to [`RagConfig::default`].
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the generative model.
    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Use `store` instead of opening one at the configured directory.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Use a custom chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`AnswerEngine`], loading any persisted index.
    ///
    /// The engine starts [`EngineState::Ready`] if the store already holds
    /// chunks whose embedding length matches the provider's
    /// [`dimensions`](EmbeddingProvider::dimensions). A mismatched index is
    /// kept but left unused until the next [`AnswerEngine::ingest`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required field is missing and
    /// [`RagError::VectorStore`] if a persisted index cannot be loaded.
    pub async fn build(self) -> Result<AnswerEngine> {
        let config = self.config.unwrap_or_default();
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let generator =
            self.generator.ok_or_else(|| RagError::Config("generator is required".to_string()))?;

        let vector_store: Arc<dyn VectorStore> = match self.vector_store {
            Some(store) => store,
            None => Arc::new(PersistentVectorStore::open(&config.persist_dir).await?),
        };
        let chunker: Arc<dyn Chunker> = self.chunker.unwrap_or_else(|| {
            Arc::new(FixedSizeChunker::new(config.chunk_size, config.chunk_overlap))
        });

        let index = VectorIndex::new(embedding_provider, vector_store);
        let state = if !index.is_populated().await {
            EngineState::NotReady
        } else if !index.matches_provider().await {
            let stored = index.vector_store().dimensions().await;
            warn!(
                stored = ?stored,
                provider = index.embedding_provider().dimensions(),
                "persisted index was built with a different embedding model, upload again"
            );
            EngineState::NotReady
        } else {
            EngineState::Ready
        };
        info!(?state, persist_dir = %config.persist_dir.display(), "answer engine created");

        Ok(AnswerEngine { config, chunker, index, generator, state })
    }
}
