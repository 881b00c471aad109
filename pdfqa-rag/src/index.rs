//! Embedding-backed similarity index over document chunks.
//!
//! The [`VectorIndex`] pairs an [`EmbeddingProvider`] with a [`VectorStore`]:
//! ingestion embeds chunks and replaces the store contents, queries embed the
//! question and return the nearest chunks.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pdfqa_rag::{PersistentVectorStore, VectorIndex};
//!
//! let index = VectorIndex::new(
//!     Arc::new(my_embedder),
//!     Arc::new(PersistentVectorStore::open("vector_db").await?),
//! );
//! index.ingest(chunks).await?;
//! let results = index.query("What color is the sky?", 3).await?;
//! ```

use std::sync::Arc;

use tracing::{error, info};

use crate::document::{Chunk, ScoredChunk};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// Default number of chunks retrieved per question.
pub const DEFAULT_TOP_K: usize = 3;

/// A similarity index: embed → store on ingest, embed → search on query.
pub struct VectorIndex {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
}

impl VectorIndex {
    /// Create an index over the given provider and store.
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Self {
        Self { embedding_provider, vector_store }
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Returns `true` once the store holds at least one chunk.
    pub async fn is_populated(&self) -> bool {
        !self.vector_store.is_empty().await
    }

    /// Returns `false` when the stored embeddings have a different length
    /// than the provider produces, e.g. after switching embedding models.
    ///
    /// An empty store is always compatible.
    pub async fn matches_provider(&self) -> bool {
        match self.vector_store.dimensions().await {
            Some(stored) => stored == self.embedding_provider.dimensions(),
            None => true,
        }
    }

    /// Embed `chunks` and replace the index contents with them.
    ///
    /// Returns the chunks that were stored (with embeddings attached). The
    /// previous contents are kept if embedding or persisting fails.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] if the provider fails or returns
    /// embeddings of differing lengths, and [`RagError::VectorStore`] if the
    /// store cannot be written.
    pub async fn ingest(&self, mut chunks: Vec<Chunk>) -> Result<Vec<Chunk>> {
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();

        let embeddings = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
            error!(chunk_count = chunks.len(), error = %e, "embedding failed during ingestion");
            e
        })?;

        if embeddings.len() != chunks.len() {
            return Err(RagError::Embedding {
                provider: "index".into(),
                message: format!(
                    "expected {} embeddings, provider returned {}",
                    chunks.len(),
                    embeddings.len()
                ),
            });
        }

        if let Some(first) = embeddings.first() {
            let dimensions = first.len();
            if embeddings.iter().any(|e| e.len() != dimensions) {
                return Err(RagError::Embedding {
                    provider: "index".into(),
                    message: format!(
                        "provider returned embeddings of differing lengths (first has {dimensions})"
                    ),
                });
            }
        }

        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        self.vector_store.replace(&chunks).await.map_err(|e| {
            error!(error = %e, "vector store write failed during ingestion");
            e
        })?;

        info!(chunk_count = chunks.len(), "vector index rebuilt");
        Ok(chunks)
    }

    /// Return the `k` chunks most similar to `question`, best first.
    ///
    /// An unpopulated index returns an empty `Vec` without calling the
    /// embedding provider.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] if the question cannot be embedded and
    /// [`RagError::VectorStore`] if its embedding does not match the stored
    /// dimension.
    pub async fn query(&self, question: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if !self.is_populated().await {
            info!("query against empty index");
            return Ok(Vec::new());
        }

        let query_embedding = self.embedding_provider.embed(question).await.map_err(|e| {
            error!(error = %e, "embedding failed during query");
            e
        })?;

        let results = self.vector_store.search(&query_embedding, k).await.map_err(|e| {
            error!(error = %e, "vector store search failed");
            e
        })?;

        info!(result_count = results.len(), "query completed");
        Ok(results)
    }
}
