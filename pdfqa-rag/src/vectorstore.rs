//! Vector store trait for storing and searching vector embeddings.

use async_trait::async_trait;

use crate::document::{Chunk, ScoredChunk};
use crate::error::Result;

/// A storage backend for chunk embeddings with similarity search.
///
/// The store holds the chunks of a single document. Population is
/// replace-only: [`replace`](VectorStore::replace) swaps the whole content,
/// which is what re-uploading a document means for the engine.
///
/// # Example
///
/// ```rust,ignore
/// use pdfqa_rag::{PersistentVectorStore, VectorStore};
///
/// let store = PersistentVectorStore::open("vector_db").await?;
/// store.replace(&chunks).await?;
/// let results = store.search(&query_embedding, 3).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Replace every stored chunk with `chunks`. Chunks must have embeddings
    /// set, all of the same length.
    async fn replace(&self, chunks: &[Chunk]) -> Result<()>;

    /// Number of stored chunks.
    async fn len(&self) -> usize;

    /// Returns `true` if no chunk has been stored.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Embedding length shared by every stored chunk, `None` when empty.
    async fn dimensions(&self) -> Option<usize>;

    /// Search for the `top_k` most similar chunks to the given embedding.
    ///
    /// Returns results ordered by descending similarity score. An embedding
    /// whose length differs from [`dimensions`](VectorStore::dimensions) is
    /// an error.
    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>>;
}
