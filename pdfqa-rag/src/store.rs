//! Flat cosine-similarity vector store persisted to a directory.
//!
//! [`PersistentVectorStore`] keeps every chunk in memory behind a
//! `tokio::sync::RwLock` and writes a JSON snapshot (`index.json`) into its
//! directory after each [`replace`](VectorStore::replace). The directory
//! layout is private to this module.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::document::{Chunk, ScoredChunk};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

const BACKEND: &str = "Persistent";
const SNAPSHOT_FILE: &str = "index.json";
const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    dimensions: usize,
    chunks: Vec<Chunk>,
}

/// A vector store using cosine similarity, optionally backed by a directory.
///
/// # Example
///
/// ```rust,ignore
/// use pdfqa_rag::PersistentVectorStore;
///
/// let store = PersistentVectorStore::open("vector_db").await?;
/// if store.is_empty().await {
///     println!("no document indexed yet");
/// }
/// ```
#[derive(Debug, Default)]
pub struct PersistentVectorStore {
    dir: Option<PathBuf>,
    chunks: RwLock<Vec<Chunk>>,
}

impl PersistentVectorStore {
    /// Create a store that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the store rooted at `dir`, loading an existing snapshot if present.
    ///
    /// A missing directory or a directory without a snapshot yields an empty
    /// store; the directory is created on the first [`replace`](VectorStore::replace).
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStore`] if a snapshot exists but cannot be
    /// read or parsed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let path = dir.join(SNAPSHOT_FILE);

        let chunks = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes).map_err(|e| {
                    error!(path = %path.display(), error = %e, "corrupt index snapshot");
                    store_error(format!("failed to parse '{}': {e}", path.display()))
                })?;
                if snapshot.version != SNAPSHOT_VERSION {
                    return Err(store_error(format!(
                        "unsupported snapshot version {} in '{}'",
                        snapshot.version,
                        path.display()
                    )));
                }
                if let Some(chunk) =
                    snapshot.chunks.iter().find(|c| c.embedding.len() != snapshot.dimensions)
                {
                    return Err(store_error(format!(
                        "chunk '{}' in '{}' has {} dimensions, snapshot declares {}",
                        chunk.id,
                        path.display(),
                        chunk.embedding.len(),
                        snapshot.dimensions
                    )));
                }
                info!(
                    path = %dir.display(),
                    chunk_count = snapshot.chunks.len(),
                    dimensions = snapshot.dimensions,
                    "loaded existing vector index from disk"
                );
                snapshot.chunks
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %dir.display(), "no existing vector index found");
                Vec::new()
            }
            Err(e) => {
                return Err(store_error(format!("failed to read '{}': {e}", path.display())));
            }
        };

        Ok(Self { dir: Some(dir), chunks: RwLock::new(chunks) })
    }

    /// The directory this store persists to, if any.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    async fn persist(&self, chunks: &[Chunk]) -> Result<()> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };

        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            store_error(format!("failed to create directory '{}': {e}", dir.display()))
        })?;

        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            dimensions: chunks.first().map(|c| c.embedding.len()).unwrap_or(0),
            chunks: chunks.to_vec(),
        };
        let bytes = serde_json::to_vec(&snapshot)
            .map_err(|e| store_error(format!("failed to serialize snapshot: {e}")))?;

        // Written beside the snapshot, then renamed over it.
        let tmp = dir.join(format!("{SNAPSHOT_FILE}.tmp"));
        let path = dir.join(SNAPSHOT_FILE);
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| store_error(format!("failed to write '{}': {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| store_error(format!("failed to replace '{}': {e}", path.display())))?;

        debug!(path = %path.display(), bytes = bytes.len(), "persisted vector index");
        Ok(())
    }
}

fn store_error(message: String) -> RagError {
    RagError::VectorStore { backend: BACKEND.to_string(), message }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for PersistentVectorStore {
    async fn replace(&self, chunks: &[Chunk]) -> Result<()> {
        if let Some(chunk) = chunks.iter().find(|c| c.embedding.is_empty()) {
            return Err(store_error(format!("chunk '{}' has no embedding", chunk.id)));
        }
        let dimensions = chunks.first().map(|c| c.embedding.len()).unwrap_or(0);
        if let Some(chunk) = chunks.iter().find(|c| c.embedding.len() != dimensions) {
            return Err(store_error(format!(
                "chunk '{}' has {} dimensions, expected {dimensions}",
                chunk.id,
                chunk.embedding.len()
            )));
        }

        // Memory and disk change under the same write lock.
        let mut stored = self.chunks.write().await;
        self.persist(chunks).await?;
        *stored = chunks.to_vec();
        Ok(())
    }

    async fn len(&self) -> usize {
        self.chunks.read().await.len()
    }

    async fn dimensions(&self) -> Option<usize> {
        self.chunks.read().await.first().map(|c| c.embedding.len())
    }

    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        let stored = self.chunks.read().await;

        if let Some(first) = stored.first() {
            if first.embedding.len() != embedding.len() {
                return Err(store_error(format!(
                    "query embedding has {} dimensions, index has {}",
                    embedding.len(),
                    first.embedding.len()
                )));
            }
        }

        let mut scored: Vec<ScoredChunk> = stored
            .iter()
            .map(|chunk| ScoredChunk {
                chunk: chunk.clone(),
                score: cosine_similarity(&chunk.embedding, embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn chunk(id: &str, embedding: Vec<f32>) -> Chunk {
        Chunk { id: id.into(), text: id.into(), embedding, metadata: HashMap::new() }
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[2.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn replace_rejects_unembedded_chunks() {
        let store = PersistentVectorStore::in_memory();
        let err = store.replace(&[chunk("a", Vec::new())]).await.unwrap_err();
        assert!(matches!(err, RagError::VectorStore { .. }));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn search_orders_best_first() {
        let store = PersistentVectorStore::in_memory();
        store
            .replace(&[chunk("far", vec![0.0, 1.0]), chunk("near", vec![1.0, 0.1])])
            .await
            .unwrap();
        let results = store.search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results[0].chunk.id, "near");
        assert_eq!(results[1].chunk.id, "far");
    }

    #[tokio::test]
    async fn snapshot_round_trips_through_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index");

        let store = PersistentVectorStore::open(&path).await.unwrap();
        assert!(store.is_empty().await);
        store.replace(&[chunk("a", vec![1.0, 0.0])]).await.unwrap();

        let reopened = PersistentVectorStore::open(&path).await.unwrap();
        assert_eq!(reopened.len().await, 1);
        assert_eq!(reopened.dir(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn replace_rejects_mixed_dimensions() {
        let store = PersistentVectorStore::in_memory();
        let err = store
            .replace(&[chunk("a", vec![1.0, 0.0]), chunk("b", vec![1.0, 0.0, 0.0])])
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::VectorStore { .. }));
        assert_eq!(store.dimensions().await, None);
    }

    #[tokio::test]
    async fn search_rejects_query_of_other_dimension() {
        let store = PersistentVectorStore::in_memory();
        store.replace(&[chunk("a", vec![1.0, 0.0, 0.0])]).await.unwrap();
        assert_eq!(store.dimensions().await, Some(3));

        let err = store.search(&[1.0, 0.0], 1).await.unwrap_err();
        assert!(matches!(err, RagError::VectorStore { .. }));
    }

    #[tokio::test]
    async fn snapshot_with_inconsistent_dimensions_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            dimensions: 3,
            chunks: vec![chunk("a", vec![1.0, 0.0])],
        };
        std::fs::write(dir.path().join(SNAPSHOT_FILE), serde_json::to_vec(&snapshot).unwrap())
            .unwrap();

        let err = PersistentVectorStore::open(dir.path()).await.unwrap_err();
        assert!(matches!(err, RagError::VectorStore { .. }));
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SNAPSHOT_FILE), b"not json").unwrap();
        let err = PersistentVectorStore::open(dir.path()).await.unwrap_err();
        assert!(matches!(err, RagError::VectorStore { .. }));
    }
}
