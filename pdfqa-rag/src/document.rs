//! Data types for extracted pages, chunks, and search results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Metadata key holding the 1-based page number of a page or chunk.
pub const PAGE_KEY: &str = "page";
/// Metadata key holding the name of the uploaded source.
pub const SOURCE_KEY: &str = "source";
/// Metadata key holding the position of a chunk within its page.
pub const CHUNK_INDEX_KEY: &str = "chunk_index";

/// A single extracted page of an uploaded document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page {
    /// The extracted text of the page.
    pub text: String,
    /// Key-value metadata such as the page number and source name.
    pub metadata: HashMap<String, String>,
}

impl Page {
    /// Create a page with the given text and 1-based page number.
    pub fn new(text: impl Into<String>, page_number: usize) -> Self {
        let metadata = HashMap::from([(PAGE_KEY.to_string(), page_number.to_string())]);
        Self { text: text.into(), metadata }
    }

    /// Attach the name of the document this page was extracted from.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.metadata.insert(SOURCE_KEY.to_string(), source.into());
        self
    }

    /// The page number recorded in the metadata, if any.
    pub fn page_number(&self) -> Option<usize> {
        self.metadata.get(PAGE_KEY).and_then(|p| p.parse().ok())
    }
}

/// A window of a [`Page`]'s text with its vector embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier for the chunk.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// The vector embedding for this chunk's text. Empty until indexed.
    #[serde(default)]
    pub embedding: Vec<f32>,
    /// Metadata copied from the source page plus `chunk_index`.
    pub metadata: HashMap<String, String>,
}

/// A retrieved [`Chunk`] paired with its cosine similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}
