//! Splitting extracted pages into overlapping fixed-size windows.

use crate::document::{CHUNK_INDEX_KEY, Chunk, Page};

/// A strategy for splitting pages into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata but no embeddings.
/// Embeddings are attached later by the [`VectorIndex`](crate::VectorIndex).
pub trait Chunker: Send + Sync {
    /// Split a sequence of pages into chunks.
    ///
    /// Returns an empty `Vec` for empty input. Chunks never cross a page
    /// boundary.
    fn split(&self, pages: &[Page]) -> Vec<Chunk>;
}

/// Splits each page into fixed-size character windows with overlap.
///
/// The window advances by `chunk_size - chunk_overlap` characters until the
/// rest of the page fits in a single window, which becomes the final (possibly
/// shorter) chunk. Sizes count `char`s, so multi-byte text is never cut
/// inside a code point.
///
/// Chunk IDs are generated as `p{page}_{chunk_index}`. Each chunk inherits
/// the page's metadata plus a `chunk_index` field.
///
/// # Example
///
/// ```rust,ignore
/// use pdfqa_rag::{Chunker, FixedSizeChunker, Page};
///
/// let chunker = FixedSizeChunker::new(500, 100);
/// let chunks = chunker.split(&[Page::new("The sky is blue.", 1)]);
/// assert_eq!(chunks.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Windows of `chunk_size` characters, each starting `chunk_overlap`
    /// characters before the previous one ends.
    ///
    /// Callers are expected to pass values validated by
    /// [`RagConfigBuilder::build`](crate::RagConfigBuilder::build); an overlap
    /// that is not smaller than the size degrades to a one-character step.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size: chunk_size.max(1), chunk_overlap }
    }

    /// Number of characters the window advances per step.
    fn step(&self) -> usize {
        self.chunk_size.saturating_sub(self.chunk_overlap).max(1)
    }

    /// Split a single text into windows.
    fn windows<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let step = self.step();
        let mut windows = Vec::new();
        let mut rest = text;
        while !rest.is_empty() {
            // Byte offset just past a full window; `None` once the rest fits.
            let Some((end, _)) = rest.char_indices().nth(self.chunk_size) else {
                windows.push(rest);
                break;
            };
            windows.push(&rest[..end]);
            let next = rest.char_indices().nth(step).map_or(rest.len(), |(i, _)| i);
            rest = &rest[next..];
        }
        windows
    }
}

impl Default for FixedSizeChunker {
    fn default() -> Self {
        Self::new(500, 100)
    }
}

impl Chunker for FixedSizeChunker {
    fn split(&self, pages: &[Page]) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for (position, page) in pages.iter().enumerate() {
            let page_number = page.page_number().unwrap_or(position + 1);
            for (chunk_index, text) in self.windows(&page.text).into_iter().enumerate() {
                let mut metadata = page.metadata.clone();
                metadata.insert(CHUNK_INDEX_KEY.to_string(), chunk_index.to_string());

                chunks.push(Chunk {
                    id: format!("p{page_number}_{chunk_index}"),
                    text: text.to_string(),
                    embedding: Vec::new(),
                    metadata,
                });
            }
        }

        chunks
    }
}
