//! Configuration for the retrieval pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Default directory holding the persisted vector index.
pub const DEFAULT_PERSIST_DIR: &str = "vector_db";

/// Configuration parameters for chunking, retrieval, and persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Minimum similarity a chunk needs to be used as context.
    ///
    /// `None` keeps every retrieved chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_floor: Option<f32>,
    /// Directory where the vector index is persisted.
    pub persist_dir: PathBuf,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 100,
            top_k: 3,
            relevance_floor: None,
            persist_dir: PathBuf::from(DEFAULT_PERSIST_DIR),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Build a configuration from `PDFQA_*` environment variables.
    ///
    /// Recognised variables: `PDFQA_CHUNK_SIZE`, `PDFQA_CHUNK_OVERLAP`,
    /// `PDFQA_TOP_K`, `PDFQA_RELEVANCE_FLOOR`, and `PDFQA_PERSIST_DIR`.
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a variable cannot be parsed or the
    /// resulting configuration is invalid.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();
        if let Some(size) = env_parse::<usize>("PDFQA_CHUNK_SIZE")? {
            builder = builder.chunk_size(size);
        }
        if let Some(overlap) = env_parse::<usize>("PDFQA_CHUNK_OVERLAP")? {
            builder = builder.chunk_overlap(overlap);
        }
        if let Some(k) = env_parse::<usize>("PDFQA_TOP_K")? {
            builder = builder.top_k(k);
        }
        if let Some(floor) = env_parse::<f32>("PDFQA_RELEVANCE_FLOOR")? {
            builder = builder.relevance_floor(floor);
        }
        if let Ok(dir) = std::env::var("PDFQA_PERSIST_DIR") {
            builder = builder.persist_dir(dir);
        }
        builder.build()
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| RagError::Config(format!("invalid {name} value '{raw}': {e}"))),
        Err(_) => Ok(None),
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of chunks retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Drop retrieved chunks whose similarity is below `floor`.
    pub fn relevance_floor(mut self, floor: f32) -> Self {
        self.config.relevance_floor = Some(floor);
        self
    }

    /// Set the directory where the vector index is persisted.
    pub fn persist_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.persist_dir = dir.into();
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    pub fn build(self) -> Result<RagConfig> {
        if self.config.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.config.chunk_overlap >= self.config.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.config.chunk_overlap, self.config.chunk_size
            )));
        }
        if self.config.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_and_retrieval_sizes() {
        let config = RagConfig::default();
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 100);
        assert_eq!(config.top_k, 3);
        assert_eq!(config.relevance_floor, None);
        assert_eq!(config.persist_dir, PathBuf::from(DEFAULT_PERSIST_DIR));
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        let err = RagConfig::builder().chunk_size(100).chunk_overlap(100).build().unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
    }

    #[test]
    fn rejects_zero_top_k() {
        assert!(RagConfig::builder().top_k(0).build().is_err());
    }

    #[test]
    fn builder_sets_floor_and_dir() {
        let config =
            RagConfig::builder().relevance_floor(0.4).persist_dir("/tmp/idx").build().unwrap();
        assert_eq!(config.relevance_floor, Some(0.4));
        assert_eq!(config.persist_dir, PathBuf::from("/tmp/idx"));
    }
}
