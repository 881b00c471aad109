//! Deterministic providers shared by the integration tests.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use pdfqa_rag::{EmbeddingProvider, RagError, Result, TextGenerator};

pub const DIM: usize = 64;

/// Bag-of-words embedding: each lowercase word bumps one hashed dimension.
pub fn bag_of_words(text: &str) -> Vec<f32> {
    bag_of_words_in(text, DIM)
}

pub fn bag_of_words_in(text: &str, dim: usize) -> Vec<f32> {
    let mut emb = vec![0.0f32; dim];
    for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        let hash = word
            .to_lowercase()
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        emb[(hash % dim as u64) as usize] += 1.0;
    }
    let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        emb.iter_mut().for_each(|x| *x /= norm);
    }
    emb
}

/// Embedding provider that counts calls and can be switched to fail.
#[derive(Default)]
pub struct MockEmbeddingProvider {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl MockEmbeddingProvider {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RagError::Embedding {
                provider: "Mock".into(),
                message: "quota exceeded".into(),
            });
        }
        Ok(bag_of_words(text))
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// Same hashing as [`MockEmbeddingProvider`] but into three dimensions, as a
/// stand-in for a different embedding model.
#[derive(Default)]
pub struct NarrowEmbeddingProvider {
    pub calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for NarrowEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(bag_of_words_in(text, 3))
    }

    fn dimensions(&self) -> usize {
        3
    }
}

/// Generator that records every prompt and replies with a fixed answer.
pub struct RecordingGenerator {
    pub reply: String,
    pub prompts: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

impl RecordingGenerator {
    pub fn new(reply: impl Into<String>) -> Self {
        Self { reply: reply.into(), prompts: Mutex::new(Vec::new()), fail: AtomicBool::new(false) }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(RagError::Generation {
                provider: "Mock".into(),
                message: "service unavailable".into(),
            });
        }
        Ok(self.reply.clone())
    }
}
