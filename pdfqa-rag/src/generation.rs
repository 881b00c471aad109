//! Generative model trait used to compose answers.

use async_trait::async_trait;

use crate::error::Result;

/// A hosted text-completion model.
///
/// The [`AnswerEngine`](crate::AnswerEngine) calls
/// [`generate`](TextGenerator::generate) exactly once per answered question
/// and returns the text unmodified. Failures are reported as
/// [`RagError::Generation`](crate::RagError::Generation).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete the given prompt and return the model's text.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
