//! Question-answering prompt template.

use crate::document::ScoredChunk;

/// Instruction template with `{context}` and `{question}` placeholders.
pub const QA_TEMPLATE: &str = r#"You are a helpful AI assistant.
Use the context below to answer the question thoroughly with as much relevant information possible include details.
If the answer is not in the context, say "I don't know."

Context:
{context}

Question:
{question}

Answer:"#;

/// Renders [`QA_TEMPLATE`] from retrieved chunks and a question.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptAssembler;

impl PromptAssembler {
    /// Join chunk texts in ranked order, separated by a blank line.
    pub fn context(results: &[ScoredChunk]) -> String {
        results.iter().map(|r| r.chunk.text.as_str()).collect::<Vec<_>>().join("\n\n")
    }

    /// Fill the template with trimmed `context` and `question`.
    pub fn render(context: &str, question: &str) -> String {
        // Single pass, so placeholder text inside the context is left alone.
        let (head, rest) = QA_TEMPLATE.split_once("{context}").unwrap_or((QA_TEMPLATE, ""));
        let (middle, tail) = rest.split_once("{question}").unwrap_or((rest, ""));
        format!("{head}{}{middle}{}{tail}", context.trim(), question.trim())
    }
}
