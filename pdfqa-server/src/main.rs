use std::sync::Arc;

use pdfqa_rag::{AnswerEngine, GeminiConfig, GeminiEmbeddingProvider, GeminiGenerator, RagConfig};
use pdfqa_server::server::{ServerConfig, run_server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let gemini = GeminiConfig::from_env()?;
    let config = RagConfig::from_env()?;

    let engine = AnswerEngine::builder()
        .config(config)
        .embedding_provider(Arc::new(GeminiEmbeddingProvider::new(&gemini)?))
        .generator(Arc::new(GeminiGenerator::new(&gemini)?))
        .build()
        .await?;

    tracing::info!(state = ?engine.state(), "answer engine initialized");
    run_server(ServerConfig::from_env(), engine).await
}
