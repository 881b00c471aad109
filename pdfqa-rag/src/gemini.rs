//! Gemini embedding and generation providers over the REST API.
//!
//! This module is only available when the `gemini` feature is enabled.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::TextGenerator;

const PROVIDER: &str = "Gemini";

/// The default Gemini API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// The default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "models/text-embedding-004";

/// The default generation model.
pub const DEFAULT_GENERATION_MODEL: &str = "models/gemini-2.0-flash-lite";

/// Output dimensionality of `text-embedding-004`.
pub const DEFAULT_DIMENSIONS: usize = 768;

/// `batchEmbedContents` accepts at most this many requests per call.
const MAX_BATCH: usize = 100;

/// Connection and model settings shared by the Gemini providers.
#[derive(Debug, Clone, PartialEq)]
pub struct GeminiConfig {
    /// API key sent in the `x-goog-api-key` header.
    pub api_key: String,
    /// Base URL of the API, ending with a slash.
    pub base_url: String,
    /// Embedding model name, e.g. `models/text-embedding-004`.
    pub embedding_model: String,
    /// Length of the vectors the embedding model returns.
    pub embedding_dimensions: usize,
    /// Generation model name, e.g. `models/gemini-2.0-flash-lite`.
    pub generation_model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling probability mass.
    pub top_p: f32,
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
}

impl GeminiConfig {
    /// Create a configuration with the default models and sampling settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dimensions: DEFAULT_DIMENSIONS,
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            temperature: 0.3,
            top_p: 0.2,
            max_output_tokens: 1024,
        }
    }

    /// Read the API key from `GOOGLE_API_KEY` (or `GEMINI_API_KEY`).
    ///
    /// `PDFQA_EMBEDDING_MODEL`, `PDFQA_EMBEDDING_DIMENSIONS`,
    /// `PDFQA_GENERATION_MODEL`, and `PDFQA_GEMINI_BASE_URL` override the
    /// defaults when set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if neither key variable is set or
    /// `PDFQA_EMBEDDING_DIMENSIONS` is not a positive integer.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GOOGLE_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .map_err(|_| {
                RagError::Config(
                    "GOOGLE_API_KEY (or GEMINI_API_KEY) environment variable not set".into(),
                )
            })?;

        let mut config = Self::new(api_key);
        if let Ok(model) = std::env::var("PDFQA_EMBEDDING_MODEL") {
            config.embedding_model = model;
        }
        if let Ok(raw) = std::env::var("PDFQA_EMBEDDING_DIMENSIONS") {
            config.embedding_dimensions =
                raw.trim().parse::<usize>().ok().filter(|d| *d > 0).ok_or_else(|| {
                    RagError::Config(format!("invalid PDFQA_EMBEDDING_DIMENSIONS value '{raw}'"))
                })?;
        }
        if let Ok(model) = std::env::var("PDFQA_GENERATION_MODEL") {
            config.generation_model = model;
        }
        if let Ok(base_url) = std::env::var("PDFQA_GEMINI_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }
}

/// Thin HTTP client for the Gemini REST endpoints used here.
#[derive(Debug)]
struct GeminiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl GeminiClient {
    fn new(config: &GeminiConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(RagError::Config("Gemini API key must not be empty".into()));
        }

        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| RagError::Config(format!("invalid Gemini base URL '{base}': {e}")))?;

        let key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| RagError::Config(format!("invalid Gemini API key: {e}")))?;
        let headers = HeaderMap::from_iter([(HeaderName::from_static("x-goog-api-key"), key)]);
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| RagError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, base_url })
    }

    /// `{base}/models/{model}:{endpoint}`; the `models/` prefix is optional.
    fn url(&self, model: &str, endpoint: &str) -> std::result::Result<Url, String> {
        let model = model.strip_prefix("models/").unwrap_or(model);
        let suffix = format!("models/{model}:{endpoint}");
        self.base_url.join(&suffix).map_err(|e| format!("failed to construct URL '{suffix}': {e}"))
    }

    async fn post_json<Req, Res>(&self, url: Url, body: &Req) -> std::result::Result<Res, String>
    where
        Req: Serialize + ?Sized,
        Res: for<'de> Deserialize<'de>,
    {
        let response = self
            .http
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| format!("request to '{url}' failed: {e}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(format!("API returned {status}: {detail}"));
        }

        response.json().await.map_err(|e| format!("failed to parse response: {e}"))
    }
}

// ── Gemini API request/response types ──────────────────────────────

#[derive(Serialize, Deserialize, Debug, Clone)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct Part {
    #[serde(default)]
    text: String,
}

impl Content {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self { role: role.map(str::to_string), parts: vec![Part { text: text.to_string() }] }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content,
    task_type: TaskType,
}

#[derive(Serialize)]
struct BatchEmbedContentsRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct BatchEmbedContentsResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Retrieval task hint sent with each embedding request.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    /// The text is a question to search with.
    RetrievalQuery,
    /// The text is a document chunk to be searched.
    RetrievalDocument,
}

// ── Providers ──────────────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by the Gemini embedding API.
///
/// [`embed`](EmbeddingProvider::embed) sends [`TaskType::RetrievalQuery`];
/// [`embed_batch`](EmbeddingProvider::embed_batch) sends
/// [`TaskType::RetrievalDocument`] through `batchEmbedContents`, split into
/// requests of at most 100 texts.
///
/// # Example
///
/// ```rust,ignore
/// use pdfqa_rag::gemini::{GeminiConfig, GeminiEmbeddingProvider};
///
/// let provider = GeminiEmbeddingProvider::new(&GeminiConfig::from_env()?)?;
/// let embedding = provider.embed("hello world").await?;
/// ```
#[derive(Debug, Clone)]
pub struct GeminiEmbeddingProvider {
    client: Arc<GeminiClient>,
    model: String,
    dimensions: usize,
}

impl GeminiEmbeddingProvider {
    /// Create a new provider from the given configuration.
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let client = GeminiClient::new(config)?;
        Ok(Self {
            client: Arc::new(client),
            model: model_path(&config.embedding_model),
            dimensions: config.embedding_dimensions,
        })
    }

    /// Override the reported dimensionality for models other than the default.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self
    }

    fn request<'a>(&'a self, text: &str, task_type: TaskType) -> EmbedContentRequest<'a> {
        EmbedContentRequest { model: &self.model, content: Content::text(None, text), task_type }
    }
}

/// `name` with a `models/` prefix, as the API expects in request bodies.
fn model_path(name: &str) -> String {
    if name.starts_with("models/") { name.to_string() } else { format!("models/{name}") }
}

fn embedding_error(message: String) -> RagError {
    RagError::Embedding { provider: PROVIDER.into(), message }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), "embedding single text");

        let url = self.client.url(&self.model, "embedContent").map_err(embedding_error)?;
        let body = self.request(text, TaskType::RetrievalQuery);
        let response: EmbedContentResponse =
            self.client.post_json(url, &body).await.map_err(|e| {
                error!(provider = PROVIDER, error = %e, "embedding request failed");
                embedding_error(e)
            })?;

        Ok(response.embedding.values)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = PROVIDER,
            batch_size = texts.len(),
            model = %self.model,
            "embedding batch"
        );

        let url = self.client.url(&self.model, "batchEmbedContents").map_err(embedding_error)?;
        let mut results = Vec::with_capacity(texts.len());

        for batch in texts.chunks(MAX_BATCH) {
            let body = BatchEmbedContentsRequest {
                requests: batch
                    .iter()
                    .map(|text| self.request(text, TaskType::RetrievalDocument))
                    .collect(),
            };
            let response: BatchEmbedContentsResponse =
                self.client.post_json(url.clone(), &body).await.map_err(|e| {
                    error!(provider = PROVIDER, error = %e, "batch embedding request failed");
                    embedding_error(e)
                })?;

            if response.embeddings.len() != batch.len() {
                return Err(embedding_error(format!(
                    "expected {} embeddings, API returned {}",
                    batch.len(),
                    response.embeddings.len()
                )));
            }
            results.extend(response.embeddings.into_iter().map(|e| e.values));
        }

        Ok(results)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// A [`TextGenerator`] backed by Gemini `generateContent`.
///
/// # Example
///
/// ```rust,ignore
/// use pdfqa_rag::gemini::{GeminiConfig, GeminiGenerator};
///
/// let generator = GeminiGenerator::new(&GeminiConfig::from_env()?)?;
/// let text = generator.generate("Say hello").await?;
/// ```
#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    client: Arc<GeminiClient>,
    model: String,
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
}

impl GeminiGenerator {
    /// Create a new generator from the given configuration.
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let client = GeminiClient::new(config)?;
        Ok(Self {
            client: Arc::new(client),
            model: model_path(&config.generation_model),
            temperature: config.temperature,
            top_p: config.top_p,
            max_output_tokens: config.max_output_tokens,
        })
    }
}

fn generation_error(message: String) -> RagError {
    RagError::Generation { provider: PROVIDER.into(), message }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(provider = PROVIDER, model = %self.model, prompt_len = prompt.len(), "generating");

        let url = self.client.url(&self.model, "generateContent").map_err(generation_error)?;
        let body = GenerateContentRequest {
            contents: vec![Content::text(Some("user"), prompt)],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                top_p: self.top_p,
                max_output_tokens: self.max_output_tokens,
            },
        };

        let response: GenerateContentResponse =
            self.client.post_json(url, &body).await.map_err(|e| {
                error!(provider = PROVIDER, error = %e, "generation request failed");
                generation_error(e)
            })?;

        let content = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .ok_or_else(|| generation_error("API returned no candidates".into()))?;

        Ok(content.parts.into_iter().map(|p| p.text).collect())
    }
}
