//! Ollama HTTP client serving both embeddings and generation
//!
//! No retries: failures surface to the caller, with timeouts and rate
//! limiting reported as retriable errors.

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{EmbeddingConfig, LlmConfig};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;

/// Which Ollama endpoint a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Embeddings,
    Generate,
}

impl Endpoint {
    fn label(self) -> &'static str {
        match self {
            Endpoint::Embeddings => "ollama embeddings",
            Endpoint::Generate => "ollama generate",
        }
    }

    fn failure(self, message: String) -> Error {
        match self {
            Endpoint::Embeddings => Error::Embedding(message),
            Endpoint::Generate => Error::Llm(message),
        }
    }
}

/// Ollama API client
pub struct OllamaClient {
    /// HTTP client
    client: Client,
    /// Server base URL
    base_url: String,
    /// Embedding model name
    embed_model: String,
    /// Generation model name
    generate_model: String,
    /// Temperature for generation
    temperature: f32,
    /// Expected embedding dimensions
    dimensions: usize,
    /// Concurrent requests in `embed_batch`
    batch_size: usize,
    /// Request timeout in seconds
    timeout_secs: u64,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(llm: &LlmConfig, embeddings: &EmbeddingConfig) -> Result<Self> {
        let timeout_secs = llm.timeout_secs.max(embeddings.timeout_secs);
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: llm.base_url.trim_end_matches('/').to_string(),
            embed_model: llm.embed_model.clone(),
            generate_model: llm.generate_model.clone(),
            temperature: llm.temperature,
            dimensions: embeddings.dimensions,
            batch_size: embeddings.batch_size.max(1),
            timeout_secs,
        })
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn post_json<Req, Resp>(&self, endpoint: Endpoint, path: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.send_error(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(endpoint, status, &body, self.timeout_secs));
        }

        response
            .json()
            .await
            .map_err(|e| endpoint.failure(format!("Failed to parse response: {}", e)))
    }

    fn send_error(&self, endpoint: Endpoint, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::timeout(endpoint.label(), self.timeout_secs)
        } else {
            endpoint.failure(format!("Request failed: {}", err))
        }
    }
}

/// Map a non-success HTTP status to an error kind
fn status_error(endpoint: Endpoint, status: StatusCode, body: &str, timeout_secs: u64) -> Error {
    match status {
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited(endpoint.label().to_string()),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            Error::timeout(endpoint.label(), timeout_secs)
        }
        s if s.is_client_error() => {
            Error::InvalidRequest(format!("{}: HTTP {} - {}", endpoint.label(), s, body))
        }
        s => endpoint.failure(format!("HTTP {} - {}", s, body)),
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbedRequest {
            model: &self.embed_model,
            prompt: text,
        };
        let response: EmbedResponse = self
            .post_json(Endpoint::Embeddings, "/api/embeddings", &request)
            .await?;

        if response.embedding.is_empty() {
            return Err(Error::embedding(format!(
                "model {} returned an empty embedding",
                self.embed_model
            )));
        }
        Ok(response.embedding)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // Futures are built up front so the stream holds no borrowing closure.
        // `buffered` keeps input order while running requests concurrently.
        let requests: Vec<_> = texts.iter().map(|text| self.embed(text)).collect();
        stream::iter(requests)
            .buffered(self.batch_size)
            .try_collect()
            .await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[async_trait]
impl LlmProvider for OllamaClient {
    async fn generate(&self, prompt: &str, max_output_tokens: u32) -> Result<String> {
        tracing::info!("Generating answer with model: {}", self.generate_model);

        let request = GenerateRequest {
            model: &self.generate_model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: max_output_tokens,
            },
        };
        let response: GenerateResponse = self
            .post_json(Endpoint::Generate, "/api/generate", &request)
            .await?;
        Ok(response.response)
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.generate_model
    }
}
