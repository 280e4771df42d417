use crate::config::Config;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Errors raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingClientError {
    /// HTTP layer failed before receiving a response.
    #[error("Embedding request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Provider responded with a non-success status.
    #[error("Embedding API error ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the provider.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Provider succeeded but the response carried no vector.
    #[error("Embedding provider returned no vectors")]
    EmptyEmbedding,
}

/// Interface implemented by embedding backends.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Produce the embedding vector for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingClientError>;
}

/// OpenAI embeddings client.
pub struct OpenAiEmbeddingClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiEmbeddingClient {
    /// Construct a client from the process configuration.
    pub fn new(config: &Config) -> Result<Self, EmbeddingClientError> {
        let http = Client::builder().user_agent("planwright/embed").build()?;
        tracing::debug!(model = %config.embedding_model, "Initialized embedding client");
        Ok(Self {
            http,
            base_url: config.openai_base_url.clone(),
            api_key: config.openai_api_key.clone(),
            model: config.embedding_model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/embeddings", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingClientError> {
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&json!({
                "input": text,
                "model": self.model,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = EmbeddingClientError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Embedding request failed");
            return Err(error);
        }

        let payload: EmbeddingResponse = response.json().await?;
        let vector = payload
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .ok_or(EmbeddingClientError::EmptyEmbedding)?;
        tracing::debug!(
            model = %self.model,
            dimension = vector.len(),
            "Generated embedding"
        );
        Ok(vector)
    }
}
