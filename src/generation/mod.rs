//! Generative-text client backed by the Gemini `generateContent` endpoint.
//!
//! One prompt in, one text out: the client posts the prompt as a single user part and returns
//! the first text part of the first candidate. There is no streaming and no retry.

use crate::config::Config;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced while requesting generated text.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// HTTP layer failed before receiving a response.
    #[error("Gemini request failed: {0}")]
    Http(reqwest::Error),
    /// Provider responded with a non-success status.
    #[error("Gemini API error ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the provider.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Provider succeeded but returned no usable text.
    #[error("Gemini returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for GenerationError {
    fn from(error: reqwest::Error) -> Self {
        Self::Http(error.without_url())
    }
}

/// Interface implemented by generative-text providers.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Generate text for a fully assembled prompt.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Gemini REST client.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Construct a client from the process configuration.
    pub fn new(config: &Config) -> Result<Self, GenerationError> {
        let http = Client::builder().user_agent("planwright/generate").build()?;
        tracing::debug!(model = %config.gemini_model, "Initialized Gemini client");
        Ok(Self {
            http,
            base_url: config.gemini_base_url.clone(),
            model: config.gemini_model.clone(),
            api_key: config.gemini_api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Option<Vec<Part>>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    fn into_first_text(self) -> Option<String> {
        self.candidates?
            .into_iter()
            .next()?
            .content?
            .parts?
            .into_iter()
            .next()?
            .text
            .filter(|text| !text.is_empty())
    }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let payload = json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ]
        });

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = GenerationError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Gemini request failed");
            return Err(error);
        }

        let body: GenerateContentResponse = response.json().await?;
        let text = body.into_first_text().ok_or(GenerationError::EmptyResponse)?;
        tracing::debug!(model = %self.model, chars = text.chars().count(), "Generated text");
        Ok(text)
    }
}
