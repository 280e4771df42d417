//! Client for the external text-extraction service.
//!
//! Uploaded files are forwarded unchanged as a single multipart `file` field, and the service's
//! JSON answer is handed back as-is.

use crate::config::Config;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;

/// Errors raised while relaying a file to the extraction service.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// HTTP layer failed before receiving a response, or the body was not JSON.
    #[error("Extraction request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Extraction service responded with a non-success status.
    #[error("Extraction service error ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the extraction service.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// A file received from the caller.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied file name.
    pub file_name: String,
    /// Declared media type, if any.
    pub content_type: Option<String>,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

/// Turns uploaded documents into text.
#[async_trait]
pub trait ExtractionClient: Send + Sync {
    /// Forward `file` and return the service's JSON response.
    async fn extract(&self, file: UploadedFile) -> Result<Value, ExtractionError>;
}

/// HTTP client for the extraction microservice.
pub struct HttpExtractionClient {
    http: Client,
    base_url: String,
}

impl HttpExtractionClient {
    /// Construct a client from the process configuration.
    pub fn new(config: &Config) -> Result<Self, ExtractionError> {
        let http = Client::builder().user_agent("planwright/extract").build()?;
        tracing::debug!(url = %config.extractor_url, "Initialized extraction client");
        Ok(Self {
            http,
            base_url: config.extractor_url.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/extract-text", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ExtractionClient for HttpExtractionClient {
    async fn extract(&self, file: UploadedFile) -> Result<Value, ExtractionError> {
        let UploadedFile {
            file_name,
            content_type,
            bytes,
        } = file;
        let size = bytes.len();

        let mut part = Part::bytes(bytes).file_name(file_name.clone());
        if let Some(content_type) = content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = ExtractionError::UnexpectedStatus { status, body };
            tracing::error!(file = %file_name, error = %error, "Extraction failed");
            return Err(error);
        }

        let payload: Value = response.json().await?;
        tracing::debug!(file = %file_name, bytes = size, "File extracted");
        Ok(payload)
    }
}
