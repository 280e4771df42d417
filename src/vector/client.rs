//! HTTP client wrapper for interacting with a Pinecone index.

use crate::config::Config;
use crate::embedding::EmbeddingClient;
use crate::vector::types::{QueryResponse, VectorIndexError};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::json;
use std::sync::Arc;

/// Operations the request handlers need from the vector index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Embed `text` and store it under `id`, overwriting any previous vector with that id.
    async fn upsert(&self, id: &str, text: &str) -> Result<(), VectorIndexError>;

    /// Embed `query_text` and return the stored texts of the `top_k` nearest vectors.
    async fn query_similar(
        &self,
        query_text: &str,
        top_k: usize,
    ) -> Result<Vec<String>, VectorIndexError>;
}

/// Lightweight HTTP client for Pinecone data-plane operations.
pub struct PineconeService {
    client: Client,
    base_url: String,
    api_key: String,
    namespace: String,
    embedding_client: Arc<dyn EmbeddingClient>,
}

impl PineconeService {
    /// Construct a new client from configuration and a shared embedding client.
    pub fn new(
        config: &Config,
        embedding_client: Arc<dyn EmbeddingClient>,
    ) -> Result<Self, VectorIndexError> {
        let client = Client::builder().user_agent("planwright/vector").build()?;
        let base_url =
            normalize_base_url(&config.pinecone_host).map_err(VectorIndexError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            namespace = %config.pinecone_namespace,
            "Initialized Pinecone HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            api_key: config.pinecone_api_key.clone(),
            namespace: config.pinecone_namespace.clone(),
            embedding_client,
        })
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format_endpoint(&self.base_url, path))
            .header("Api-Key", &self.api_key)
    }

    async fn ensure_success(
        &self,
        operation: &'static str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, VectorIndexError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let error = VectorIndexError::UnexpectedStatus {
            operation,
            status,
            body,
        };
        tracing::error!(error = %error, "Pinecone request failed");
        Err(error)
    }
}

#[async_trait]
impl VectorIndex for PineconeService {
    async fn upsert(&self, id: &str, text: &str) -> Result<(), VectorIndexError> {
        let values = self.embedding_client.embed(text).await?;

        let response = self
            .request("vectors/upsert")
            .json(&json!({
                "vectors": [{
                    "id": id,
                    "values": values,
                    "metadata": { "text": text }
                }],
                "namespace": self.namespace,
            }))
            .send()
            .await?;

        self.ensure_success("upsert", response).await?;
        tracing::debug!(id, namespace = %self.namespace, "Vector upserted");
        Ok(())
    }

    async fn query_similar(
        &self,
        query_text: &str,
        top_k: usize,
    ) -> Result<Vec<String>, VectorIndexError> {
        let vector = self.embedding_client.embed(query_text).await?;

        let response = self
            .request("query")
            .json(&json!({
                "vector": vector,
                "topK": top_k,
                "includeMetadata": true,
                "namespace": self.namespace,
            }))
            .send()
            .await?;

        let response = self.ensure_success("query", response).await?;
        let texts = response.json::<QueryResponse>().await?.into_texts();
        tracing::debug!(
            top_k,
            matches = texts.len(),
            namespace = %self.namespace,
            "Vector query completed"
        );
        Ok(texts)
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
