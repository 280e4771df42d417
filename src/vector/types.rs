//! Shared types used by the Pinecone client.

use crate::embedding::EmbeddingClientError;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Number of neighbours requested when the caller does not choose one.
pub const DEFAULT_TOP_K: usize = 3;

/// Errors returned while interacting with the vector index.
#[derive(Debug, Error)]
pub enum VectorIndexError {
    /// Index host failed to parse or normalize.
    #[error("Invalid Pinecone host: {0}")]
    InvalidUrl(String),
    /// Embedding the text failed before the index was contacted.
    #[error(transparent)]
    Embedding(#[from] EmbeddingClientError),
    /// HTTP layer failed before receiving a response.
    #[error("Pinecone request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Pinecone responded with a non-success status.
    #[error("Vector {operation} failed ({status}): {body}")]
    UnexpectedStatus {
        /// Index operation that failed (`upsert` or `query`).
        operation: &'static str,
        /// HTTP status returned from Pinecone.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

#[derive(Deserialize)]
pub(crate) struct QueryResponse {
    #[serde(default)]
    pub(crate) matches: Option<Vec<QueryMatch>>,
}

#[derive(Deserialize)]
pub(crate) struct QueryMatch {
    #[serde(default)]
    pub(crate) metadata: Option<MatchMetadata>,
}

#[derive(Deserialize)]
pub(crate) struct MatchMetadata {
    #[serde(default)]
    pub(crate) text: Option<String>,
}

impl QueryResponse {
    /// Stored texts in provider ranking order, skipping matches without a text payload.
    pub(crate) fn into_texts(self) -> Vec<String> {
        self.matches
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| entry.metadata.and_then(|metadata| metadata.text))
            .collect()
    }
}
