//! Core data types and error definitions for the planning pipeline.

use crate::{
    embedding::EmbeddingClientError,
    extraction::ExtractionError,
    firebase::{AuthError, StoreError, TokenError},
    generation::GenerationError,
    vector::VectorIndexError,
};
use thiserror::Error;
use time::OffsetDateTime;

/// Errors emitted by the request pipeline.
#[derive(Debug, Error)]
pub enum PlanningError {
    /// Caller identity could not be established.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// Request was missing a required field.
    #[error("{0}")]
    Validation(String),
    /// Vector index lookup or upsert failed.
    #[error(transparent)]
    VectorIndex(#[from] VectorIndexError),
    /// Generative provider failed or returned nothing.
    #[error(transparent)]
    Generation(#[from] GenerationError),
    /// Plan store read or write failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Extraction service failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl PlanningError {
    /// Whether the failure stems from a missing or rejected identity token.
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Whether the failure stems from an incomplete request.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Errors raised while wiring the production clients together at startup.
#[derive(Debug, Error)]
pub enum InitError {
    /// Embedding client could not be built.
    #[error("Failed to initialize embedding client: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// Vector index client could not be built.
    #[error("Failed to initialize vector index client: {0}")]
    VectorIndex(#[from] VectorIndexError),
    /// Generative client could not be built.
    #[error("Failed to initialize generative client: {0}")]
    Generation(#[from] GenerationError),
    /// Identity verifier could not be built.
    #[error("Failed to initialize identity verifier: {0}")]
    Auth(#[from] AuthError),
    /// Service-account credentials were unusable.
    #[error("Failed to initialize service account credentials: {0}")]
    Token(#[from] TokenError),
    /// Plan store client could not be built.
    #[error("Failed to initialize plan store: {0}")]
    Store(#[from] StoreError),
    /// Extraction client could not be built.
    #[error("Failed to initialize extraction client: {0}")]
    Extraction(#[from] ExtractionError),
}

/// Structured fields of a generate-plan request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanRequest {
    /// School level label.
    pub school_level: String,
    /// Plan type label.
    pub plan_type: String,
    /// Free-form keywords.
    pub keywords: String,
    /// Whether a budget section is requested.
    pub include_budget: bool,
}

/// Persisted record of a generated plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRecord {
    /// User that requested the plan.
    pub owner_id: String,
    /// Display title.
    pub title: String,
    /// Plan type label.
    pub plan_type: String,
    /// School level label.
    pub school_level: String,
    /// Keywords supplied with the request.
    pub keywords: String,
    /// Whether a budget section was requested.
    pub include_budget: bool,
    /// Creation time.
    pub created_at: OffsetDateTime,
    /// Generated plan text.
    pub raw_content: String,
    /// Number of non-blank reference texts included in the prompt.
    pub reference_count: u32,
}

/// Result of a successful generate-plan request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPlan {
    /// Store-assigned id of the persisted record.
    pub plan_id: String,
    /// Generated plan text.
    pub plan_text: String,
    /// Number of reference texts included in the prompt.
    pub reference_count: u32,
}
