//! Firestore REST client for plan records.
//!
//! Plans live under `users/{ownerId}/plans/{autoId}`. Reference lookups use a collection-group
//! query over every `plans` collection, so they see plans from all owners.

use crate::firebase::token::{AccessTokenProvider, TokenError};
use crate::planning::PlanRecord;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;

/// Errors returned while reading or writing plan records.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Access token could not be obtained.
    #[error(transparent)]
    Token(#[from] TokenError),
    /// Record timestamp could not be encoded.
    #[error("Invalid record timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
    /// Document URL could not be built.
    #[error("Invalid Firestore URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("Firestore request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Firestore responded with a non-success status.
    #[error("Firestore error ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from Firestore.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Persistence operations for generated plans.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Insert a new record under its owner's collection and return the assigned id.
    async fn add_plan(&self, record: &PlanRecord) -> Result<String, StoreError>;

    /// Most recent `raw_content` of plans matching both fields, across all owners.
    async fn search_reference_plans(
        &self,
        school_level: &str,
        plan_type: &str,
        limit: usize,
    ) -> Result<Vec<String>, StoreError>;
}

/// Firestore-backed plan store.
pub struct FirestoreService {
    http: Client,
    base_url: String,
    project_id: String,
    tokens: Arc<AccessTokenProvider>,
}

impl FirestoreService {
    /// Construct a store client for `project_id`.
    pub fn new(
        base_url: &str,
        project_id: &str,
        tokens: Arc<AccessTokenProvider>,
    ) -> Result<Self, StoreError> {
        let http = Client::builder().user_agent("planwright/store").build()?;
        tracing::debug!(project = project_id, "Initialized Firestore client");
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            tokens,
        })
    }

    fn documents_root(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents",
            self.base_url, self.project_id
        )
    }

    /// Owner collection URL with `owner_id` encoded as a single path segment.
    fn plans_url(&self, owner_id: &str) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.documents_root())
            .map_err(|error| StoreError::InvalidUrl(error.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(self.base_url.clone()))?
            .push("users")
            .push(owner_id)
            .push("plans");
        Ok(url)
    }

    async fn post(&self, url: String, body: &Value) -> Result<reqwest::Response, StoreError> {
        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let error = StoreError::UnexpectedStatus { status, body };
        tracing::error!(error = %error, "Firestore request failed");
        Err(error)
    }
}

fn encode_record(record: &PlanRecord) -> Result<Value, StoreError> {
    Ok(json!({
        "fields": {
            "ownerId": { "stringValue": record.owner_id },
            "title": { "stringValue": record.title },
            "planType": { "stringValue": record.plan_type },
            "schoolLevel": { "stringValue": record.school_level },
            "keywords": { "stringValue": record.keywords },
            "includeBudget": { "booleanValue": record.include_budget },
            "createdAt": { "timestampValue": record.created_at.format(&Rfc3339)? },
            "rawContent": { "stringValue": record.raw_content },
            "referenceCount": { "integerValue": record.reference_count.to_string() },
        }
    }))
}

fn reference_query(school_level: &str, plan_type: &str, limit: usize) -> Value {
    json!({
        "structuredQuery": {
            "from": [ { "collectionId": "plans", "allDescendants": true } ],
            "where": {
                "compositeFilter": {
                    "op": "AND",
                    "filters": [
                        {
                            "fieldFilter": {
                                "field": { "fieldPath": "schoolLevel" },
                                "op": "EQUAL",
                                "value": { "stringValue": school_level }
                            }
                        },
                        {
                            "fieldFilter": {
                                "field": { "fieldPath": "planType" },
                                "op": "EQUAL",
                                "value": { "stringValue": plan_type }
                            }
                        }
                    ]
                }
            },
            "orderBy": [
                { "field": { "fieldPath": "createdAt" }, "direction": "DESCENDING" }
            ],
            "limit": limit
        }
    })
}

#[derive(Deserialize)]
struct CreatedDocument {
    name: String,
}

#[derive(Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<QueryDocument>,
}

#[derive(Deserialize)]
struct QueryDocument {
    #[serde(default)]
    fields: HashMap<String, FieldValue>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldValue {
    #[serde(default)]
    string_value: Option<String>,
}

fn raw_contents(items: Vec<RunQueryItem>) -> Vec<String> {
    items
        .into_iter()
        .filter_map(|item| item.document)
        .filter_map(|mut document| document.fields.remove("rawContent"))
        .filter_map(|value| value.string_value)
        .filter(|content| !content.trim().is_empty())
        .collect()
}

#[async_trait]
impl PlanStore for FirestoreService {
    async fn add_plan(&self, record: &PlanRecord) -> Result<String, StoreError> {
        let url = self.plans_url(&record.owner_id)?;
        let response = self.post(url.into(), &encode_record(record)?).await?;
        let created: CreatedDocument = response.json().await?;
        let id = created
            .name
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        tracing::debug!(plan_id = %id, "Plan record stored");
        Ok(id)
    }

    async fn search_reference_plans(
        &self,
        school_level: &str,
        plan_type: &str,
        limit: usize,
    ) -> Result<Vec<String>, StoreError> {
        let url = format!("{}:runQuery", self.documents_root());
        let response = self
            .post(url, &reference_query(school_level, plan_type, limit))
            .await?;
        let items: Vec<RunQueryItem> = response.json().await?;
        let contents = raw_contents(items);
        tracing::debug!(
            school_level,
            plan_type,
            found = contents.len(),
            "Reference plans loaded"
        );
        Ok(contents)
    }
}
