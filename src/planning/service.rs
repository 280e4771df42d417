//! Planning service coordinating identity checks, retrieval, generation, and persistence.

use crate::{
    config::{Config, ReferenceSource},
    embedding::{EmbeddingClient, OpenAiEmbeddingClient},
    extraction::{ExtractionClient, HttpExtractionClient, UploadedFile},
    firebase::{
        AccessTokenProvider, AuthError, FirebaseTokenVerifier, FirestoreService,
        IdentityVerifier, PlanStore,
    },
    generation::{GeminiClient, GenerativeClient},
    metrics::{MetricsSnapshot, ServiceMetrics},
    planning::types::{GeneratedPlan, InitError, PlanRecord, PlanRequest, PlanningError},
    prompt::{PromptInput, build_plan_prompt, count_usable_references},
    vector::{DEFAULT_TOP_K, PineconeService, VectorIndex},
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use time::OffsetDateTime;

/// Runs the three request flows against long-lived provider clients.
///
/// Construct the service once near process start and share it through an `Arc`; the HTTP
/// surface only sees it through [`PlanningApi`].
pub struct PlanningService {
    verifier: Arc<dyn IdentityVerifier>,
    vector_index: Arc<dyn VectorIndex>,
    generator: Arc<dyn GenerativeClient>,
    store: Arc<dyn PlanStore>,
    extractor: Arc<dyn ExtractionClient>,
    reference_source: ReferenceSource,
    metrics: ServiceMetrics,
}

/// Abstraction over the request pipeline used by the HTTP surface.
#[async_trait]
pub trait PlanningApi: Send + Sync {
    /// Verify the caller, draft a plan with retrieved references, and persist it.
    async fn generate_plan(
        &self,
        token: &str,
        request: PlanRequest,
    ) -> Result<GeneratedPlan, PlanningError>;

    /// Relay an uploaded file to the extraction service.
    async fn extract_text(&self, file: UploadedFile) -> Result<Value, PlanningError>;

    /// Embed `text` and upsert it into the vector index under `id`.
    async fn index_document(&self, id: &str, text: &str) -> Result<(), PlanningError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl PlanningService {
    /// Build the production clients described by `config`.
    pub fn new(config: &Config) -> Result<Self, InitError> {
        tracing::info!("Initializing provider clients");
        let account = &config.service_account;
        let embedding_client: Arc<dyn EmbeddingClient> =
            Arc::new(OpenAiEmbeddingClient::new(config)?);
        let vector_index = Arc::new(PineconeService::new(config, embedding_client)?);
        let generator = Arc::new(GeminiClient::new(config)?);
        let verifier = Arc::new(FirebaseTokenVerifier::new(
            &config.jwks_url,
            &account.project_id,
        )?);
        let tokens = Arc::new(AccessTokenProvider::new(account)?);
        let store = Arc::new(FirestoreService::new(
            &config.firestore_base_url,
            &account.project_id,
            tokens,
        )?);
        let extractor = Arc::new(HttpExtractionClient::new(config)?);
        tracing::info!(reference_source = ?config.reference_source, "Provider clients ready");

        Ok(Self::from_components(
            verifier,
            vector_index,
            generator,
            store,
            extractor,
            config.reference_source,
        ))
    }

    /// Assemble a service from already constructed collaborators.
    pub fn from_components(
        verifier: Arc<dyn IdentityVerifier>,
        vector_index: Arc<dyn VectorIndex>,
        generator: Arc<dyn GenerativeClient>,
        store: Arc<dyn PlanStore>,
        extractor: Arc<dyn ExtractionClient>,
        reference_source: ReferenceSource,
    ) -> Self {
        Self {
            verifier,
            vector_index,
            generator,
            store,
            extractor,
            reference_source,
            metrics: ServiceMetrics::new(),
        }
    }

    async fn load_references(&self, request: &PlanRequest) -> Result<Vec<String>, PlanningError> {
        let references = match self.reference_source {
            ReferenceSource::Vector => {
                let query = format!(
                    "{} {} {}",
                    request.school_level, request.plan_type, request.keywords
                );
                self.vector_index
                    .query_similar(&query, DEFAULT_TOP_K)
                    .await?
            }
            ReferenceSource::Store => {
                self.store
                    .search_reference_plans(
                        &request.school_level,
                        &request.plan_type,
                        DEFAULT_TOP_K,
                    )
                    .await?
            }
        };
        Ok(references)
    }
}

#[async_trait]
impl PlanningApi for PlanningService {
    async fn generate_plan(
        &self,
        token: &str,
        request: PlanRequest,
    ) -> Result<GeneratedPlan, PlanningError> {
        if token.trim().is_empty() {
            return Err(AuthError::MissingToken.into());
        }
        let user = self.verifier.verify(token).await?;

        if request.school_level.trim().is_empty() || request.plan_type.trim().is_empty() {
            return Err(PlanningError::Validation(
                "schoolLevel and planType are required".into(),
            ));
        }

        let references = self.load_references(&request).await?;
        let prompt = build_plan_prompt(
            PromptInput {
                school_level: &request.school_level,
                plan_type: &request.plan_type,
                keywords: &request.keywords,
                include_budget: request.include_budget,
            },
            &references,
        );
        let plan_text = self.generator.generate(&prompt).await?;
        let reference_count = count_usable_references(&references) as u32;

        let PlanRequest {
            school_level,
            plan_type,
            keywords,
            include_budget,
        } = request;
        let record = PlanRecord {
            owner_id: user.uid,
            title: extract_title(&plan_text).unwrap_or_else(|| plan_type.clone()),
            plan_type,
            school_level,
            keywords,
            include_budget,
            created_at: OffsetDateTime::now_utc(),
            raw_content: plan_text.clone(),
            reference_count,
        };
        let plan_id = self.store.add_plan(&record).await?;

        self.metrics.record_plan(u64::from(reference_count));
        tracing::info!(
            plan_id = %plan_id,
            school_level = %record.school_level,
            plan_type = %record.plan_type,
            reference_count,
            "Plan generated"
        );
        Ok(GeneratedPlan {
            plan_id,
            plan_text,
            reference_count,
        })
    }

    async fn extract_text(&self, file: UploadedFile) -> Result<Value, PlanningError> {
        let file_name = file.file_name.clone();
        let payload = self.extractor.extract(file).await?;
        self.metrics.record_extraction();
        tracing::info!(file = %file_name, "Text extracted");
        Ok(payload)
    }

    async fn index_document(&self, id: &str, text: &str) -> Result<(), PlanningError> {
        if id.trim().is_empty() || text.trim().is_empty() {
            return Err(PlanningError::Validation("id and text are required".into()));
        }
        self.vector_index.upsert(id, text).await?;
        self.metrics.record_indexed_document();
        tracing::info!(id, "Document indexed");
        Ok(())
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// Title from the first `TITLE:` line of generated text, without brackets or emphasis.
fn extract_title(plan_text: &str) -> Option<String> {
    plan_text.lines().find_map(|line| {
        let line = line.trim().trim_start_matches(['#', '*', ' ']);
        let rest = line.strip_prefix("TITLE:")?;
        let title = rest.trim().trim_matches(['[', ']', '*', ' ']).trim();
        (!title.is_empty()).then(|| title.to_string())
    })
}
