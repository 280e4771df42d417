//! HTTP surface for Planwright.
//!
//! This module exposes a compact Axum router:
//!
//! - `POST /generatePlan` – Verify the caller's ID token, retrieve similar plans, draft a new plan
//!   with the generative provider, persist it, and return `{ "planText": ... }`.
//! - `POST /extract-text` – Relay a single multipart `file` to the extraction service and return
//!   its JSON verbatim.
//! - `POST /index-document` – Embed `text` and upsert it into the vector index under `id`.
//! - `GET /metrics` – Request counters since startup.
//! - `GET /commands` – Machine-readable command catalog.
//! - `GET /health` – Liveness probe.
//!
//! Every failure is rendered as `{ "error": "<message>" }`.

use crate::config::Config;
use crate::extraction::UploadedFile;
use crate::metrics::MetricsSnapshot;
use crate::planning::{PlanRequest, PlanningApi, PlanningError};
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Request, State, multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::Instrument;
use uuid::Uuid;

const NO_FILE_MESSAGE: &str = "No file uploaded";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Transport-level settings applied around the routes.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Origins allowed by CORS. Empty means any origin.
    pub allowed_origins: Vec<String>,
    /// Maximum accepted request body size.
    pub max_upload_bytes: usize,
}

impl RouterOptions {
    /// Derive router settings from the process configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            allowed_origins: config.allowed_origins.clone(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Build the HTTP router exposing the plan API surface.
pub fn create_router<S>(service: Arc<S>, options: RouterOptions) -> Router
where
    S: PlanningApi + 'static,
{
    Router::new()
        .route("/generatePlan", post(generate_plan::<S>))
        .route("/extract-text", post(extract_text::<S>))
        .route("/index-document", post(index_document::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(options.max_upload_bytes))
        .layer(middleware::from_fn(trace_request))
        .layer(cors_layer(&options.allowed_origins))
        .with_state(service)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn trace_request(request: Request, next: Next) -> Response {
    let span = tracing::info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %request.method(),
        path = %request.uri().path(),
    );
    async move {
        let response = next.run(request).await;
        tracing::info!(status = response.status().as_u16(), "Request completed");
        response
    }
    .instrument(span)
    .await
}

/// Request body for `POST /generatePlan`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratePlanRequest {
    /// Firebase ID token; the `Authorization: Bearer` header is used when absent.
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    school_level: String,
    #[serde(default)]
    plan_type: String,
    #[serde(default)]
    keywords: String,
    #[serde(default)]
    include_budget: bool,
}

/// Success response for `POST /generatePlan`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeneratePlanResponse {
    plan_text: String,
}

/// Draft and persist a plan for the authenticated caller.
///
/// A missing token is rejected with 401 before any provider is contacted. Rejected tokens are
/// also 401; every other failure is reported as 400 with the provider's message.
async fn generate_plan<S>(
    State(service): State<Arc<S>>,
    headers: HeaderMap,
    payload: Result<Json<GeneratePlanRequest>, JsonRejection>,
) -> Result<Json<GeneratePlanResponse>, AppError>
where
    S: PlanningApi,
{
    let Json(request) = payload.map_err(AppError::from)?;
    let token = request
        .token
        .filter(|token| !token.trim().is_empty())
        .or_else(|| bearer_token(&headers))
        .ok_or_else(|| AppError::new(StatusCode::UNAUTHORIZED, "Missing identity token"))?;

    let plan = service
        .generate_plan(
            &token,
            PlanRequest {
                school_level: request.school_level,
                plan_type: request.plan_type,
                keywords: request.keywords,
                include_budget: request.include_budget,
            },
        )
        .await
        .map_err(|error| {
            let status = if error.is_authorization() {
                StatusCode::UNAUTHORIZED
            } else {
                StatusCode::BAD_REQUEST
            };
            AppError::from_planning(status, error)
        })?;

    Ok(Json(GeneratePlanResponse {
        plan_text: plan.plan_text,
    }))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Relay exactly one uploaded `file` to the extraction service.
async fn extract_text<S>(
    State(service): State<Arc<S>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, AppError>
where
    S: PlanningApi,
{
    let mut multipart =
        multipart.map_err(|_| AppError::new(StatusCode::BAD_REQUEST, NO_FILE_MESSAGE))?;

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| AppError::new(StatusCode::BAD_REQUEST, error.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|error| AppError::new(StatusCode::BAD_REQUEST, error.body_text()))?;
        files.push(UploadedFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    let file = match files.len() {
        0 => return Err(AppError::new(StatusCode::BAD_REQUEST, NO_FILE_MESSAGE)),
        1 => files.remove(0),
        _ => {
            return Err(AppError::new(
                StatusCode::BAD_REQUEST,
                "Exactly one file must be uploaded",
            ));
        }
    };

    let payload = service.extract_text(file).await.map_err(|error| {
        let status = if error.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        AppError::from_planning(status, error)
    })?;
    Ok(Json(payload))
}

/// Request body for `POST /index-document`.
#[derive(Deserialize)]
struct IndexDocumentRequest {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

/// Embed and upsert a document under a caller-supplied id.
async fn index_document<S>(
    State(service): State<Arc<S>>,
    payload: Result<Json<IndexDocumentRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError>
where
    S: PlanningApi,
{
    let Json(request) = payload.map_err(AppError::from)?;
    let (Some(id), Some(text)) = (
        request.id.filter(|id| !id.trim().is_empty()),
        request.text.filter(|text| !text.trim().is_empty()),
    ) else {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            "id and text are required",
        ));
    };

    service.index_document(&id, &text).await.map_err(|error| {
        let status = if error.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        AppError::from_planning(status, error)
    })?;
    Ok(Json(json!({ "success": true })))
}

/// Return a snapshot of request counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: PlanningApi,
{
    Json(service.metrics_snapshot())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "generate_plan",
                method: "POST",
                path: "/generatePlan",
                description: "Generate a school operation plan from structured fields and similar past plans, persist it, and return { \"planText\": string }.",
                request_example: Some(json!({
                    "token": "<firebase-id-token>",
                    "schoolLevel": "중학교",
                    "planType": "진로교육",
                    "keywords": "AI, 메이커",
                    "includeBudget": true
                })),
            },
            CommandDescriptor {
                name: "extract_text",
                method: "POST",
                path: "/extract-text",
                description: "Upload one document as multipart field \"file\"; returns the extraction service's JSON.",
                request_example: None,
            },
            CommandDescriptor {
                name: "index_document",
                method: "POST",
                path: "/index-document",
                description: "Embed a text and upsert it into the vector index under the given id. Returns { \"success\": true }.",
                request_example: Some(json!({
                    "id": "plan-2024-001",
                    "text": "운영계획 본문"
                })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return request counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

#[derive(Debug)]
struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn from_planning(status: StatusCode, error: PlanningError) -> Self {
        tracing::warn!(status = status.as_u16(), error = %error, "Request failed");
        Self::new(status, error.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::{RouterOptions, create_router, get_commands};
    use crate::extraction::{ExtractionError, UploadedFile};
    use crate::firebase::AuthError;
    use crate::generation::GenerationError;
    use crate::metrics::MetricsSnapshot;
    use crate::planning::{GeneratedPlan, PlanRequest, PlanningApi, PlanningError};
    use crate::vector::VectorIndexError;
    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
    };
    use reqwest::StatusCode as ProviderStatus;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Clone, Debug, PartialEq)]
    enum Call {
        Generate { token: String, request: PlanRequest },
        Extract { file_name: String, content_type: Option<String>, bytes: Vec<u8> },
        Index { id: String, text: String },
    }

    struct StubPlanningService {
        calls: Mutex<Vec<Call>>,
        failure: Option<fn() -> PlanningError>,
    }

    impl StubPlanningService {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                failure: None,
            })
        }

        fn failing(failure: fn() -> PlanningError) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                failure: Some(failure),
            })
        }

        async fn recorded_calls(&self) -> Vec<Call> {
            self.calls.lock().await.clone()
        }

        fn outcome(&self) -> Result<(), PlanningError> {
            match self.failure {
                Some(failure) => Err(failure()),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl PlanningApi for StubPlanningService {
        async fn generate_plan(
            &self,
            token: &str,
            request: PlanRequest,
        ) -> Result<GeneratedPlan, PlanningError> {
            self.calls.lock().await.push(Call::Generate {
                token: token.to_string(),
                request,
            });
            self.outcome()?;
            Ok(GeneratedPlan {
                plan_id: "plan-1".into(),
                plan_text: "TITLE: 계획\n### 목적".into(),
                reference_count: 1,
            })
        }

        async fn extract_text(&self, file: UploadedFile) -> Result<Value, PlanningError> {
            self.calls.lock().await.push(Call::Extract {
                file_name: file.file_name,
                content_type: file.content_type,
                bytes: file.bytes,
            });
            self.outcome()?;
            Ok(json!({ "text": "추출된 본문" }))
        }

        async fn index_document(&self, id: &str, text: &str) -> Result<(), PlanningError> {
            self.calls.lock().await.push(Call::Index {
                id: id.to_string(),
                text: text.to_string(),
            });
            self.outcome()
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                plans_generated: 4,
                reference_texts_used: 7,
                documents_indexed: 2,
                files_extracted: 1,
            }
        }
    }

    fn router(service: Arc<StubPlanningService>) -> Router {
        create_router(service, RouterOptions::default())
    }

    fn json_request(path: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    fn multipart_request(parts: &[(&str, &str, &str)]) -> Request<Body> {
        let boundary = "planwright-boundary";
        let mut body = String::new();
        for (name, file_name, contents) in parts {
            body.push_str(&format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n{contents}\r\n"
            ));
        }
        body.push_str(&format!("--{boundary}--\r\n"));
        Request::builder()
            .method(Method::POST)
            .uri("/extract-text")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .expect("request")
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("router response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    fn plan_body() -> Value {
        json!({
            "token": "id-token",
            "schoolLevel": "중학교",
            "planType": "진로교육",
            "keywords": "AI",
            "includeBudget": true
        })
    }

    #[tokio::test]
    async fn commands_catalog_exposes_plan_endpoints() {
        let commands = get_commands().await.0.commands;
        let generate = commands
            .iter()
            .find(|cmd| cmd.name == "generate_plan")
            .expect("generate command present");

        assert_eq!(generate.method, "POST");
        assert_eq!(generate.path, "/generatePlan");
        assert!(commands.iter().any(|cmd| cmd.path == "/extract-text"));
        assert!(commands.iter().any(|cmd| cmd.path == "/index-document"));
    }

    #[tokio::test]
    async fn generate_plan_returns_plan_text() {
        let service = StubPlanningService::ok();
        let (status, body) = send(
            router(service.clone()),
            json_request("/generatePlan", plan_body()),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "planText": "TITLE: 계획\n### 목적" }));
        assert_eq!(
            service.recorded_calls().await,
            vec![Call::Generate {
                token: "id-token".into(),
                request: PlanRequest {
                    school_level: "중학교".into(),
                    plan_type: "진로교육".into(),
                    keywords: "AI".into(),
                    include_budget: true,
                },
            }]
        );
    }

    #[tokio::test]
    async fn generate_plan_without_token_is_unauthorized() {
        let service = StubPlanningService::ok();
        let mut body = plan_body();
        body.as_object_mut().expect("object").remove("token");

        let (status, body) = send(router(service.clone()), json_request("/generatePlan", body)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].as_str().expect("error").contains("token"));
        assert!(service.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn generate_plan_accepts_bearer_header() {
        let service = StubPlanningService::ok();
        let mut body = plan_body();
        body["token"] = json!("");
        let mut request = json_request("/generatePlan", body);
        request
            .headers_mut()
            .insert(header::AUTHORIZATION, "Bearer header-token".parse().expect("header"));

        let (status, _) = send(router(service.clone()), request).await;

        assert_eq!(status, StatusCode::OK);
        let calls = service.recorded_calls().await;
        assert!(matches!(&calls[0], Call::Generate { token, .. } if token == "header-token"));
    }

    #[tokio::test]
    async fn rejected_token_maps_to_unauthorized() {
        let service =
            StubPlanningService::failing(|| AuthError::UnknownKey("kid".into()).into());

        let (status, body) = send(router(service), json_request("/generatePlan", plan_body())).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].as_str().expect("error").contains("unknown key id"));
    }

    #[tokio::test]
    async fn downstream_failure_maps_to_bad_request_with_message() {
        let service = StubPlanningService::failing(|| {
            GenerationError::UnexpectedStatus {
                status: ProviderStatus::SERVICE_UNAVAILABLE,
                body: "overloaded".into(),
            }
            .into()
        });

        let (status, body) = send(router(service), json_request("/generatePlan", plan_body())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let message = body["error"].as_str().expect("error");
        assert!(message.contains("503 Service Unavailable"));
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request_envelope() {
        let service = StubPlanningService::ok();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/generatePlan")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .expect("request");

        let (status, body) = send(router(service.clone()), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
        assert!(service.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn extract_text_relays_single_file() {
        let service = StubPlanningService::ok();

        let (status, body) = send(
            router(service.clone()),
            multipart_request(&[("file", "plan.pdf", "%PDF-1.4")]),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "text": "추출된 본문" }));
        assert_eq!(
            service.recorded_calls().await,
            vec![Call::Extract {
                file_name: "plan.pdf".into(),
                content_type: Some("application/pdf".into()),
                bytes: b"%PDF-1.4".to_vec(),
            }]
        );
    }

    #[tokio::test]
    async fn extract_text_without_file_is_bad_request() {
        let service = StubPlanningService::ok();

        let (status, body) = send(
            router(service.clone()),
            multipart_request(&[("attachment", "plan.pdf", "%PDF")]),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "No file uploaded" }));
        assert!(service.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn extract_text_with_json_body_is_bad_request() {
        let service = StubPlanningService::ok();

        let (status, _) = send(
            router(service.clone()),
            json_request("/extract-text", json!({ "file": "nope" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(service.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn extract_text_rejects_multiple_files() {
        let service = StubPlanningService::ok();

        let (status, _) = send(
            router(service.clone()),
            multipart_request(&[("file", "a.pdf", "a"), ("file", "b.pdf", "b")]),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(service.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn extractor_failure_is_server_error() {
        let service = StubPlanningService::failing(|| {
            ExtractionError::UnexpectedStatus {
                status: ProviderStatus::BAD_GATEWAY,
                body: "down".into(),
            }
            .into()
        });

        let (status, body) = send(
            router(service),
            multipart_request(&[("file", "plan.pdf", "%PDF")]),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(
            body["error"]
                .as_str()
                .expect("error")
                .starts_with("Extraction service error")
        );
    }

    #[tokio::test]
    async fn index_document_returns_success_flag() {
        let service = StubPlanningService::ok();

        let (status, body) = send(
            router(service.clone()),
            json_request("/index-document", json!({ "id": "doc1", "text": "hello" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));
        assert_eq!(
            service.recorded_calls().await,
            vec![Call::Index {
                id: "doc1".into(),
                text: "hello".into(),
            }]
        );
    }

    #[tokio::test]
    async fn index_document_requires_id_and_text() {
        let service = StubPlanningService::ok();

        let (status, body) = send(
            router(service.clone()),
            json_request("/index-document", json!({ "id": "doc1" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "id and text are required" }));
        assert!(service.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn index_failure_is_server_error() {
        let service = StubPlanningService::failing(|| {
            VectorIndexError::UnexpectedStatus {
                operation: "upsert",
                status: ProviderStatus::INTERNAL_SERVER_ERROR,
                body: String::new(),
            }
            .into()
        });

        let (status, body) = send(
            router(service),
            json_request("/index-document", json!({ "id": "doc1", "text": "hello" })),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().expect("error").contains("upsert"));
    }

    #[tokio::test]
    async fn metrics_and_health_respond() {
        let service = StubPlanningService::ok();
        let app = router(service);

        let (status, body) = send(
            app.clone(),
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .expect("request"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["plansGenerated"], 4);
        assert_eq!(body["referenceTextsUsed"], 7);

        let (status, body) = send(
            app,
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn cors_allows_only_listed_origins() {
        let app = create_router(
            StubPlanningService::ok(),
            RouterOptions {
                allowed_origins: vec!["https://planner.example.com".into()],
                ..RouterOptions::default()
            },
        );

        let preflight = |origin: &str| {
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/generatePlan")
                .header(header::ORIGIN, origin)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .expect("request")
        };

        let allowed = app
            .clone()
            .oneshot(preflight("https://planner.example.com"))
            .await
            .expect("response");
        assert_eq!(
            allowed
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|value| value.to_str().ok()),
            Some("https://planner.example.com")
        );

        let denied = app
            .oneshot(preflight("https://evil.example.com"))
            .await
            .expect("response");
        assert!(
            denied
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }
}
