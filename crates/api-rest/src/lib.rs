//! # API REST
//!
//! REST API implementation for Veritas.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS)
//!
//! The endpoints are the service side of the capabilities the pages use:
//! `GET /api/results` backs `HttpVerdictSource` and `POST /api/submissions` backs
//! `HttpSubmissionClient`. Decisions come from `veritas-core`; nothing here is stored.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use veritas_core::form::{
    receive_submission, Attachment, ClientMetadata, Consents, SubmissionFailure,
    SubmissionOutcome, SubmissionPayload, SubmissionReceipt,
};
use veritas_core::{CoreConfig, MockVerdictSource, ResultVerdict, VerdictSource};
use veritas_files::{FileIntake, IncomingFile, UPLOAD_URL_BASE};

/// Application state shared across REST API handlers
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<CoreConfig>,
    verdicts: Arc<dyn VerdictSource>,
}

impl AppState {
    /// State answering verdicts from the canned set, without delay.
    pub fn new(cfg: CoreConfig) -> Self {
        Self {
            cfg: Arc::new(cfg),
            verdicts: Arc::new(MockVerdictSource::new(Duration::ZERO)),
        }
    }

    pub fn with_verdict_source(mut self, verdicts: Arc<dyn VerdictSource>) -> Self {
        self.verdicts = verdicts;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResultsQuery {
    /// Address to assess.
    pub address: Option<String>,
}

/// Attachment an uploader is about to send.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadRequest {
    pub name: String,
    pub mime: String,
    pub size: u64,
}

/// Where an accepted attachment will live.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadDescriptor {
    pub id: String,
    pub url: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, get_results, create_submission, create_upload),
    components(schemas(
        HealthRes,
        ResultVerdict,
        SubmissionPayload,
        Attachment,
        Consents,
        ClientMetadata,
        SubmissionReceipt,
        SubmissionFailure,
        UploadRequest,
        UploadDescriptor,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/results", get(get_results))
        .route("/api/submissions", post(create_submission))
        .route("/api/uploads/create", post(create_upload))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `addr` and serves `app` until the server stops.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails while running.
pub async fn serve(addr: &str, app: Router) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn failure(message: impl Into<String>) -> SubmissionFailure {
    SubmissionFailure {
        error_id: format!("err_{}", Utc::now().timestamp_millis()),
        message: message.into(),
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
///
/// # Returns
/// * `Json<HealthRes>` - Health status response
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Veritas REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/api/results",
    params(ResultsQuery),
    responses(
        (status = 200, description = "Verdict for the address", body = ResultVerdict),
        (status = 500, description = "Internal server error")
    )
)]
/// Verdict for one address
///
/// A missing address is treated as empty and yields the inconclusive verdict.
///
/// # Returns
/// * `Ok(Json<ResultVerdict>)` - Verdict in the wire shape the results page reads
///
/// # Errors
/// Returns `500 Internal Server Error` if the verdict source fails.
#[axum::debug_handler]
async fn get_results(
    State(state): State<AppState>,
    Query(query): Query<ResultsQuery>,
) -> Result<Json<ResultVerdict>, (StatusCode, &'static str)> {
    let address = query.address.unwrap_or_default();
    match state.verdicts.fetch(&address).await {
        Ok(verdict) => Ok(Json(verdict)),
        Err(e) => {
            tracing::error!("Verdict error: {:?}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/submissions",
    request_body = SubmissionPayload,
    responses(
        (status = 200, description = "Submission received", body = SubmissionReceipt),
        (status = 400, description = "Submission refused", body = SubmissionFailure)
    )
)]
/// Receive a scam report
///
/// Fields are validated with the same rules as the form.
///
/// # Errors
/// Returns `400 Bad Request` with an error id and message if any field is invalid.
#[axum::debug_handler]
async fn create_submission(
    State(_state): State<AppState>,
    Json(payload): Json<SubmissionPayload>,
) -> Result<Json<SubmissionReceipt>, (StatusCode, Json<SubmissionFailure>)> {
    match receive_submission(&payload, Utc::now()) {
        SubmissionOutcome::Accepted(receipt) => Ok(Json(receipt)),
        SubmissionOutcome::Rejected(failure) => Err((StatusCode::BAD_REQUEST, Json(failure))),
    }
}

#[utoipa::path(
    post,
    path = "/api/uploads/create",
    request_body = UploadRequest,
    responses(
        (status = 200, description = "Upload slot created", body = UploadDescriptor),
        (status = 400, description = "Attachment refused", body = SubmissionFailure)
    )
)]
/// Reserve a storage slot for one attachment
///
/// The attachment is checked against the configured type and size limits.
///
/// # Errors
/// Returns `400 Bad Request` if the type is not allowed or the file is too large.
#[axum::debug_handler]
async fn create_upload(
    State(state): State<AppState>,
    Json(req): Json<UploadRequest>,
) -> Result<Json<UploadDescriptor>, (StatusCode, Json<SubmissionFailure>)> {
    let mut intake = FileIntake::new(state.cfg.intake.clone());
    let file = IncomingFile::metadata_only(req.name, req.mime, req.size);
    match intake.add(vec![file]) {
        Ok(ids) => match ids.into_iter().next() {
            Some(id) => Ok(Json(UploadDescriptor {
                url: format!("{}/{}", UPLOAD_URL_BASE, id),
                id,
            })),
            None => Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(failure("Upload slot could not be created")),
            )),
        },
        Err(e) => {
            tracing::warn!("Upload refused: {}", e);
            Err((StatusCode::BAD_REQUEST, Json(failure(e.message()))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;
    use veritas_core::form::{ClientContext, FormFields};

    fn app() -> Router {
        router(AppState::new(CoreConfig::default()))
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_json(uri: &str, body: &impl Serialize) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn payload(consent: bool) -> SubmissionPayload {
        let fields = FormFields {
            house_address: "1550 Mathilda Ave".into(),
            landlord_name: "Pat".into(),
            listing_url: "https://example.com/l/1".into(),
            other_details: String::new(),
            privacy_consent: consent,
        };
        SubmissionPayload::assemble(&fields, vec![], ClientContext::default().metadata(Utc::now()))
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_results_for_known_address() {
        let (status, body) = send(get("/api/results?address=1550%20Mathilda%20Ave")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["clear_outcome"], true);
        assert_eq!(body["scam_likelihood"], 0.85);
        assert_eq!(body["address"], "1550 Mathilda Ave");
        assert_eq!(body["reasons"][0][0], "bad");
        assert_eq!(body["analyzed_data"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_results_without_address_are_inconclusive() {
        let (status, body) = send(get("/api/results")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["clear_outcome"], false);
    }

    #[tokio::test]
    async fn test_submission_accepted() {
        let (status, body) = send(post_json("/api/submissions", &payload(true))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["submissionId"].as_str().unwrap().starts_with("subm_"));
        assert_eq!(body["status"], "received");
        assert_eq!(body["estimatedWaitSec"], 15);
    }

    #[tokio::test]
    async fn test_submission_refused() {
        let (status, body) = send(post_json("/api/submissions", &payload(false))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errorId"].as_str().unwrap().starts_with("err_"));
        assert_eq!(
            body["message"],
            "Validation failed: You must agree to the Privacy Policy"
        );
    }

    #[tokio::test]
    async fn test_upload_slot() {
        let req = UploadRequest {
            name: "lease.pdf".into(),
            mime: "application/pdf".into(),
            size: 1024,
        };
        let (status, body) = send(post_json("/api/uploads/create", &req)).await;
        assert_eq!(status, StatusCode::OK);
        let id = body["id"].as_str().unwrap();
        assert!(id.starts_with("file_"));
        assert_eq!(body["url"], format!("https://example.com/uploads/{}", id));
    }

    #[tokio::test]
    async fn test_upload_refused() {
        let req = UploadRequest {
            name: "setup.exe".into(),
            mime: "application/x-msdownload".into(),
            size: 1024,
        };
        let (status, body) = send(post_json("/api/uploads/create", &req)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("File type not supported"));

        let req = UploadRequest {
            name: "huge.pdf".into(),
            mime: "application/pdf".into(),
            size: 26 * 1024 * 1024,
        };
        let (status, _) = send(post_json("/api/uploads/create", &req)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let (status, body) = send(get("/api-docs/openapi.json")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/api/submissions"].is_object());
    }
}
