//! HTTP intake API
//!
//! Three decision endpoints plus a health check. Synchronous-path errors
//! map to minimal `{error}` bodies; nothing from the background channels
//! ever reaches a caller.

use super::state::AppState;
use crate::error::SophrosyneError;
use crate::feedback::intake::{FeedbackSubmission, WizardSubmission};
use crate::types::{ClientOutcome, InteractionMetadata, SatisfactionFeedback, WizardOutcome, WizardResponse};
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Server address
    pub addr: SocketAddr,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            addr: ([127, 0, 0, 1], 3600).into(),
        }
    }
}

/// API server
pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Build router
    pub fn build_router(state: AppState) -> Router {
        Router::new()
            // Decision intake
            .route("/api/interactions/:id/feedback", post(submit_feedback_handler))
            .route("/api/interactions/:id/wizard", post(complete_wizard_handler))
            .route("/api/ghost-cards/:id/feedback", patch(satisfaction_handler))
            // Health check
            .route("/health", get(health_handler))
            // State
            .with_state(state)
            // Middleware
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Start serving
    pub async fn serve(self) -> anyhow::Result<()> {
        let router = Self::build_router(self.state);

        let listener = tokio::net::TcpListener::bind(self.config.addr).await?;
        info!("Intake API listening on http://{}", self.config.addr);
        axum::serve(listener, router).await?;

        Ok(())
    }
}

/// Error wrapper mapping the taxonomy onto statuses and `{error}` bodies
struct ApiError(SophrosyneError);

impl From<SophrosyneError> for ApiError {
    fn from(err: SophrosyneError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            SophrosyneError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }
            SophrosyneError::InvalidRequest(message) => {
                (StatusCode::BAD_REQUEST, message.clone())
            }
            SophrosyneError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found".to_string()),
            SophrosyneError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            SophrosyneError::Conflict(message) => (StatusCode::CONFLICT, message.clone()),
            other => {
                // Store and internal failures stay in the logs; the
                // caller only learns that the write did not happen.
                error!(error = %other, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Deserialize a request body, mapping schema violations to 400
///
/// Axum's typed `Json` extractor answers 422 for well-formed JSON that
/// fails deserialization; the intake contract promises 400 for anything
/// outside the closed vocabularies, so bodies arrive as raw values and
/// are validated here, after authentication.
fn parse_body<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, ApiError> {
    serde_json::from_value(value)
        .map_err(|e| ApiError(SophrosyneError::InvalidRequest(e.to_string())))
}

/// Resolve the bearer session or fail with 401
async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError(SophrosyneError::Unauthorized))?;

    state
        .sessions
        .resolve(token)
        .await
        .ok_or(ApiError(SophrosyneError::Unauthorized))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackRequest {
    outcome: ClientOutcome,
    #[serde(default)]
    metadata: Option<InteractionMetadata>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackResponse {
    success: bool,
    feedback_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated: Option<bool>,
}

async fn submit_feedback_handler(
    State(state): State<AppState>,
    Path(interaction_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    let user_id = authenticate(&state, &headers).await?;
    let request: FeedbackRequest = parse_body(body)?;

    let receipt = state
        .feedback
        .submit_feedback(
            &user_id,
            &interaction_id,
            FeedbackSubmission {
                outcome: request.outcome,
                metadata: request.metadata,
            },
        )
        .await?;

    Ok(Json(FeedbackResponse {
        success: true,
        feedback_id: receipt.feedback_id,
        updated: receipt.updated.then_some(true),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SatisfactionRequest {
    satisfaction_feedback: SatisfactionFeedback,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SatisfactionResponse {
    success: bool,
    ghost_card_id: String,
    satisfaction_feedback: SatisfactionFeedback,
}

async fn satisfaction_handler(
    State(state): State<AppState>,
    Path(ghost_card_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<SatisfactionResponse>, ApiError> {
    let user_id = authenticate(&state, &headers).await?;
    let request: SatisfactionRequest = parse_body(body)?;

    let receipt = state
        .feedback
        .submit_satisfaction(&user_id, &ghost_card_id, request.satisfaction_feedback)
        .await?;

    Ok(Json(SatisfactionResponse {
        success: true,
        ghost_card_id: receipt.ghost_card_id,
        satisfaction_feedback: receipt.satisfaction_feedback,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WizardRequest {
    responses: Vec<WizardResponse>,
    outcome: WizardOutcome,
}

#[derive(Debug, Serialize)]
struct WizardResponseBody {
    success: bool,
}

async fn complete_wizard_handler(
    State(state): State<AppState>,
    Path(interaction_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<WizardResponseBody>, ApiError> {
    let user_id = authenticate(&state, &headers).await?;
    let request: WizardRequest = parse_body(body)?;

    state
        .feedback
        .complete_wizard(
            &user_id,
            &interaction_id,
            WizardSubmission {
                responses: request.responses,
                outcome: request.outcome,
            },
        )
        .await?;

    Ok(Json(WizardResponseBody { success: true }))
}

/// Health check handler
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
