//! REST API server for the welfare compass
//!
//! Exposes conversation turns, session inspection and catalog reload
//! over HTTP for a chat front end.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::conversational::Compass;
use crate::models::{Intent, MatchedProgram, UserProfile};
use crate::state::{run_session_turn, SessionStore};

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResetRequest {
    pub session_id: String,
}

/// =============================
/// Response Models
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: Uuid,
    pub reply: String,
    pub intent: Intent,
    pub profile_field_count: usize,
    pub show_cards: bool,
    pub matched_programs: Vec<MatchedProgram>,
    pub profile: UserProfile,
    pub out_of_region: bool,
    pub catalog_unavailable: bool,
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub compass: Arc<Compass>,
    pub sessions: Arc<dyn SessionStore>,
}

/// =============================
/// Helpers
/// =============================

fn stable_uuid_from_string(input: &str) -> Uuid {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(bytes)
}

/// Client session ids may be any string; non-UUIDs map to a stable UUID
fn session_uuid(value: &str) -> Uuid {
    let value = value.trim();
    Uuid::parse_str(value).unwrap_or_else(|_| stable_uuid_from_string(value))
}

fn error_response(status: StatusCode, message: &str) -> (StatusCode, Json<ApiResponse>) {
    (status, Json(ApiResponse::error(message.to_string())))
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Chat Endpoint
/// =============================

async fn chat_handler(
    State(state): State<ApiState>,
    Json(req): Json<ChatRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let message = req.message.trim();
    if message.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Message must not be empty");
    }

    let session_id = match req.session_id.as_deref() {
        Some(value) if !value.trim().is_empty() => session_uuid(value),
        _ => Uuid::new_v4(),
    };
    info!(%session_id, "Received chat turn");

    let session = state.sessions.get_or_create(session_id).await;
    let (outcome, context) = run_session_turn(&state.compass, &session, message).await;

    let response = ChatResponse {
        session_id,
        reply: outcome.reply,
        intent: outcome.intent,
        profile_field_count: outcome.profile_field_count,
        show_cards: outcome.show_cards,
        matched_programs: outcome.matched_programs,
        profile: context.profile,
        out_of_region: outcome.out_of_region,
        catalog_unavailable: outcome.catalog_unavailable,
    };

    (StatusCode::OK, Json(ApiResponse::success(response)))
}

/// =============================
/// Session Endpoints
/// =============================

async fn profile_handler(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> (StatusCode, Json<ApiResponse>) {
    let session_id = session_uuid(&session_id);

    let Some(session) = state.sessions.get(session_id).await else {
        return error_response(StatusCode::NOT_FOUND, "Unknown session");
    };

    let context = session.lock().await;
    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({
            "session_id": session_id,
            "profile": context.profile,
            "profile_field_count": context.profile.core_field_count(),
            "missing_fields": context.profile.missing_core_fields(),
        }))),
    )
}

async fn reset_handler(
    State(state): State<ApiState>,
    Json(req): Json<ResetRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if req.session_id.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "session_id must not be empty");
    }

    let session_id = session_uuid(&req.session_id);
    let reset = state.sessions.remove(session_id).await;
    info!(%session_id, reset, "Session reset requested");

    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({ "reset": reset }))),
    )
}

/// =============================
/// Catalog Endpoint
/// =============================

async fn reload_catalog_handler(State(state): State<ApiState>) -> (StatusCode, Json<ApiResponse>) {
    let catalog = state.compass.catalog().reload().await;
    info!(programs = catalog.len(), "Catalog reloaded via API");

    if catalog.is_empty() {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Program catalog could not be loaded",
        );
    }

    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({ "programs": catalog.len() }))),
    )
}

/// =============================
/// Router
/// =============================

pub fn create_router(compass: Arc<Compass>, sessions: Arc<dyn SessionStore>) -> Router {
    let state = ApiState { compass, sessions };

    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat_handler))
        .route("/api/session/:id/profile", get(profile_handler))
        .route("/api/session/reset", post(reset_handler))
        .route("/api/catalog/reload", post(reload_catalog_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    compass: Arc<Compass>,
    sessions: Arc<dyn SessionStore>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(compass, sessions);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
