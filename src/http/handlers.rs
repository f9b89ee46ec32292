use super::state::AppState;
use crate::error::{BridgeError, ErrorPayload};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

/// A bridge call: action name plus positional arguments
#[derive(Debug, Serialize, Deserialize)]
pub struct ExecRequest {
    pub action: String,

    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResponse {
    /// "ok" or "error"
    pub status: String,

    /// Denial code, present only for permission denial
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,

    /// Resolved path on success (null when absent), error text on failure
    #[serde(default)]
    pub message: Option<String>,
}

impl ExecResponse {
    pub fn ok(message: Option<String>) -> Self {
        Self {
            status: "ok".to_string(),
            code: None,
            message,
        }
    }

    pub fn error(err: &BridgeError) -> Self {
        let (code, message) = match err.payload() {
            ErrorPayload::Code { code } => (Some(code), None),
            ErrorPayload::Message { message } => (None, Some(message)),
        };

        Self {
            status: "error".to_string(),
            code,
            message,
        }
    }
}

fn status_for(err: &BridgeError) -> StatusCode {
    match err {
        BridgeError::UnrecognizedAction(_)
        | BridgeError::MissingArgument { .. }
        | BridgeError::InvalidFilename(_) => StatusCode::BAD_REQUEST,
        BridgeError::PermissionDenied => StatusCode::FORBIDDEN,
        BridgeError::PermissionTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        BridgeError::Busy => StatusCode::SERVICE_UNAVAILABLE,
        BridgeError::Io(_) | BridgeError::Dropped => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &BridgeError) -> axum::response::Response {
    (status_for(err), Json(ExecResponse::error(err))).into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /exec
/// Submit an action and wait for it to resolve
pub async fn exec(
    State(state): State<AppState>,
    Json(req): Json<ExecRequest>,
) -> impl IntoResponse {
    info!("Bridge call: {} ({} args)", req.action, req.args.len());

    let handle = match state.dispatcher.submit(&req.action, req.args) {
        Ok(handle) => handle,
        Err(e) => {
            warn!("Rejected bridge call {}: {}", req.action, e);
            return error_response(&e);
        }
    };

    let id = handle.id();
    info!("Submitted {} as request {}", handle.kind(), id);

    match handle.outcome().await {
        Ok(path) => {
            let message = path.map(|p| p.display().to_string());
            (StatusCode::OK, Json(ExecResponse::ok(message))).into_response()
        }
        Err(e) => {
            warn!("Request {} failed: {}", id, e);
            error_response(&e)
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
