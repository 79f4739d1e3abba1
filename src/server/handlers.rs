//! HTTP handlers shared by every router.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check endpoint
//! - fallback - JSON 404 for anything neither a route nor a static file

use axum::{
    http::{header, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::StaticFileError;

// =============================================================================
// Response Types
// =============================================================================

/// JSON body of every error this crate answers itself.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable kind: `not_found` or `method_not_allowed`
    pub error: String,

    pub message: String,

    /// Numeric copy of the response status
    pub status: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: status.as_u16(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Terminal responses for a handler mounted without a fallback.
///
/// `MethodNotSupported` answers 405 and lists the served methods in `Allow`.
/// `FileNotFound` answers 404.
impl IntoResponse for StaticFileError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, kind, allow) = match &self {
            StaticFileError::MethodNotSupported { methods, .. } => {
                warn!(method = %self.request().method, "Rejected method: {}", message);
                let allow = methods
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                (StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed", Some(allow))
            }
            StaticFileError::FileNotFound { .. } => {
                debug!("Static file not found: {}", message);
                (StatusCode::NOT_FOUND, "not_found", None)
            }
        };

        let body = Json(ErrorResponse::new(kind, message, status));
        let mut response = (status, body).into_response();
        if let Some(value) = allow.and_then(|allow| HeaderValue::from_str(&allow).ok()) {
            response.headers_mut().insert(header::ALLOW, value);
        }
        response
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /health`: `{"status": "healthy", "version": "<crate version>"}`.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Fallback for requests no route or static file answered.
pub async fn not_found_handler(uri: Uri) -> Response {
    let status = StatusCode::NOT_FOUND;
    let message = format!("Nothing found at {}", uri.path());
    debug!(status = status.as_u16(), "Resource not found: {}", message);

    (
        status,
        Json(ErrorResponse::new("not_found", message, status)),
    )
        .into_response()
}

// =============================================================================
// Tests
// =============================================================================
