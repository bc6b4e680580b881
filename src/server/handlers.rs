//! HTTP request handlers for the notification webhook.
//!
//! # Endpoints
//!
//! - `POST /events` - Process a bucket notification document
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::{IoError, ProcessError, TileError};
use crate::event::S3Event;
use crate::io::ObjectStore;
use crate::orchestrator::{TileOrchestrator, TileOutcome};
use crate::tile::Tiler;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the orchestrator.
pub struct AppState<S, T> {
    pub orchestrator: Arc<TileOrchestrator<S, T>>,
}

impl<S, T> AppState<S, T> {
    pub fn new(orchestrator: TileOrchestrator<S, T>) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

impl<S, T> Clone for AppState<S, T> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "invalid_event")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
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

/// Response from the events endpoint.
#[derive(Debug, Serialize)]
pub struct EventsResponse {
    /// False when some tiles could not be uploaded
    pub complete: bool,

    /// One outcome per record, in document order
    pub outcomes: Vec<TileOutcome>,
}

// =============================================================================
// Error Mapping
// =============================================================================

fn log_error(status: StatusCode, error_type: &str, message: &str) {
    if status.is_server_error() {
        error!(
            error_type = error_type,
            status = status.as_u16(),
            "Server error: {}",
            message
        );
    } else if status == StatusCode::NOT_FOUND {
        debug!(
            error_type = error_type,
            status = status.as_u16(),
            "Resource not found: {}",
            message
        );
    } else {
        warn!(
            error_type = error_type,
            status = status.as_u16(),
            "Client error: {}",
            message
        );
    }
}

/// Convert ProcessError to HTTP response.
///
/// Any non-2xx status makes the notifying service redeliver the event.
impl IntoResponse for ProcessError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ProcessError::OriginalNotFound { .. } => (StatusCode::NOT_FOUND, "original_not_found"),

            ProcessError::Storage(IoError::NotFound(_)) => (StatusCode::NOT_FOUND, "not_found"),
            ProcessError::Storage(IoError::Connection(_)) => {
                (StatusCode::BAD_GATEWAY, "connection_error")
            }
            ProcessError::Storage(IoError::S3(_)) => (StatusCode::BAD_GATEWAY, "storage_error"),

            ProcessError::Tiling(TileError::Decode { .. })
            | ProcessError::Tiling(TileError::EmptyImage { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "undecodable_image")
            }
            ProcessError::Tiling(_) => (StatusCode::INTERNAL_SERVER_ERROR, "tiling_error"),

            ProcessError::Scratch { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "scratch_error"),
        };

        let message = self.to_string();
        log_error(status, error_type, &message);

        let error_response = ErrorResponse::with_status(error_type, message, status);
        (status, Json(error_response)).into_response()
    }
}

/// Errors returned by the events endpoint.
#[derive(Debug)]
pub enum EventsError {
    /// Body is not a notification document
    InvalidPayload(String),

    /// A record failed
    Process(ProcessError),
}

impl IntoResponse for EventsError {
    fn into_response(self) -> Response {
        match self {
            EventsError::InvalidPayload(message) => {
                let status = StatusCode::BAD_REQUEST;
                log_error(status, "invalid_event", &message);
                let error_response = ErrorResponse::with_status("invalid_event", message, status);
                (status, Json(error_response)).into_response()
            }
            EventsError::Process(err) => err.into_response(),
        }
    }
}

impl From<ProcessError> for EventsError {
    fn from(err: ProcessError) -> Self {
        EventsError::Process(err)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle a bucket notification.
///
/// # Endpoint
///
/// `POST /events`
///
/// # Response
///
/// - `200 OK`: every record was ignored, skipped or fully tiled
/// - `400 Bad Request`: body is not a notification document
/// - `401 Unauthorized`: missing or wrong bearer token
/// - `404 Not Found`: no original image next to the tiles marker
/// - `422 Unprocessable Entity`: the original could not be decoded
/// - `502 Bad Gateway`: storage failure, or some tiles were not uploaded
/// - `500 Internal Server Error`: tiling or scratch directory failure
pub async fn events_handler<S, T>(
    State(state): State<AppState<S, T>>,
    body: Bytes,
) -> Result<Response, EventsError>
where
    S: ObjectStore + 'static,
    T: Tiler,
{
    let event =
        S3Event::from_slice(&body).map_err(|e| EventsError::InvalidPayload(e.to_string()))?;

    let outcomes = state.orchestrator.handle_event(&event).await?;
    let complete = outcomes.iter().all(TileOutcome::is_complete);

    let status = if complete {
        StatusCode::OK
    } else {
        warn!("Responding with partial upload report");
        StatusCode::BAD_GATEWAY
    };

    Ok((status, Json(EventsResponse { complete, outcomes })).into_response())
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
