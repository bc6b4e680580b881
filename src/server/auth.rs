//! Bearer token authentication for the webhook endpoint.
//!
//! Notification targets (MinIO webhook targets, S3-compatible brokers) can be
//! configured to send a static `Authorization: Bearer <token>` header. When a
//! token is configured, requests to `/events` must carry it.
//!
//! ```text
//! POST /events
//! Authorization: Bearer 3f1c...
//! ```
//!
//! Tokens are compared in constant time.
//!
//! # Example
//!
//! ```rust
//! use zoomify_tiler::server::auth::BearerAuth;
//!
//! let auth = BearerAuth::new("s3cret");
//! assert!(auth.verify(Some("Bearer s3cret")).is_ok());
//! assert!(auth.verify(Some("Bearer nope")).is_err());
//! assert!(auth.verify(None).is_err());
//! ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use http::header::AUTHORIZATION;
use http::StatusCode;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use super::handlers::ErrorResponse;

/// Authentication error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No Authorization header
    MissingToken,

    /// Authorization header is not a bearer token
    MalformedHeader,

    /// Token does not match
    InvalidToken,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Missing bearer token"),
            AuthError::MalformedHeader => write!(f, "Authorization header is not a bearer token"),
            AuthError::InvalidToken => write!(f, "Invalid bearer token"),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let error_type = match &self {
            AuthError::MissingToken => "missing_token",
            AuthError::MalformedHeader => "malformed_authorization",
            AuthError::InvalidToken => "invalid_token",
        };
        let status = StatusCode::UNAUTHORIZED;
        let message = self.to_string();

        // A wrong token may be an attack, the rest is usually misconfiguration
        if self == AuthError::InvalidToken {
            warn!(error_type = error_type, "Authentication failed: {}", message);
        } else {
            debug!(error_type = error_type, "Authentication failed: {}", message);
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);
        (status, Json(error_response)).into_response()
    }
}

/// Static bearer token check.
#[derive(Clone)]
pub struct BearerAuth {
    token: Vec<u8>,
}

impl BearerAuth {
    pub fn new(token: impl AsRef<[u8]>) -> Self {
        Self {
            token: token.as_ref().to_vec(),
        }
    }

    /// Verify the value of an Authorization header.
    pub fn verify(&self, header: Option<&str>) -> Result<(), AuthError> {
        let header = header.ok_or(AuthError::MissingToken)?;

        let provided = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .ok_or(AuthError::MalformedHeader)?
            .trim();

        if provided.as_bytes().ct_eq(&self.token).into() {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth").finish_non_exhaustive()
    }
}

/// Axum middleware rejecting requests without the configured bearer token.
///
/// # Example
///
/// ```ignore
/// use axum::{middleware, routing::post, Router};
/// use zoomify_tiler::server::auth::{auth_middleware, BearerAuth};
///
/// let app = Router::new()
///     .route("/events", post(events_handler))
///     .layer(middleware::from_fn_with_state(BearerAuth::new("token"), auth_middleware));
/// ```
pub async fn auth_middleware(
    State(auth): State<BearerAuth>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header = match request.headers().get(AUTHORIZATION) {
        Some(value) => Some(value.to_str().map_err(|_| AuthError::MalformedHeader)?),
        None => None,
    };

    auth.verify(header)?;

    Ok(next.run(request).await)
}
