//! Router configuration for the webhook server.
//!
//! # Route Structure
//!
//! ```text
//! /health    - Health check (public)
//! /events    - Bucket notifications (bearer token when configured)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use zoomify_tiler::server::routes::{create_router, RouterConfig};
//!
//! let config = RouterConfig::new().with_auth_token("token");
//! let router = create_router(orchestrator, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::auth::{auth_middleware, BearerAuth};
use super::handlers::{events_handler, health_handler, AppState};
use crate::io::ObjectStore;
use crate::orchestrator::TileOrchestrator;
use crate::tile::Tiler;

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Bearer token required on `/events` (None = no authentication)
    pub auth_token: Option<String>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterConfig {
    /// Create a configuration without authentication and with tracing enabled.
    pub fn new() -> Self {
        Self {
            auth_token: None,
            enable_tracing: true,
        }
    }

    /// Require a bearer token on `/events`.
    ///
    /// An empty token disables authentication.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.auth_token = if token.is_empty() { None } else { Some(token) };
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

/// Create the application router.
pub fn create_router<S, T>(orchestrator: TileOrchestrator<S, T>, config: RouterConfig) -> Router
where
    S: ObjectStore + 'static,
    T: Tiler,
{
    let app_state = AppState::new(orchestrator);

    let mut event_routes = Router::new()
        .route("/events", post(events_handler::<S, T>))
        .with_state(app_state);

    if let Some(token) = &config.auth_token {
        event_routes = event_routes.layer(middleware::from_fn_with_state(
            BearerAuth::new(token),
            auth_middleware,
        ));
    }

    let router = Router::new()
        .route("/health", get(health_handler))
        .merge(event_routes);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}
