//! HTTP webhook layer.
//!
//! Receives bucket notifications over HTTP and runs them through the
//! orchestrator.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │            POST /events          GET /health                    │
//! │                                                                 │
//! │  ┌─────────────┐  ┌──────────────┐  ┌────────────────────────┐  │
//! │  │  handlers   │  │     auth     │  │        routes          │  │
//! │  │ (events)    │  │ (bearer)     │  │  (router config)       │  │
//! │  └─────────────┘  └──────────────┘  └────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::{auth_middleware, AuthError, BearerAuth};
pub use handlers::{
    events_handler, health_handler, AppState, ErrorResponse, EventsError, EventsResponse,
    HealthResponse,
};
pub use routes::{create_router, RouterConfig};
