//! # Zoomify Tiler
//!
//! Event-driven Zoomify tile generation for images stored in S3-compatible
//! object storage.
//!
//! When a marker object ending in `/tiles/` is uploaded next to an image, the
//! sibling original image is downloaded, cut into a Zoomify tile pyramid and
//! the tiles are uploaded back under the marker key.
//!
//! ## Features
//!
//! - **Event filtering**: Acts only on `ObjectCreated:Put` notifications for tiles markers
//! - **Original lookup**: Finds the `original-` image, skipping backfilled ones
//! - **Zoomify output**: `ImageProperties.xml` plus PNG tiles in `TileGroup` directories
//! - **Concurrent uploads**: Bounded parallel uploads with per-file failure reporting
//! - **Webhook server**: Optional axum endpoint for bucket notification targets
//!
//! ## Architecture
//!
//! - [`event`] - Notification documents and the trigger filter
//! - [`io`] - Object storage abstraction, S3 backend and scratch directories
//! - [`tile`] - Zoomify layout, PNG encoding and the tiler
//! - [`orchestrator`] - Locate, tile, upload and cleanup sequence
//! - [`server`] - Axum-based webhook server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use zoomify_tiler::{
//!     create_s3_client, OrchestratorConfig, S3Event, S3ObjectStore, TileOrchestrator,
//!     ZoomifyTiler,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = create_s3_client(None, "us-east-1").await;
//!     let orchestrator = TileOrchestrator::new(
//!         S3ObjectStore::new(client),
//!         ZoomifyTiler::new(),
//!         OrchestratorConfig::default(),
//!     );
//!
//!     let event = S3Event::single("ObjectCreated:Put", "photos", "albums/7/tiles/");
//!     match orchestrator.handle_event(&event).await {
//!         Ok(outcomes) => println!("{:?}", outcomes),
//!         Err(e) => eprintln!("tiling failed: {}", e),
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod io;
pub mod orchestrator;
pub mod server;
pub mod tile;

// Re-export commonly used types
pub use config::{
    CheckConfig, Cli, Command, HandleConfig, PipelineArgs, ServeConfig, StorageArgs, TileConfig,
};
pub use error::{IoError, ProcessError, TileError};
pub use event::{EventNameMatch, S3Event, S3EventRecord, TileTrigger};
pub use io::{create_s3_client, ObjectEntry, ObjectStore, S3ObjectStore, ScratchDir};
pub use orchestrator::{
    locate_original, plan_uploads, OrchestratorConfig, OriginalLookup, OriginalMatcher,
    TileOrchestrator, TileOutcome, TileReport, UploadFailure, UploadItem,
};
pub use server::{create_router, AppState, BearerAuth, ErrorResponse, RouterConfig};
pub use tile::{Tiler, TileSummary, ZoomifyLayout, ZoomifyTiler};
