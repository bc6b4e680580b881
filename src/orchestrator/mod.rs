//! Tile orchestration.
//!
//! One invocation runs a fixed sequence for a single tiles marker:
//!
//! ```text
//!   TileTrigger
//!       │
//!       ▼
//!   locate original ──► Skip (backfill) ──► done
//!       │ Proceed
//!       ▼
//!   download ──► tile into scratch ──► plan uploads ──► upload (concurrent)
//!                                                          │
//!                                                          ▼
//!                                              delete scratch (always)
//! ```
//!
//! # Components
//!
//! - [`locate_original`]: Finds the sibling original image, or decides to skip
//! - [`plan_uploads`]: Pure walk of the tile output tree into destination keys
//! - [`upload_all`]: Concurrent uploads with per-file results
//! - [`TileOrchestrator`]: Runs the whole sequence for events and records

mod locate;
mod service;
mod upload;

pub use locate::{
    locate_original, OriginalLookup, OriginalMatcher, DEFAULT_BACKFILL_MARKER,
    DEFAULT_LIST_PAGE_SIZE, DEFAULT_ORIGINAL_MARKER,
};
pub use service::{OrchestratorConfig, TileOrchestrator, TileOutcome, TileReport};
pub use upload::{
    content_type_for, destination_key, is_upload_candidate, plan_uploads, upload_all,
    UploadFailure, UploadItem, UploadSummary, DEFAULT_UPLOAD_CONCURRENCY, UPLOAD_EXTENSIONS,
};
