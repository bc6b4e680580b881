//! Configuration management for the Zoomify tiler.
//!
//! This module provides the command-line interface. It supports:
//! - Subcommands for one-shot event handling, the webhook server, local tiling
//!   and storage checks
//! - Environment variables with the `TILER_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use zoomify_tiler::config::{Cli, Command};
//!
//! match Cli::parse().into_command() {
//!     Command::Serve(config) => println!("Listening on {}", config.bind_address()),
//!     _ => {}
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `TILER_S3_ENDPOINT` - Custom S3 endpoint for S3-compatible services
//! - `TILER_S3_REGION` - AWS region (default: us-east-1)
//! - `TILER_S3_BUCKET` - Bucket inspected by `check`
//! - `TILER_SCRATCH_DIR` - Scratch root (default: platform temp directory)
//! - `TILER_TILES_SUFFIX` - Trigger key suffix (default: /tiles/)
//! - `TILER_STRICT_EVENT_NAME` - Reject `s3:`-prefixed event names (default: false)
//! - `TILER_LIST_PAGE_SIZE` - Keys listed when locating the original (default: 5)
//! - `TILER_ORIGINAL_MARKER` - Original image key marker (default: original-)
//! - `TILER_BACKFILL_MARKER` - Backfill key marker (default: backfill-original)
//! - `TILER_TILE_SIZE` - Tile edge in pixels (default: 256)
//! - `TILER_UPLOAD_CONCURRENCY` - Uploads in flight (default: 16)
//! - `TILER_HOST` - Server bind address (default: 0.0.0.0)
//! - `TILER_PORT` - Server port (default: 3000)
//! - `TILER_AUTH_TOKEN` - Bearer token required on `/events`

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::event::{EventNameMatch, DEFAULT_TILES_SUFFIX};
use crate::orchestrator::{
    OrchestratorConfig, DEFAULT_BACKFILL_MARKER, DEFAULT_LIST_PAGE_SIZE, DEFAULT_ORIGINAL_MARKER,
    DEFAULT_UPLOAD_CONCURRENCY,
};
use crate::tile::{is_valid_tile_size, ZoomifyTiler, DEFAULT_TILE_SIZE, MAX_TILE_SIZE, MIN_TILE_SIZE};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Largest accepted listing page (the S3 maximum).
const MAX_LIST_PAGE_SIZE: i32 = 1000;

// =============================================================================
// CLI
// =============================================================================

/// Zoomify tiler - turns uploaded images into Zoomify tile sets in S3.
#[derive(Parser, Debug, Clone)]
#[command(name = "zoomify-tiler")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Process one bucket notification document and exit.
    Handle(HandleConfig),

    /// Run the notification webhook server.
    Serve(ServeConfig),

    /// Tile a local image into a local directory.
    Tile(TileConfig),

    /// Check storage connectivity and original lookup.
    Check(CheckConfig),
}

// =============================================================================
// Shared Arguments
// =============================================================================

/// Object storage connection settings.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct StorageArgs {
    /// Custom S3 endpoint URL for S3-compatible services (MinIO, etc.).
    #[arg(long, env = "TILER_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "TILER_S3_REGION")]
    pub s3_region: String,
}

impl StorageArgs {
    pub fn validate(&self) -> Result<(), String> {
        if self.s3_region.is_empty() {
            return Err("S3 region must not be empty".to_string());
        }
        if let Some(endpoint) = &self.s3_endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!(
                    "S3 endpoint must be an http(s) URL, got '{}'",
                    endpoint
                ));
            }
        }
        Ok(())
    }
}

/// Tiling pipeline settings.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct PipelineArgs {
    /// Directory for per-invocation scratch space (default: platform temp dir).
    #[arg(long, env = "TILER_SCRATCH_DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Key suffix that requests tiling.
    #[arg(long, default_value = DEFAULT_TILES_SUFFIX, env = "TILER_TILES_SUFFIX")]
    pub tiles_suffix: String,

    /// Accept only the exact event name `ObjectCreated:Put`, not `s3:ObjectCreated:Put`.
    #[arg(long, env = "TILER_STRICT_EVENT_NAME")]
    pub strict_event_name: bool,

    /// Number of keys listed when looking for the original image.
    #[arg(long, default_value_t = DEFAULT_LIST_PAGE_SIZE, env = "TILER_LIST_PAGE_SIZE")]
    pub list_page_size: i32,

    /// Substring identifying the original image.
    #[arg(long, default_value = DEFAULT_ORIGINAL_MARKER, env = "TILER_ORIGINAL_MARKER")]
    pub original_marker: String,

    /// Substring identifying a backfilled original (skipped).
    #[arg(long, default_value = DEFAULT_BACKFILL_MARKER, env = "TILER_BACKFILL_MARKER")]
    pub backfill_marker: String,

    /// Tile edge length in pixels.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE, env = "TILER_TILE_SIZE")]
    pub tile_size: u32,

    /// Maximum number of uploads in flight.
    #[arg(long, default_value_t = DEFAULT_UPLOAD_CONCURRENCY, env = "TILER_UPLOAD_CONCURRENCY")]
    pub upload_concurrency: usize,
}

impl Default for PipelineArgs {
    fn default() -> Self {
        Self {
            scratch_dir: None,
            tiles_suffix: DEFAULT_TILES_SUFFIX.to_string(),
            strict_event_name: false,
            list_page_size: DEFAULT_LIST_PAGE_SIZE,
            original_marker: DEFAULT_ORIGINAL_MARKER.to_string(),
            backfill_marker: DEFAULT_BACKFILL_MARKER.to_string(),
            tile_size: DEFAULT_TILE_SIZE,
            upload_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
        }
    }
}

impl PipelineArgs {
    pub fn validate(&self) -> Result<(), String> {
        if self.tiles_suffix.is_empty() {
            return Err("tiles_suffix must not be empty".to_string());
        }
        if self.original_marker.is_empty() {
            return Err("original_marker must not be empty".to_string());
        }
        if !(1..=MAX_LIST_PAGE_SIZE).contains(&self.list_page_size) {
            return Err(format!(
                "list_page_size must be between 1 and {}",
                MAX_LIST_PAGE_SIZE
            ));
        }
        if !is_valid_tile_size(self.tile_size) {
            return Err(format!(
                "tile_size must be between {} and {}",
                MIN_TILE_SIZE, MAX_TILE_SIZE
            ));
        }
        if self.upload_concurrency == 0 {
            return Err("upload_concurrency must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Event name rule selected by `--strict-event-name`.
    pub fn event_name_match(&self) -> EventNameMatch {
        if self.strict_event_name {
            EventNameMatch::Exact
        } else {
            EventNameMatch::AllowS3Prefix
        }
    }

    /// Build the library orchestrator settings.
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        let mut config = OrchestratorConfig::default()
            .with_tiles_suffix(self.tiles_suffix.clone())
            .with_event_name_match(self.event_name_match())
            .with_markers(self.original_marker.clone(), self.backfill_marker.clone())
            .with_list_page_size(self.list_page_size)
            .with_upload_concurrency(self.upload_concurrency);

        if let Some(dir) = &self.scratch_dir {
            config = config.with_scratch_root(dir.clone());
        }

        config
    }

    pub fn tiler(&self) -> ZoomifyTiler {
        ZoomifyTiler::with_tile_size(self.tile_size)
    }
}

// =============================================================================
// Subcommand Configurations
// =============================================================================

/// `handle`: process a notification document from a file or stdin.
#[derive(Args, Debug, Clone)]
pub struct HandleConfig {
    /// Path to the notification JSON, or `-` for stdin.
    #[arg(short, long, default_value = "-")]
    pub event: String,

    #[command(flatten)]
    pub storage: StorageArgs,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl HandleConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.event.is_empty() {
            return Err("Event source is required. Pass --event <file> or --event -".to_string());
        }
        self.storage.validate()?;
        self.pipeline.validate()
    }

    /// True when the event document is read from stdin.
    pub fn reads_stdin(&self) -> bool {
        self.event == "-"
    }
}

/// `serve`: run the webhook server.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "TILER_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "TILER_PORT")]
    pub port: u16,

    /// Bearer token required on /events. Unset disables authentication.
    #[arg(long, env = "TILER_AUTH_TOKEN")]
    pub auth_token: Option<String>,

    #[command(flatten)]
    pub storage: StorageArgs,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("host must not be empty".to_string());
        }
        if matches!(&self.auth_token, Some(token) if token.trim().is_empty()) {
            return Err(
                "auth_token is set but empty. Unset TILER_AUTH_TOKEN to disable authentication"
                    .to_string(),
            );
        }
        self.storage.validate()?;
        self.pipeline.validate()
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// `tile`: run the tiler on a local file.
#[derive(Args, Debug, Clone)]
pub struct TileConfig {
    /// Source image.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory for ImageProperties.xml and TileGroup directories.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Tile edge length in pixels.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE, env = "TILER_TILE_SIZE")]
    pub tile_size: u32,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl TileConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_tile_size(self.tile_size) {
            return Err(format!(
                "tile_size must be between {} and {}",
                MIN_TILE_SIZE, MAX_TILE_SIZE
            ));
        }
        if self.input == self.output {
            return Err("input and output must differ".to_string());
        }
        Ok(())
    }
}

/// `check`: verify storage access and optionally the original lookup.
#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    /// Bucket to check.
    #[arg(long, env = "TILER_S3_BUCKET")]
    pub bucket: String,

    /// Images prefix to run the original lookup on (e.g. "albums/7/").
    #[arg(long)]
    pub prefix: Option<String>,

    #[command(flatten)]
    pub storage: StorageArgs,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl CheckConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.bucket.is_empty() {
            return Err("Bucket name is required. Set --bucket or TILER_S3_BUCKET".to_string());
        }
        self.storage.validate()?;
        self.pipeline.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================
