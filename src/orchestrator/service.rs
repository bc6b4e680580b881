//! The tile orchestrator.
//!
//! [`TileOrchestrator`] turns notification records into tile sets. It owns an
//! object store, a tiler and the invocation settings, and holds no mutable
//! state, so one instance can serve concurrent invocations.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{ProcessError, TileError};
use crate::event::{EventNameMatch, S3Event, S3EventRecord, TileTrigger, DEFAULT_TILES_SUFFIX};
use crate::io::{ObjectStore, ScratchDir};
use crate::tile::{TileSummary, Tiler};

use super::locate::{
    locate_original, OriginalLookup, OriginalMatcher, DEFAULT_BACKFILL_MARKER,
    DEFAULT_LIST_PAGE_SIZE, DEFAULT_ORIGINAL_MARKER,
};
use super::upload::{
    plan_uploads, upload_all, UploadFailure, UploadItem, DEFAULT_UPLOAD_CONCURRENCY,
};

// =============================================================================
// Configuration
// =============================================================================

/// Settings for a [`TileOrchestrator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Directory under which per-invocation scratch directories are created
    pub scratch_root: PathBuf,

    /// Key suffix that marks a tiling request
    pub tiles_suffix: String,

    /// Which event names count as an object upload
    pub event_name_match: EventNameMatch,

    /// Substring identifying the original image
    pub original_marker: String,

    /// Substring identifying a backfilled original that must be skipped
    pub backfill_marker: String,

    /// Number of keys requested when listing the images prefix
    pub list_page_size: i32,

    /// Maximum number of uploads in flight
    pub upload_concurrency: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            scratch_root: std::env::temp_dir(),
            tiles_suffix: DEFAULT_TILES_SUFFIX.to_string(),
            event_name_match: EventNameMatch::default(),
            original_marker: DEFAULT_ORIGINAL_MARKER.to_string(),
            backfill_marker: DEFAULT_BACKFILL_MARKER.to_string(),
            list_page_size: DEFAULT_LIST_PAGE_SIZE,
            upload_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_scratch_root(mut self, scratch_root: impl Into<PathBuf>) -> Self {
        self.scratch_root = scratch_root.into();
        self
    }

    pub fn with_tiles_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.tiles_suffix = suffix.into();
        self
    }

    pub fn with_event_name_match(mut self, event_name_match: EventNameMatch) -> Self {
        self.event_name_match = event_name_match;
        self
    }

    pub fn with_markers(
        mut self,
        original_marker: impl Into<String>,
        backfill_marker: impl Into<String>,
    ) -> Self {
        self.original_marker = original_marker.into();
        self.backfill_marker = backfill_marker.into();
        self
    }

    pub fn with_list_page_size(mut self, page_size: i32) -> Self {
        self.list_page_size = page_size;
        self
    }

    pub fn with_upload_concurrency(mut self, concurrency: usize) -> Self {
        self.upload_concurrency = concurrency;
        self
    }

    /// Key matcher built from the configured markers.
    pub fn matcher(&self) -> OriginalMatcher {
        OriginalMatcher::new(self.original_marker.clone(), self.backfill_marker.clone())
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// What a tiling run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileReport {
    /// Bucket of the triggering object
    pub bucket: String,

    /// Triggering key; tiles are uploaded under it
    pub key: String,

    /// Key of the original image that was tiled
    pub original_key: String,

    /// Source dimensions
    pub width: u32,
    pub height: u32,

    /// Number of tiers produced
    pub tiers: usize,

    /// Number of tile images the tiler wrote
    pub tiles_written: u32,

    /// Number of files selected for upload
    pub planned: usize,

    /// Number of files uploaded
    pub uploaded: usize,

    /// Uploads that failed
    pub failures: Vec<UploadFailure>,

    /// Whether the scratch directory was removed
    pub scratch_removed: bool,
}

impl TileReport {
    /// True when every planned file was uploaded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.uploaded == self.planned
    }
}

/// Result of handling one notification record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TileOutcome {
    /// The record did not pass the trigger filter
    Ignored,

    /// The original is a backfill sentinel; nothing was tiled
    Skipped { key: String, original_key: String },

    /// Tiles were produced and uploaded
    Tiled(TileReport),
}

impl TileOutcome {
    /// False only for a tiling run with failed uploads.
    pub fn is_complete(&self) -> bool {
        match self {
            TileOutcome::Tiled(report) => report.is_complete(),
            TileOutcome::Ignored | TileOutcome::Skipped { .. } => true,
        }
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Runs the locate, tile, upload and cleanup sequence.
///
/// # Type Parameters
///
/// * `S` - Object storage backend
/// * `T` - Tiler producing the output tree
///
/// # Example
///
/// ```ignore
/// use zoomify_tiler::event::S3Event;
/// use zoomify_tiler::orchestrator::{OrchestratorConfig, TileOrchestrator};
/// use zoomify_tiler::tile::ZoomifyTiler;
///
/// let orchestrator = TileOrchestrator::new(store, ZoomifyTiler::new(), OrchestratorConfig::default());
/// let event = S3Event::single("ObjectCreated:Put", "bucket", "albums/7/tiles/");
/// let outcomes = orchestrator.handle_event(&event).await?;
/// ```
pub struct TileOrchestrator<S, T> {
    store: S,
    tiler: Arc<T>,
    matcher: OriginalMatcher,
    config: OrchestratorConfig,
}

impl<S, T> TileOrchestrator<S, T>
where
    S: ObjectStore,
    T: Tiler,
{
    pub fn new(store: S, tiler: T, config: OrchestratorConfig) -> Self {
        Self {
            store,
            tiler: Arc::new(tiler),
            matcher: config.matcher(),
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Handle every record of a notification document in order.
    ///
    /// Stops at the first record that fails.
    pub async fn handle_event(&self, event: &S3Event) -> Result<Vec<TileOutcome>, ProcessError> {
        let mut outcomes = Vec::with_capacity(event.records.len());
        for record in &event.records {
            outcomes.push(self.handle_record(record).await?);
        }
        Ok(outcomes)
    }

    /// Handle a single notification record.
    pub async fn handle_record(&self, record: &S3EventRecord) -> Result<TileOutcome, ProcessError> {
        info!(
            event_name = %record.event_name,
            bucket = record.bucket_name().unwrap_or_default(),
            key = record.raw_key().unwrap_or_default(),
            "Received notification record"
        );

        match TileTrigger::from_record_with(
            record,
            &self.config.tiles_suffix,
            self.config.event_name_match,
        ) {
            Some(trigger) => self.process(&trigger).await,
            None => {
                debug!("Record does not request tiling, ignoring");
                Ok(TileOutcome::Ignored)
            }
        }
    }

    /// Run the full sequence for an accepted trigger.
    ///
    /// The scratch directory is removed whether tiling succeeds or not.
    pub async fn process(&self, trigger: &TileTrigger) -> Result<TileOutcome, ProcessError> {
        self.run(trigger).await.map_err(|e| {
            error!(
                bucket = trigger.bucket(),
                key = trigger.key(),
                error = %e,
                "Tiling failed"
            );
            e
        })
    }

    async fn run(&self, trigger: &TileTrigger) -> Result<TileOutcome, ProcessError> {
        let bucket = trigger.bucket();

        let lookup = locate_original(
            &self.store,
            bucket,
            trigger.images_prefix(),
            &self.matcher,
            self.config.list_page_size,
        )
        .await?;

        let original = match lookup {
            OriginalLookup::Proceed(entry) => entry,
            OriginalLookup::Skip(entry) => {
                info!(
                    bucket = bucket,
                    original = %entry.key,
                    "Original is a backfill, skipping"
                );
                return Ok(TileOutcome::Skipped {
                    key: trigger.key().to_string(),
                    original_key: entry.key,
                });
            }
        };

        let source = self
            .store
            .get_object(bucket, &original.key)
            .await?;

        let scratch = ScratchDir::create(&self.config.scratch_root, trigger.scratch_name())
            .map_err(|e| ProcessError::Scratch {
                path: self.config.scratch_root.display().to_string(),
                message: e.to_string(),
            })?;

        let (scratch, tiled) = self.tile_in_scratch(trigger.key(), source, scratch).await;
        let result = match tiled {
            Ok(tiled) => Ok(self.upload_tiles(trigger, &original.key, tiled).await),
            Err(e) => Err(e),
        };

        // A tiler panic drops the scratch directory while unwinding
        let scratch_removed = match scratch {
            Some(scratch) => scratch.remove().await,
            None => false,
        };

        let mut report = result?;
        report.scratch_removed = scratch_removed;

        if report.is_complete() {
            info!(
                bucket = bucket,
                key = trigger.key(),
                uploaded = report.uploaded,
                "Tiling complete"
            );
        } else {
            warn!(
                bucket = bucket,
                key = trigger.key(),
                uploaded = report.uploaded,
                failed = report.failures.len(),
                "Tiling finished with failed uploads"
            );
        }

        Ok(TileOutcome::Tiled(report))
    }

    /// Tile `source` into the scratch directory and plan the uploads.
    ///
    /// Both steps run on the blocking pool, which takes ownership of the scratch
    /// directory and hands it back. If the caller is dropped mid-tile, the
    /// directory is deleted once the tiler returns instead of being left behind
    /// for a tiler that is still writing.
    async fn tile_in_scratch(
        &self,
        key_prefix: &str,
        source: Bytes,
        scratch: ScratchDir,
    ) -> (Option<ScratchDir>, Result<TiledOutput, ProcessError>) {
        let tiler = Arc::clone(&self.tiler);
        let key_prefix = key_prefix.to_string();

        let task = tokio::task::spawn_blocking(move || {
            let output = scratch.tile_root();
            let result = tiler
                .tile(&source, &output)
                .map_err(ProcessError::from)
                .and_then(|summary| {
                    let items = plan_uploads(&output, &key_prefix).map_err(|e| {
                        ProcessError::Scratch {
                            path: output.display().to_string(),
                            message: e.to_string(),
                        }
                    })?;
                    Ok(TiledOutput { summary, items })
                });
            (scratch, result)
        });

        match task.await {
            Ok((scratch, result)) => (Some(scratch), result),
            Err(e) => (None, Err(TileError::Task(e.to_string()).into())),
        }
    }

    async fn upload_tiles(
        &self,
        trigger: &TileTrigger,
        original_key: &str,
        tiled: TiledOutput,
    ) -> TileReport {
        let TiledOutput { summary, items } = tiled;

        debug!(
            tiers = summary.tiers,
            tiles = summary.tiles,
            planned = items.len(),
            "Tiled {}x{} image",
            summary.width,
            summary.height
        );

        let planned = items.len();
        let uploads = upload_all(
            &self.store,
            trigger.bucket(),
            items,
            self.config.upload_concurrency,
        )
        .await;

        TileReport {
            bucket: trigger.bucket().to_string(),
            key: trigger.key().to_string(),
            original_key: original_key.to_string(),
            width: summary.width,
            height: summary.height,
            tiers: summary.tiers,
            tiles_written: summary.tiles,
            planned,
            uploaded: uploads.uploaded,
            failures: uploads.failures,
            scratch_removed: false,
        }
    }
}

/// Result of the blocking tile-and-plan stage.
struct TiledOutput {
    summary: TileSummary,
    items: Vec<UploadItem>,
}
