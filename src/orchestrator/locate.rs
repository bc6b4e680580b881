//! Locating the original image next to a tiles marker.

use tracing::{debug, info};

use crate::error::ProcessError;
use crate::io::{ObjectEntry, ObjectStore};

/// Substring that marks the original upload of an image.
pub const DEFAULT_ORIGINAL_MARKER: &str = "original-";

/// Substring that marks a backfilled original, which must not be tiled.
pub const DEFAULT_BACKFILL_MARKER: &str = "backfill-original";

/// Number of keys requested when listing the images prefix.
pub const DEFAULT_LIST_PAGE_SIZE: i32 = 5;

/// Result of looking for the original image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginalLookup {
    /// Tile this object
    Proceed(ObjectEntry),

    /// The match is a backfill sentinel: finish successfully without tiling
    Skip(ObjectEntry),
}

impl OriginalLookup {
    /// The matched entry, whichever way the lookup went.
    pub fn entry(&self) -> &ObjectEntry {
        match self {
            OriginalLookup::Proceed(entry) | OriginalLookup::Skip(entry) => entry,
        }
    }
}

/// Key-based rules for recognizing original and backfill objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalMatcher {
    original_marker: String,
    backfill_marker: String,
}

impl Default for OriginalMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_ORIGINAL_MARKER, DEFAULT_BACKFILL_MARKER)
    }
}

impl OriginalMatcher {
    pub fn new(original_marker: impl Into<String>, backfill_marker: impl Into<String>) -> Self {
        Self {
            original_marker: original_marker.into(),
            backfill_marker: backfill_marker.into(),
        }
    }

    pub fn is_original(&self, key: &str) -> bool {
        key.contains(&self.original_marker)
    }

    pub fn is_backfill(&self, key: &str) -> bool {
        !self.backfill_marker.is_empty() && key.contains(&self.backfill_marker)
    }

    /// Pick the first original in listing order and classify it.
    ///
    /// Returns `None` when no entry carries the original marker.
    pub fn select(&self, entries: &[ObjectEntry]) -> Option<OriginalLookup> {
        let entry = entries.iter().find(|e| self.is_original(&e.key))?.clone();

        if self.is_backfill(&entry.key) {
            Some(OriginalLookup::Skip(entry))
        } else {
            Some(OriginalLookup::Proceed(entry))
        }
    }
}

/// List `prefix` in `bucket` and find the original image.
///
/// The prefix itself is passed as the start-after marker so a folder
/// placeholder object equal to the prefix is never returned. Only the first
/// `page_size` keys are considered.
pub async fn locate_original<S>(
    store: &S,
    bucket: &str,
    prefix: &str,
    matcher: &OriginalMatcher,
    page_size: i32,
) -> Result<OriginalLookup, ProcessError>
where
    S: ObjectStore + ?Sized,
{
    debug!(bucket = bucket, prefix = prefix, "Looking for original image");

    let entries = store
        .list_objects(bucket, prefix, Some(prefix), page_size)
        .await?;

    let lookup = matcher
        .select(&entries)
        .ok_or_else(|| ProcessError::OriginalNotFound {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
        })?;

    info!(
        bucket = bucket,
        key = %lookup.entry().key,
        skip = matches!(lookup, OriginalLookup::Skip(_)),
        "Found original image"
    );

    Ok(lookup)
}
