//! Upload planning and execution.
//!
//! Planning is a pure walk of the tile output tree: it returns every file to
//! upload together with its destination key and touches no storage. Execution
//! then uploads the planned files concurrently and reports each failure.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, warn};

use crate::io::ObjectStore;

/// File name suffixes that are uploaded. Everything else is skipped.
pub const UPLOAD_EXTENSIONS: &[&str] = &[".xml", ".png"];

/// Default number of uploads in flight per invocation.
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 16;

/// A local file and the key it will be uploaded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadItem {
    pub path: PathBuf,
    pub key: String,
}

/// An upload that did not make it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadFailure {
    pub key: String,
    pub message: String,
}

/// Aggregate result of [`upload_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSummary {
    /// Number of objects written
    pub uploaded: usize,

    /// Failed uploads, in completion order
    pub failures: Vec<UploadFailure>,
}

/// Check whether a file name qualifies for upload.
pub fn is_upload_candidate(file_name: &str) -> bool {
    UPLOAD_EXTENSIONS
        .iter()
        .any(|ext| file_name.ends_with(ext))
}

/// Content type to send for an uploaded key.
pub fn content_type_for(key: &str) -> Option<&'static str> {
    if key.ends_with(".png") {
        Some("image/png")
    } else if key.ends_with(".xml") {
        Some("application/xml")
    } else {
        None
    }
}

/// Build a destination key from a key prefix and a path relative to the tile root.
///
/// Path components are joined with `/` regardless of the platform separator.
pub fn destination_key(key_prefix: &str, relative: &Path) -> String {
    let mut key = key_prefix.to_string();
    let mut first = true;
    for component in relative.components() {
        if !first {
            key.push('/');
        }
        key.push_str(&component.as_os_str().to_string_lossy());
        first = false;
    }
    key
}

/// Walk `root` depth-first and plan an upload for every qualifying file.
///
/// Entries are visited in name order so the plan is deterministic. Only
/// regular files are considered; symlinks and other special files are skipped.
/// Reads the filesystem synchronously, so async callers run it on the blocking pool.
pub fn plan_uploads(root: &Path, key_prefix: &str) -> std::io::Result<Vec<UploadItem>> {
    let mut items = Vec::new();
    walk(root, root, key_prefix, &mut items)?;
    Ok(items)
}

fn walk(
    dir: &Path,
    root: &Path,
    key_prefix: &str,
    items: &mut Vec<UploadItem>,
) -> std::io::Result<()> {
    let mut entries = std::fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            walk(&path, root, key_prefix, items)?;
        } else if file_type.is_file() && is_upload_candidate(&entry.file_name().to_string_lossy())
        {
            let relative = path.strip_prefix(root).unwrap_or(&path);
            let key = destination_key(key_prefix, relative);
            items.push(UploadItem { path, key });
        }
    }

    Ok(())
}

/// Upload every planned item to `bucket`, at most `concurrency` at a time.
///
/// All uploads are attempted; there is no ordering guarantee and no rollback
/// when some of them fail.
pub async fn upload_all<S>(
    store: &S,
    bucket: &str,
    items: Vec<UploadItem>,
    concurrency: usize,
) -> UploadSummary
where
    S: ObjectStore + ?Sized,
{
    let results: Vec<Result<String, UploadFailure>> = stream::iter(items)
        .map(|item| async move { upload_one(store, bucket, item).await })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut summary = UploadSummary::default();
    for result in results {
        match result {
            Ok(_) => summary.uploaded += 1,
            Err(failure) => summary.failures.push(failure),
        }
    }
    summary
}

async fn upload_one<S>(store: &S, bucket: &str, item: UploadItem) -> Result<String, UploadFailure>
where
    S: ObjectStore + ?Sized,
{
    let data = tokio::fs::read(&item.path).await.map_err(|e| {
        warn!(path = %item.path.display(), error = %e, "Failed to read tile");
        UploadFailure {
            key: item.key.clone(),
            message: format!("read {}: {}", item.path.display(), e),
        }
    })?;

    store
        .put_object(bucket, &item.key, Bytes::from(data), content_type_for(&item.key))
        .await
        .map_err(|e| {
            warn!(bucket = bucket, key = %item.key, error = %e, "Failed to upload tile");
            UploadFailure {
                key: item.key.clone(),
                message: e.to_string(),
            }
        })?;

    debug!(bucket = bucket, key = %item.key, "Uploaded");
    Ok(item.key)
}
