//! Per-invocation scratch directories.
//!
//! Every invocation gets its own directory under the scratch root, named after
//! the images prefix it works on plus a random suffix. The directory is removed
//! when the invocation ends, whether it succeeded or not.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

/// Name of the tile output directory inside a scratch directory.
pub const TILE_OUTPUT_DIR: &str = "tiled";

/// Fallback name used when the derived scratch name is empty.
const DEFAULT_SCRATCH_NAME: &str = "scratch";

/// An ephemeral local directory owned by one invocation.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create a new scratch directory under `root`.
    ///
    /// `root` is created if missing. `name` becomes the directory name prefix.
    pub fn create(root: &Path, name: &str) -> io::Result<Self> {
        std::fs::create_dir_all(root)?;

        let name = if name.is_empty() {
            DEFAULT_SCRATCH_NAME
        } else {
            name
        };

        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-", name))
            .tempdir_in(root)?;

        debug!(path = %dir.path().display(), "Created scratch directory");

        Ok(Self { dir })
    }

    /// Path of the scratch directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Directory the tiler writes its output into.
    pub fn tile_root(&self) -> PathBuf {
        self.dir.path().join(TILE_OUTPUT_DIR)
    }

    /// Delete the scratch directory tree on the blocking pool.
    ///
    /// Same contract as [`ScratchDir::cleanup`]. The deletion runs to
    /// completion even if the calling future is dropped.
    pub async fn remove(self) -> bool {
        let path = self.dir.path().to_path_buf();

        match tokio::task::spawn_blocking(move || self.cleanup()).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Scratch cleanup task failed"
                );
                tokio::fs::metadata(&path).await.is_err()
            }
        }
    }

    /// Delete the scratch directory tree.
    ///
    /// Blocks on filesystem calls; prefer [`ScratchDir::remove`] from async code.
    /// Failures are logged and swallowed so they never mask the outcome of the
    /// invocation. Returns `true` when the directory is gone afterwards.
    pub fn cleanup(self) -> bool {
        let path = self.dir.path().to_path_buf();

        match self.dir.close() {
            Ok(()) => {
                debug!(path = %path.display(), "Deleted scratch directory");
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to delete scratch directory"
                );
                !path.exists()
            }
        }
    }
}
