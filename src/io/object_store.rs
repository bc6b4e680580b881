use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::IoError;

/// One entry returned by a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    /// Full object key
    pub key: String,

    /// Object size in bytes (0 when the service does not report it)
    pub size: u64,

    /// Entity tag, if reported
    pub etag: Option<String>,
}

impl ObjectEntry {
    /// Create an entry with only a key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size: 0,
            etag: None,
        }
    }

    /// Set the object size.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }
}

/// Minimal object-storage surface used by the tile orchestrator.
///
/// The orchestrator never talks to S3 directly; everything goes through this
/// trait so that storage can be swapped for an in-memory store in tests.
/// Implementations must be thread-safe, uploads are issued concurrently.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List at most `max_keys` objects under `prefix`, in key order.
    ///
    /// When `start_after` is set, only keys strictly greater than it are
    /// returned. Only the first page is fetched.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        start_after: Option<&str>,
        max_keys: i32,
    ) -> Result<Vec<ObjectEntry>, IoError>;

    /// Download the full body of an object.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, IoError>;

    /// Upload `body` to `key`, replacing any existing object.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), IoError>;
}

#[async_trait]
impl<T: ObjectStore + ?Sized> ObjectStore for Arc<T> {
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        start_after: Option<&str>,
        max_keys: i32,
    ) -> Result<Vec<ObjectEntry>, IoError> {
        (**self)
            .list_objects(bucket, prefix, start_after, max_keys)
            .await
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, IoError> {
        (**self).get_object(bucket, key).await
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), IoError> {
        (**self).put_object(bucket, key, body, content_type).await
    }
}
