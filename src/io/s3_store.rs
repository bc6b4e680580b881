use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::debug;

use super::object_store::{ObjectEntry, ObjectStore};
use crate::error::IoError;

/// S3-backed implementation of [`ObjectStore`].
///
/// Works against AWS S3 and S3-compatible services (MinIO, etc.). The bucket
/// is chosen per call because it comes from the notification being handled.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Wrap an existing S3 client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Get the underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        start_after: Option<&str>,
        max_keys: i32,
    ) -> Result<Vec<ObjectEntry>, IoError> {
        let mut request = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .max_keys(max_keys);

        if let Some(marker) = start_after {
            request = request.start_after(marker);
        }

        let result = request
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &format!("s3://{}/{}", bucket, prefix)))?;

        let entries: Vec<ObjectEntry> = result
            .contents()
            .iter()
            .filter_map(|obj| {
                obj.key().map(|key| ObjectEntry {
                    key: key.to_string(),
                    size: obj.size().unwrap_or(0).max(0) as u64,
                    etag: obj.e_tag().map(|t| t.to_string()),
                })
            })
            .collect();

        debug!(
            bucket = bucket,
            prefix = prefix,
            count = entries.len(),
            "Listed objects"
        );

        Ok(entries)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, IoError> {
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &format!("s3://{}/{}", bucket, key)))?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| IoError::Connection(e.to_string()))?
            .into_bytes();

        Ok(data)
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), IoError> {
        let mut request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body));

        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }

        request
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &format!("s3://{}/{}", bucket, key)))?;

        Ok(())
    }
}

/// Classify an SDK error into an [`IoError`].
///
/// Not-found detection tries the modeled error code first, then the raw HTTP
/// status, then falls back to the rendered message.
fn map_sdk_error<E>(err: SdkError<E, HttpResponse>, location: &str) -> IoError
where
    E: std::error::Error + ProvideErrorMetadata + Send + Sync + 'static,
{
    if matches!(
        err,
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_)
    ) {
        return IoError::Connection(DisplayErrorContext(&err).to_string());
    }

    let code_is_not_found = err
        .as_service_error()
        .and_then(|se| se.code())
        .map(|code| matches!(code, "NoSuchKey" | "NotFound" | "NoSuchBucket"))
        .unwrap_or(false);

    if code_is_not_found {
        return IoError::NotFound(location.to_string());
    }

    let status_is_404 = err
        .raw_response()
        .map(|r| r.status().as_u16() == 404)
        .unwrap_or(false);

    if status_is_404 {
        return IoError::NotFound(location.to_string());
    }

    let err_str = DisplayErrorContext(&err).to_string();
    if err_str.contains("NoSuchKey") || err_str.contains("NoSuchBucket") {
        return IoError::NotFound(location.to_string());
    }

    IoError::S3(err_str)
}

/// Create an S3 client with optional custom endpoint and region.
///
/// Use a custom endpoint for S3-compatible services like MinIO:
/// ```ignore
/// let client = create_s3_client(Some("http://localhost:9000"), "us-east-1").await;
/// ```
///
/// For AWS S3, pass `None` to use the default endpoint:
/// ```ignore
/// let client = create_s3_client(None, "us-east-1").await;
/// ```
pub async fn create_s3_client(endpoint_url: Option<&str>, region: &str) -> Client {
    let region = aws_config::Region::new(region.to_string());
    let mut config_loader =
        aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

    if let Some(endpoint) = endpoint_url {
        config_loader = config_loader.endpoint_url(endpoint);
    }

    let sdk_config = config_loader.load().await;

    // S3-compatible services usually need path-style addressing
    let s3_config = if endpoint_url.is_some() {
        aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build()
    } else {
        aws_sdk_s3::config::Builder::from(&sdk_config).build()
    };

    Client::from_conf(s3_config)
}
