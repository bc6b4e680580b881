use serde::{Deserialize, Serialize};

/// An S3 event notification document.
///
/// Every field is optional on the wire: records of other shapes deserialize
/// into empty values and are later ignored by the trigger filter.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

impl S3Event {
    /// Parse a notification document from JSON text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse a notification document from raw bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Build a single-record document.
    pub fn single(
        event_name: impl Into<String>,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            records: vec![S3EventRecord::new(event_name, bucket, key)],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct S3EventRecord {
    #[serde(rename = "eventName", default)]
    pub event_name: String,

    #[serde(default)]
    pub s3: Option<S3Entity>,
}

impl S3EventRecord {
    pub fn new(
        event_name: impl Into<String>,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            event_name: event_name.into(),
            s3: Some(S3Entity {
                bucket: S3Bucket { name: bucket.into() },
                object: S3Object {
                    key: key.into(),
                    size: None,
                },
            }),
        }
    }

    /// Raw (still URL-encoded) object key, if present.
    pub fn raw_key(&self) -> Option<&str> {
        self.s3.as_ref().map(|s3| s3.object.key.as_str())
    }

    /// Bucket name, if present.
    pub fn bucket_name(&self) -> Option<&str> {
        self.s3.as_ref().map(|s3| s3.bucket.name.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct S3Entity {
    #[serde(default)]
    pub bucket: S3Bucket,

    #[serde(default)]
    pub object: S3Object,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct S3Bucket {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct S3Object {
    #[serde(default)]
    pub key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}
