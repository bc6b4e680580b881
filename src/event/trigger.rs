use std::borrow::Cow;

use super::notification::S3EventRecord;

/// Event name of a plain object upload.
pub const OBJECT_CREATED_PUT: &str = "ObjectCreated:Put";

/// Key suffix of the marker object that requests tiling.
pub const DEFAULT_TILES_SUFFIX: &str = "/tiles/";

/// How notification event names are matched against [`OBJECT_CREATED_PUT`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EventNameMatch {
    /// Only the exact name `ObjectCreated:Put`
    Exact,

    /// Also accept `s3:ObjectCreated:Put`, as sent by MinIO and EventBridge
    #[default]
    AllowS3Prefix,
}

impl EventNameMatch {
    /// Check an event name under this rule.
    pub fn matches(self, event_name: &str) -> bool {
        let name = match self {
            EventNameMatch::Exact => event_name,
            EventNameMatch::AllowS3Prefix => event_name.strip_prefix("s3:").unwrap_or(event_name),
        };
        name == OBJECT_CREATED_PUT
    }
}

/// A notification record that passed the trigger filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileTrigger {
    bucket: String,
    key: String,
    images_prefix_len: usize,
}

impl TileTrigger {
    /// Apply the trigger filter to a notification record.
    ///
    /// Returns `None` for anything that should be ignored: other event names,
    /// keys without the tiles suffix, or records without a bucket. Event names
    /// may carry an `s3:` prefix; use [`TileTrigger::from_record_with`] for an
    /// exact match.
    pub fn from_record(record: &S3EventRecord, tiles_suffix: &str) -> Option<Self> {
        Self::from_record_with(record, tiles_suffix, EventNameMatch::AllowS3Prefix)
    }

    /// Apply the trigger filter with an explicit event name rule.
    pub fn from_record_with(
        record: &S3EventRecord,
        tiles_suffix: &str,
        event_names: EventNameMatch,
    ) -> Option<Self> {
        if !event_names.matches(&record.event_name) {
            return None;
        }

        let s3 = record.s3.as_ref()?;
        let key = decode_object_key(&s3.object.key);

        Self::new(s3.bucket.name.clone(), key.into_owned(), tiles_suffix)
    }

    /// Build a trigger for an already decoded key.
    ///
    /// Returns `None` if the key does not end with `tiles_suffix` or the bucket
    /// name is empty.
    pub fn new(bucket: String, key: String, tiles_suffix: &str) -> Option<Self> {
        if bucket.is_empty() || tiles_suffix.is_empty() || !key.ends_with(tiles_suffix) {
            return None;
        }

        // "a/b/tiles/" keeps its slash before "tiles/": the prefix is "a/b/"
        let tail = tiles_suffix.trim_start_matches('/');
        let images_prefix_len = key.len() - tail.len();

        Some(Self {
            bucket,
            key,
            images_prefix_len,
        })
    }

    /// Bucket that received the marker object.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Decoded key of the marker object. Tiles are uploaded under this key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Prefix shared by the marker and its sibling image objects.
    pub fn images_prefix(&self) -> &str {
        &self.key[..self.images_prefix_len]
    }

    /// Last path segment of the images prefix, used to name scratch space.
    pub fn scratch_name(&self) -> &str {
        self.images_prefix()
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or("")
    }
}

/// Check an event name against `ObjectCreated:Put`, tolerating an `s3:` prefix.
pub fn is_object_created_put(event_name: &str) -> bool {
    EventNameMatch::AllowS3Prefix.matches(event_name)
}

/// Decode an object key as it appears in a notification.
///
/// Keys are form-encoded: spaces arrive as `+` and other characters
/// percent-encoded. Keys that fail to decode are returned unchanged.
pub fn decode_object_key(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['+', '%']) {
        return Cow::Borrowed(raw);
    }

    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => Cow::Owned(decoded.into_owned()),
        Err(_) => Cow::Borrowed(raw),
    }
}
