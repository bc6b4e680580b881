//! Bucket notification handling.
//!
//! This module models the S3 event notification document and decides which
//! records should start a tiling run.
//!
//! # Trigger Rules
//!
//! A record starts a run only when:
//! - its event name is `ObjectCreated:Put` (an `s3:` prefix is tolerated), and
//! - its (URL-decoded) object key ends with the tiles suffix, `/tiles/` by default.
//!
//! Everything else is ignored without error.
//!
//! # Example
//!
//! ```
//! use zoomify_tiler::event::{S3Event, TileTrigger, DEFAULT_TILES_SUFFIX};
//!
//! let json = r#"{"Records":[{"eventName":"ObjectCreated:Put",
//!     "s3":{"bucket":{"name":"photos"},"object":{"key":"albums/7/tiles/"}}}]}"#;
//! let event = S3Event::from_json(json).unwrap();
//!
//! let trigger = TileTrigger::from_record(&event.records[0], DEFAULT_TILES_SUFFIX).unwrap();
//! assert_eq!(trigger.images_prefix(), "albums/7/");
//! assert_eq!(trigger.scratch_name(), "7");
//! ```

mod notification;
mod trigger;

pub use notification::{S3Bucket, S3Entity, S3Event, S3EventRecord, S3Object};
pub use trigger::{
    decode_object_key, is_object_created_put, EventNameMatch, TileTrigger, DEFAULT_TILES_SUFFIX,
    OBJECT_CREATED_PUT,
};
