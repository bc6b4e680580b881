mod object_store;
mod s3_store;
mod scratch;

pub use object_store::{ObjectEntry, ObjectStore};
pub use s3_store::{create_s3_client, S3ObjectStore};
pub use scratch::{ScratchDir, TILE_OUTPUT_DIR};
