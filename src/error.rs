use thiserror::Error;

/// I/O errors that can occur when talking to object storage
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Error from S3 or S3-compatible storage
    #[error("S3 error: {0}")]
    S3(String),

    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Object not found
    #[error("Object not found: {0}")]
    NotFound(String),
}

/// Errors raised while turning a source image into a tile pyramid
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// The source bytes could not be decoded as an image
    #[error("Failed to decode source image: {message}")]
    Decode { message: String },

    /// A tile could not be encoded
    #[error("Failed to encode tile: {message}")]
    Encode { message: String },

    /// The decoded image has a zero dimension
    #[error("Source image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// Writing tile output to local disk failed
    #[error("Failed to write {path}: {message}")]
    Write { path: String, message: String },

    /// The blocking tiling task panicked or was cancelled
    #[error("Tiling task failed: {0}")]
    Task(String),
}

/// Errors that fail a whole tiling invocation.
///
/// Upload failures for individual files are not represented here; they are
/// collected into the invocation report instead.
#[derive(Debug, Clone, Error)]
pub enum ProcessError {
    /// No object under the images prefix carries the original marker
    #[error("No original image found under s3://{bucket}/{prefix}")]
    OriginalNotFound { bucket: String, prefix: String },

    /// Listing or downloading from storage failed
    #[error("Storage error: {0}")]
    Storage(#[from] IoError),

    /// The tiler failed
    #[error("Tiling error: {0}")]
    Tiling(#[from] TileError),

    /// The scratch directory could not be prepared or walked
    #[error("Scratch directory error at {path}: {message}")]
    Scratch { path: String, message: String },
}
