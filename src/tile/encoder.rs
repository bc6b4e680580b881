//! Source decoding and PNG tile encoding.
//!
//! # Design Decisions
//!
//! - **Format auto-detection**: The source is decoded by sniffing its magic
//!   bytes, the object key's extension is never trusted.
//!
//! - **Lossless tiles**: Tiles are always written as PNG. Pixel formats PNG
//!   cannot carry (floating point) are converted to 8-bit first.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ColorType, DynamicImage, ImageReader};

use crate::error::TileError;

/// Decode a source image, detecting its format from the content.
pub fn decode_image(source: &[u8]) -> Result<DynamicImage, TileError> {
    let reader = ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| TileError::Decode {
            message: e.to_string(),
        })?;

    if reader.format().is_none() {
        return Err(TileError::Decode {
            message: "unrecognized image format".to_string(),
        });
    }

    reader.decode().map_err(|e| TileError::Decode {
        message: e.to_string(),
    })
}

/// PNG encoder for tiles.
#[derive(Debug, Clone)]
pub struct PngTileEncoder {
    compression: CompressionType,
}

impl Default for PngTileEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PngTileEncoder {
    /// Create an encoder with default compression.
    pub fn new() -> Self {
        Self {
            compression: CompressionType::Default,
        }
    }

    /// Create an encoder that favors speed over size.
    pub fn fast() -> Self {
        Self {
            compression: CompressionType::Fast,
        }
    }

    /// Encode an image (usually one tile) as PNG.
    pub fn encode(&self, image: &DynamicImage) -> Result<Bytes, TileError> {
        let mut output = Vec::new();
        let encoder =
            PngEncoder::new_with_quality(&mut output, self.compression, FilterType::Adaptive);

        image
            .write_with_encoder(encoder)
            .map_err(|e| TileError::Encode {
                message: e.to_string(),
            })?;

        Ok(Bytes::from(output))
    }

    /// Convert an image to a pixel format PNG can store, if needed.
    pub fn normalize(image: DynamicImage) -> DynamicImage {
        match image.color() {
            ColorType::L8
            | ColorType::La8
            | ColorType::Rgb8
            | ColorType::Rgba8
            | ColorType::L16
            | ColorType::La16
            | ColorType::Rgb16
            | ColorType::Rgba16 => image,
            color if color.has_alpha() => DynamicImage::ImageRgba8(image.to_rgba8()),
            _ => DynamicImage::ImageRgb8(image.to_rgb8()),
        }
    }
}
