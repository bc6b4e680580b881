//! Tiler trait and the Zoomify implementation.

use std::collections::HashSet;
use std::path::Path;

use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

use super::encoder::{decode_image, PngTileEncoder};
use super::layout::{ZoomifyLayout, DEFAULT_TILE_SIZE, PROPERTIES_FILE};
use crate::error::TileError;

/// What a tiling run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSummary {
    /// Source width in pixels
    pub width: u32,

    /// Source height in pixels
    pub height: u32,

    /// Number of tiers written
    pub tiers: usize,

    /// Number of tile images written
    pub tiles: u32,
}

/// Turns raw image bytes into a tile set on local disk.
///
/// Tiling is CPU bound and synchronous; callers run it on a blocking thread.
pub trait Tiler: Send + Sync + 'static {
    /// Decode `source` and write the tile set into `output`.
    ///
    /// `output` is created if it does not exist.
    fn tile(&self, source: &[u8], output: &Path) -> Result<TileSummary, TileError>;
}

/// Zoomify tiler built on the `image` crate.
///
/// Produces `ImageProperties.xml` plus `TileGroup{n}/{tier}-{x}-{y}.png` tiles.
///
/// # Example
///
/// ```ignore
/// use zoomify_tiler::tile::{Tiler, ZoomifyTiler};
///
/// let tiler = ZoomifyTiler::new();
/// let summary = tiler.tile(&source_bytes, Path::new("/tmp/out/tiled"))?;
/// println!("{} tiles in {} tiers", summary.tiles, summary.tiers);
/// ```
#[derive(Debug, Clone)]
pub struct ZoomifyTiler {
    tile_size: u32,
    encoder: PngTileEncoder,
}

impl Default for ZoomifyTiler {
    fn default() -> Self {
        Self::new()
    }
}

impl ZoomifyTiler {
    /// Create a tiler with 256px tiles.
    pub fn new() -> Self {
        Self::with_tile_size(DEFAULT_TILE_SIZE)
    }

    /// Create a tiler with a custom tile size.
    pub fn with_tile_size(tile_size: u32) -> Self {
        Self {
            tile_size: tile_size.max(1),
            encoder: PngTileEncoder::new(),
        }
    }

    /// Use a custom PNG encoder.
    pub fn with_encoder(mut self, encoder: PngTileEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Tile edge length in pixels.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Tile an already decoded image.
    pub fn tile_image(&self, image: DynamicImage, output: &Path) -> Result<TileSummary, TileError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(TileError::EmptyImage { width, height });
        }

        let layout = ZoomifyLayout::new(width, height, self.tile_size);
        create_dir(output)?;

        let mut created_groups = HashSet::new();
        let mut current = PngTileEncoder::normalize(image);
        let mut written = 0u32;

        // Work from full resolution down, each tier resampled from the one above
        for (tier_index, tier) in layout.tiers().iter().enumerate().rev() {
            if current.width() != tier.width || current.height() != tier.height {
                current = current.resize_exact(tier.width, tier.height, FilterType::Triangle);
            }

            for y in 0..tier.tiles_y {
                for x in 0..tier.tiles_x {
                    let (Some(group), Some((left, top, w, h))) = (
                        layout.tile_group(tier_index, x, y),
                        layout.tile_bounds(tier_index, x, y),
                    ) else {
                        continue;
                    };

                    let group_dir = output.join(format!("TileGroup{}", group));
                    if created_groups.insert(group) {
                        create_dir(&group_dir)?;
                    }

                    let tile = current.crop_imm(left, top, w, h);
                    let data = self.encoder.encode(&tile)?;

                    let path = group_dir.join(format!("{}-{}-{}.png", tier_index, x, y));
                    write_file(&path, &data)?;
                    written += 1;
                }
            }

            debug!(
                tier = tier_index,
                width = tier.width,
                height = tier.height,
                tiles = tier.tile_count(),
                "Wrote tier"
            );
        }

        write_file(
            &output.join(PROPERTIES_FILE),
            layout.properties_xml().as_bytes(),
        )?;

        Ok(TileSummary {
            width,
            height,
            tiers: layout.tier_count(),
            tiles: written,
        })
    }
}

impl Tiler for ZoomifyTiler {
    fn tile(&self, source: &[u8], output: &Path) -> Result<TileSummary, TileError> {
        let image = decode_image(source)?;
        self.tile_image(image, output)
    }
}

fn create_dir(path: &Path) -> Result<(), TileError> {
    std::fs::create_dir_all(path).map_err(|e| TileError::Write {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn write_file(path: &Path, data: &[u8]) -> Result<(), TileError> {
    std::fs::write(path, data).map_err(|e| TileError::Write {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
