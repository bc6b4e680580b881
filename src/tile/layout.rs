//! Zoomify pyramid layout.
//!
//! Zoomify numbers its tiers from the lowest resolution up:
//! - Tier 0 = the smallest image that fits in a single tile
//! - Last tier = full resolution
//!
//! Each tier is half the size of the next one (rounded up). Tiles inside a
//! tier are numbered row-major, and tiles are counted across tiers in tier
//! order to produce a global index. Every 256 consecutive tiles share one
//! `TileGroup{n}` directory.

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Smallest accepted tile edge length.
pub const MIN_TILE_SIZE: u32 = 16;

/// Largest accepted tile edge length.
pub const MAX_TILE_SIZE: u32 = 4096;

/// Number of tiles stored per `TileGroup` directory.
pub const TILES_PER_GROUP: u32 = 256;

/// Name of the descriptor file at the root of a tile set.
pub const PROPERTIES_FILE: &str = "ImageProperties.xml";

/// One resolution level of the pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tier {
    /// Width of this tier in pixels
    pub width: u32,

    /// Height of this tier in pixels
    pub height: u32,

    /// Number of tile columns
    pub tiles_x: u32,

    /// Number of tile rows
    pub tiles_y: u32,

    /// Global index of this tier's first tile
    pub first_tile: u32,
}

impl Tier {
    /// Number of tiles in this tier.
    pub fn tile_count(&self) -> u32 {
        self.tiles_x * self.tiles_y
    }
}

/// Tier and tile geometry for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoomifyLayout {
    width: u32,
    height: u32,
    tile_size: u32,
    tiers: Vec<Tier>,
}

impl ZoomifyLayout {
    /// Compute the layout for an image of `width` x `height` pixels.
    ///
    /// A `tile_size` of 0 is treated as 1.
    pub fn new(width: u32, height: u32, tile_size: u32) -> Self {
        let tile_size = tile_size.max(1);

        // Full resolution first, then halve until everything fits in one tile
        let mut sizes = vec![(width, height)];
        let (mut w, mut h) = (width, height);
        while w > tile_size || h > tile_size {
            w = w.div_ceil(2);
            h = h.div_ceil(2);
            sizes.push((w, h));
        }
        sizes.reverse();

        let mut tiers = Vec::with_capacity(sizes.len());
        let mut first_tile = 0u32;
        for (w, h) in sizes {
            let tier = Tier {
                width: w,
                height: h,
                tiles_x: w.div_ceil(tile_size),
                tiles_y: h.div_ceil(tile_size),
                first_tile,
            };
            first_tile += tier.tile_count();
            tiers.push(tier);
        }

        Self {
            width,
            height,
            tile_size,
            tiers,
        }
    }

    /// Full-resolution width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Full-resolution height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Tile edge length in pixels.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// All tiers, lowest resolution first.
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// Number of tiers.
    pub fn tier_count(&self) -> usize {
        self.tiers.len()
    }

    /// Get a tier by index.
    pub fn tier(&self, tier: usize) -> Option<&Tier> {
        self.tiers.get(tier)
    }

    /// Total number of tiles across all tiers.
    pub fn tile_count(&self) -> u32 {
        self.tiers.iter().map(Tier::tile_count).sum()
    }

    /// Number of `TileGroup` directories the tile set needs.
    pub fn group_count(&self) -> u32 {
        self.tile_count().div_ceil(TILES_PER_GROUP)
    }

    /// Global index of a tile, counting across tiers.
    pub fn tile_index(&self, tier: usize, x: u32, y: u32) -> Option<u32> {
        let t = self.tiers.get(tier)?;
        if x >= t.tiles_x || y >= t.tiles_y {
            return None;
        }
        Some(t.first_tile + y * t.tiles_x + x)
    }

    /// `TileGroup` number holding a tile.
    pub fn tile_group(&self, tier: usize, x: u32, y: u32) -> Option<u32> {
        self.tile_index(tier, x, y).map(|i| i / TILES_PER_GROUP)
    }

    /// Path of a tile relative to the tile set root, with `/` separators.
    pub fn tile_path(&self, tier: usize, x: u32, y: u32) -> Option<String> {
        let group = self.tile_group(tier, x, y)?;
        Some(format!("TileGroup{}/{}-{}-{}.png", group, tier, x, y))
    }

    /// Pixel rectangle `(x, y, width, height)` of a tile within its tier.
    ///
    /// Tiles on the right and bottom edges are cropped to the tier size.
    pub fn tile_bounds(&self, tier: usize, x: u32, y: u32) -> Option<(u32, u32, u32, u32)> {
        let t = self.tiers.get(tier)?;
        if x >= t.tiles_x || y >= t.tiles_y {
            return None;
        }
        let left = x * self.tile_size;
        let top = y * self.tile_size;
        let w = self.tile_size.min(t.width - left);
        let h = self.tile_size.min(t.height - top);
        Some((left, top, w, h))
    }

    /// Render the `ImageProperties.xml` descriptor.
    ///
    /// # Example Output
    ///
    /// ```xml
    /// <IMAGE_PROPERTIES WIDTH="1000" HEIGHT="500" NUMTILES="11" NUMIMAGES="1" VERSION="1.8" TILESIZE="256" />
    /// ```
    pub fn properties_xml(&self) -> String {
        format!(
            "<IMAGE_PROPERTIES WIDTH=\"{}\" HEIGHT=\"{}\" NUMTILES=\"{}\" NUMIMAGES=\"1\" VERSION=\"1.8\" TILESIZE=\"{}\" />\n",
            self.width,
            self.height,
            self.tile_count(),
            self.tile_size
        )
    }
}

/// Check that a tile size is within the accepted range.
#[inline]
pub fn is_valid_tile_size(tile_size: u32) -> bool {
    (MIN_TILE_SIZE..=MAX_TILE_SIZE).contains(&tile_size)
}
