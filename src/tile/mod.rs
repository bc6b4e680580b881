//! Zoomify tile pyramid generation.
//!
//! This module turns a source image into a Zoomify tile set on local disk.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              TileOrchestrator           │
//! └────────────────────┬────────────────────┘
//!                      │ source bytes, output dir
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              Tiler trait                │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │ZoomifyLayout │  │ PngTileEncoder  │  │
//! │  │ (tiers,      │  │ (decode →       │  │
//! │  │  groups)     │  │  crop → PNG)    │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//!   tiled/ImageProperties.xml
//!   tiled/TileGroup{g}/{tier}-{x}-{y}.png
//! ```
//!
//! # Components
//!
//! - [`ZoomifyLayout`]: Tier sizes, tile counts and tile-group assignment
//! - [`PngTileEncoder`]: Source decoding and PNG tile encoding
//! - [`Tiler`]: Seam between the orchestrator and the tiling implementation
//! - [`ZoomifyTiler`]: The `image`-crate backed implementation of [`Tiler`]
//!
//! # Example
//!
//! ```
//! use zoomify_tiler::tile::ZoomifyLayout;
//!
//! let layout = ZoomifyLayout::new(1000, 500, 256);
//! assert_eq!(layout.tier_count(), 3);
//! assert_eq!(layout.tile_count(), 11);
//! assert_eq!(layout.tile_path(2, 3, 1).as_deref(), Some("TileGroup0/2-3-1.png"));
//! ```

mod encoder;
mod layout;
mod tiler;

pub use encoder::{decode_image, PngTileEncoder};
pub use layout::{
    is_valid_tile_size, Tier, ZoomifyLayout, DEFAULT_TILE_SIZE, MAX_TILE_SIZE, MIN_TILE_SIZE,
    PROPERTIES_FILE, TILES_PER_GROUP,
};
pub use tiler::{TileSummary, Tiler, ZoomifyTiler};
