//! Sprite Value Types
//!
//! Pixel grids and tile grids are plain values: cloning copies the pixels and
//! equality compares dimensions and content.

pub mod bitmap;
pub mod grid;

pub use bitmap::Bitmap;
pub use grid::TileGrid;

/// Namespace for project images.
pub const IMAGES_NAMESPACE: &str = "myImages";
/// Variable prefix for generated image ids.
pub const IMAGE_PREFIX: &str = "image";

/// Namespace for project tiles.
pub const TILE_NAMESPACE: &str = "myTiles";
/// Variable prefix for generated tile ids.
pub const TILE_PREFIX: &str = "tile";

/// Namespace for project animations.
pub const ANIMATION_NAMESPACE: &str = "myAnimations";
/// Variable prefix for generated animation ids.
pub const ANIMATION_PREFIX: &str = "anim";

/// Default name for tilemaps created without one.
pub const TILEMAP_PREFIX: &str = "level";
