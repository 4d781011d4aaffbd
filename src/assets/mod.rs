//! Asset Model
//!
//! The four asset kinds form a closed sum type, [`Asset`]. Each kind is also a
//! standalone struct implementing [`AssetKind`] so that an
//! [`AssetCollection`] can hold exactly one kind.
//!
//! Every asset carries three identities:
//! - `internal_id`: process-local, unique and stable for the asset's lifetime
//! - `id`: the durable qualified name, e.g. `myTiles.tile3`
//! - `meta.display_name`: an optional user-facing name

pub mod collection;
pub mod names;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sprite::{Bitmap, TileGrid};

pub use collection::{AssetCollection, CollectionDiff, ListenerId};
pub use names::{parse_ts_reference, short_id_for, ts_reference_for_asset, validate_asset_name};

/// Process-local asset identity.
pub type InternalId = u32;

/// The kind of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Image,
    Tile,
    Tilemap,
    Animation,
}

impl AssetType {
    /// All kinds, in the order collections are processed.
    pub const ALL: [AssetType; 4] = [
        AssetType::Tile,
        AssetType::Image,
        AssetType::Tilemap,
        AssetType::Animation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Image => "image",
            AssetType::Tile => "tile",
            AssetType::Tilemap => "tilemap",
            AssetType::Animation => "animation",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marks an asset created by an editing session that has not been named yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporaryAssetInfo {
    pub block_id: String,
    pub field_name: String,
}

/// Metadata shared by every asset kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetMetadata {
    pub display_name: Option<String>,
    pub tags: Vec<String>,
    pub block_ids: Vec<String>,
    pub temporary_info: Option<TemporaryAssetInfo>,
}

impl AssetMetadata {
    /// Metadata with only a display name set.
    pub fn named(display_name: Option<String>) -> Self {
        Self {
            display_name,
            ..Default::default()
        }
    }

    /// The display name if present and non-empty.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref().filter(|name| !name.is_empty())
    }

    fn equals(&self, other: &AssetMetadata) -> bool {
        self.display_name() == other.display_name()
            && self.tags == other.tags
            && self.block_ids == other.block_ids
    }
}

/// Behavior shared by the four asset structs.
pub trait AssetKind: Clone + fmt::Debug {
    const ASSET_TYPE: AssetType;

    fn internal_id(&self) -> InternalId;
    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    fn meta(&self) -> &AssetMetadata;
    fn meta_mut(&mut self) -> &mut AssetMetadata;

    /// Compare the kind-specific payload (pixels, frames, tile grids).
    fn payload_equals(&self, other: &Self) -> bool;

    fn into_asset(self) -> Asset;

    /// Structural equality: id, tags, block ids, display name and payload.
    /// `internal_id` and temporary info are not compared.
    fn asset_equals(&self, other: &Self) -> bool {
        self.id() == other.id() && self.meta().equals(other.meta()) && self.payload_equals(other)
    }

    /// The id with this kind's namespace prefix stripped.
    fn short_id(&self) -> Option<String> {
        short_id_for(Self::ASSET_TYPE, self.id(), false)
    }
}

macro_rules! impl_asset_kind {
    ($ty:ident, $kind:expr, $variant:ident) => {
        impl AssetKind for $ty {
            const ASSET_TYPE: AssetType = $kind;

            fn internal_id(&self) -> InternalId {
                self.internal_id
            }

            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }

            fn meta(&self) -> &AssetMetadata {
                &self.meta
            }

            fn meta_mut(&mut self) -> &mut AssetMetadata {
                &mut self.meta
            }

            fn payload_equals(&self, other: &Self) -> bool {
                $ty::same_payload(self, other)
            }

            fn into_asset(self) -> Asset {
                Asset::$variant(self)
            }
        }

        impl From<$ty> for Asset {
            fn from(value: $ty) -> Self {
                Asset::$variant(value)
            }
        }
    };
}

/// A free-standing image.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectImage {
    pub internal_id: InternalId,
    pub id: String,
    pub meta: AssetMetadata,
    pub bitmap: Bitmap,
    /// Encoded form of `bitmap` as stored in a resource bundle.
    pub jres_data: String,
}

impl ProjectImage {
    pub fn new(internal_id: InternalId, id: impl Into<String>, bitmap: Bitmap) -> Self {
        Self {
            internal_id,
            id: id.into(),
            meta: AssetMetadata::default(),
            jres_data: bitmap.to_jres_data(),
            bitmap,
        }
    }

    /// Replace the pixels and re-encode.
    pub fn set_bitmap(&mut self, bitmap: Bitmap) {
        self.jres_data = bitmap.to_jres_data();
        self.bitmap = bitmap;
    }

    fn same_payload(&self, other: &Self) -> bool {
        self.bitmap == other.bitmap
    }
}

/// An image that can be placed in a tilemap's tileset.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub internal_id: InternalId,
    pub id: String,
    pub meta: AssetMetadata,
    pub bitmap: Bitmap,
    pub jres_data: String,
    pub is_project_tile: bool,
}

impl Tile {
    pub fn new(internal_id: InternalId, id: impl Into<String>, bitmap: Bitmap) -> Self {
        Self {
            internal_id,
            id: id.into(),
            meta: AssetMetadata::default(),
            jres_data: bitmap.to_jres_data(),
            bitmap,
            is_project_tile: true,
        }
    }

    pub fn set_bitmap(&mut self, bitmap: Bitmap) {
        self.jres_data = bitmap.to_jres_data();
        self.bitmap = bitmap;
    }

    fn same_payload(&self, other: &Self) -> bool {
        self.bitmap == other.bitmap
    }
}

/// A sequence of frames played at a fixed interval.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    pub internal_id: InternalId,
    pub id: String,
    pub meta: AssetMetadata,
    pub frames: Vec<Bitmap>,
    /// Milliseconds per frame.
    pub interval: u16,
    /// Frame dimensions. Only consulted when `frames` is empty.
    pub frame_size: (u16, u16),
    /// Set on JSON bundle entries whose frames are mirrored image references.
    pub flipped_horizontal: bool,
    /// Image ids for JSON bundle entries awaiting inflation.
    pub frame_ids: Vec<String>,
}

impl Animation {
    pub fn new(internal_id: InternalId, id: impl Into<String>, frames: Vec<Bitmap>, interval: u16) -> Self {
        let frame_size = frames
            .first()
            .map(|f| (f.width(), f.height()))
            .unwrap_or((0, 0));
        Self {
            internal_id,
            id: id.into(),
            meta: AssetMetadata::default(),
            frames,
            interval,
            frame_size,
            flipped_horizontal: false,
            frame_ids: Vec::new(),
        }
    }

    /// Current frame size: that of the first frame, else `frame_size`.
    pub fn frame_dimensions(&self) -> (u16, u16) {
        self.frames
            .first()
            .map(|f| (f.width(), f.height()))
            .unwrap_or(self.frame_size)
    }

    fn same_payload(&self, other: &Self) -> bool {
        self.interval == other.interval
            && self.frames == other.frames
            && self.frame_dimensions() == other.frame_dimensions()
    }
}

/// A tileset entry: either a live tile or an id that has not been resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum TileRef {
    Resolved(Tile),
    Placeholder(String),
}

impl TileRef {
    pub fn id(&self) -> &str {
        match self {
            TileRef::Resolved(tile) => &tile.id,
            TileRef::Placeholder(id) => id,
        }
    }

    pub fn internal_id(&self) -> Option<InternalId> {
        match self {
            TileRef::Resolved(tile) => Some(tile.internal_id),
            TileRef::Placeholder(_) => None,
        }
    }

    pub fn tile(&self) -> Option<&Tile> {
        match self {
            TileRef::Resolved(tile) => Some(tile),
            TileRef::Placeholder(_) => None,
        }
    }

    fn equals(&self, other: &TileRef) -> bool {
        match (self, other) {
            (TileRef::Resolved(a), TileRef::Resolved(b)) => a.asset_equals(b),
            (TileRef::Placeholder(a), TileRef::Placeholder(b)) => a == b,
            _ => false,
        }
    }
}

/// Ordered tiles of one width, indexed by the values in a tilemap grid.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSet {
    pub tile_width: u8,
    pub tiles: Vec<TileRef>,
}

impl TileSet {
    pub fn references(&self, internal_id: InternalId) -> bool {
        self.tiles.iter().any(|t| t.internal_id() == Some(internal_id))
    }

    pub fn tile_ids(&self) -> Vec<String> {
        self.tiles.iter().map(|t| t.id().to_string()).collect()
    }
}

/// Grid, tileset and overlay layer of a tilemap.
#[derive(Debug, Clone, PartialEq)]
pub struct TilemapData {
    pub tilemap: TileGrid,
    pub tileset: TileSet,
    pub layers: TileGrid,
}

impl TilemapData {
    pub fn new(tilemap: TileGrid, tileset: TileSet, layers: TileGrid) -> Self {
        Self {
            tilemap,
            tileset,
            layers,
        }
    }

    /// Structural equality. Tileset entries compare by full tile content so
    /// that a tile edit is visible as a tilemap change.
    pub fn equals(&self, other: &TilemapData) -> bool {
        self.tilemap == other.tilemap
            && self.layers == other.layers
            && self.tileset.tile_width == other.tileset.tile_width
            && self.tileset.tiles.len() == other.tileset.tiles.len()
            && self
                .tileset
                .tiles
                .iter()
                .zip(&other.tileset.tiles)
                .all(|(a, b)| a.equals(b))
    }
}

/// A tilemap asset.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectTilemap {
    pub internal_id: InternalId,
    pub id: String,
    pub meta: AssetMetadata,
    pub data: TilemapData,
}

impl ProjectTilemap {
    fn same_payload(&self, other: &Self) -> bool {
        self.data.equals(&other.data)
    }
}

impl_asset_kind!(ProjectImage, AssetType::Image, Image);
impl_asset_kind!(Tile, AssetType::Tile, Tile);
impl_asset_kind!(ProjectTilemap, AssetType::Tilemap, Tilemap);
impl_asset_kind!(Animation, AssetType::Animation, Animation);

/// Any asset.
#[derive(Debug, Clone, PartialEq)]
pub enum Asset {
    Image(ProjectImage),
    Tile(Tile),
    Tilemap(ProjectTilemap),
    Animation(Animation),
}

impl Asset {
    pub fn asset_type(&self) -> AssetType {
        match self {
            Asset::Image(_) => AssetType::Image,
            Asset::Tile(_) => AssetType::Tile,
            Asset::Tilemap(_) => AssetType::Tilemap,
            Asset::Animation(_) => AssetType::Animation,
        }
    }

    pub fn internal_id(&self) -> InternalId {
        match self {
            Asset::Image(a) => a.internal_id,
            Asset::Tile(a) => a.internal_id,
            Asset::Tilemap(a) => a.internal_id,
            Asset::Animation(a) => a.internal_id,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Asset::Image(a) => &a.id,
            Asset::Tile(a) => &a.id,
            Asset::Tilemap(a) => &a.id,
            Asset::Animation(a) => &a.id,
        }
    }

    pub fn meta(&self) -> &AssetMetadata {
        match self {
            Asset::Image(a) => &a.meta,
            Asset::Tile(a) => &a.meta,
            Asset::Tilemap(a) => &a.meta,
            Asset::Animation(a) => &a.meta,
        }
    }

    pub fn short_id(&self) -> Option<String> {
        short_id_for(self.asset_type(), self.id(), false)
    }

    /// Structural equality across kinds; different kinds are never equal.
    pub fn asset_equals(&self, other: &Asset) -> bool {
        match (self, other) {
            (Asset::Image(a), Asset::Image(b)) => a.asset_equals(b),
            (Asset::Tile(a), Asset::Tile(b)) => a.asset_equals(b),
            (Asset::Tilemap(a), Asset::Tilemap(b)) => a.asset_equals(b),
            (Asset::Animation(a), Asset::Animation(b)) => a.asset_equals(b),
            _ => false,
        }
    }
}
