//! Tilemap layout:
//!
//! ```text
//! byte 0        tile width
//! bytes 1..3    map width  (u16 LE)
//! bytes 3..5    map height (u16 LE)
//! w*h bytes     tileset index per cell
//! w*h bytes     overlay layer, one byte per cell
//! ```
//!
//! The tileset is not part of the blob; it travels as a list of tile ids.

use super::{push_u16, read_u16};
use crate::assets::{Tile, TileRef, TileSet, TilemapData};
use crate::error::{AssetError, Result};
use crate::sprite::TileGrid;

const HEADER_LEN: usize = 5;

/// Pack a tilemap into bytes.
pub fn encode_tilemap(data: &TilemapData) -> Result<Vec<u8>> {
    let cells = data.tilemap.data();
    let layers = data.layers.data();
    if layers.len() != cells.len() {
        return Err(AssetError::TruncatedData {
            expected: cells.len(),
            actual: layers.len(),
        });
    }

    let mut out = Vec::with_capacity(HEADER_LEN + cells.len() * 2);
    out.push(data.tileset.tile_width);
    push_u16(&mut out, data.tilemap.width());
    push_u16(&mut out, data.tilemap.height());
    out.extend_from_slice(cells);
    out.extend_from_slice(layers);
    Ok(out)
}

/// Unpack a tilemap, leaving every tileset entry as an id-only placeholder.
pub fn decode_tilemap(bytes: &[u8], tileset: &[String]) -> Result<TilemapData> {
    decode_tilemap_with(bytes, tileset, |_| None)
}

/// Unpack a tilemap, resolving tileset ids through `resolve`.
/// Ids the resolver cannot find become placeholders.
pub fn decode_tilemap_with<F>(bytes: &[u8], tileset: &[String], mut resolve: F) -> Result<TilemapData>
where
    F: FnMut(&str) -> Option<Tile>,
{
    if bytes.len() < HEADER_LEN {
        return Err(AssetError::TruncatedData {
            expected: HEADER_LEN,
            actual: bytes.len(),
        });
    }

    let tile_width = bytes[0];
    let width = read_u16(bytes, 1);
    let height = read_u16(bytes, 3);
    let cell_count = width as usize * height as usize;

    let expected = HEADER_LEN + cell_count * 2;
    if bytes.len() != expected {
        return Err(AssetError::TruncatedData {
            expected,
            actual: bytes.len(),
        });
    }

    let grid_end = HEADER_LEN + cell_count;
    let tilemap = TileGrid::from_data(width, height, bytes[HEADER_LEN..grid_end].to_vec())?;
    let layers = TileGrid::from_data(width, height, bytes[grid_end..].to_vec())?;

    let tiles = tileset
        .iter()
        .map(|id| match resolve(id) {
            Some(tile) => TileRef::Resolved(tile),
            None => TileRef::Placeholder(id.clone()),
        })
        .collect();

    Ok(TilemapData::new(tilemap, TileSet { tile_width, tiles }, layers))
}
