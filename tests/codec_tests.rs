//! Codec Integration Tests
//!
//! Byte layouts of tilemaps and animations as they appear in bundles.

use pretty_assertions::assert_eq;
use test_case::test_case;

use tilekit::assets::{TileRef, TileSet, TilemapData};
use tilekit::codec::{
    self, decode_animation, decode_tilemap, encode_animation, encode_tilemap, AnimationData,
};
use tilekit::sprite::{Bitmap, TileGrid};

fn checkered(width: u16, height: u16) -> Bitmap {
    let mut bitmap = Bitmap::new(width, height);
    for y in 0..height {
        for x in 0..width {
            bitmap.set(x, y, ((x + y) % 16) as u8);
        }
    }
    bitmap
}

#[test_case(1, 1, 16 ; "single cell")]
#[test_case(3, 2, 8 ; "small map")]
#[test_case(20, 15, 16 ; "screen sized")]
#[test_case(0, 0, 32 ; "empty map")]
fn test_tilemap_roundtrip(width: u16, height: u16, tile_width: u8) {
    let mut tilemap = TileGrid::new(width, height);
    let mut layers = TileGrid::new(width, height);
    for y in 0..height {
        for x in 0..width {
            tilemap.set(x, y, ((x * 3 + y) % 4) as u8);
            layers.set(x, y, ((x + y) % 2) as u8);
        }
    }
    let tile_ids: Vec<String> = (0..4).map(|i| format!("myTiles.tile{}", i)).collect();
    let data = TilemapData::new(
        tilemap,
        TileSet {
            tile_width,
            tiles: tile_ids.iter().cloned().map(TileRef::Placeholder).collect(),
        },
        layers,
    );

    let bytes = encode_tilemap(&data).unwrap();
    assert_eq!(bytes.len(), 5 + 2 * width as usize * height as usize);

    let decoded = decode_tilemap(&bytes, &tile_ids).unwrap();
    assert_eq!(decoded, data);
}

#[test_case(0, 0, 0 ; "no frames")]
#[test_case(1, 1, 1 ; "one pixel")]
#[test_case(3, 5, 2 ; "odd frame size")]
#[test_case(16, 16, 4 ; "sprite")]
fn test_animation_roundtrip(width: u16, height: u16, frame_count: usize) {
    let frames: Vec<Bitmap> = (0..frame_count).map(|_| checkered(width, height)).collect();

    let bytes = encode_animation(&AnimationData::new(frames.clone(), 120)).unwrap();
    let decoded = decode_animation(&bytes).unwrap();

    assert_eq!(decoded.interval, 120);
    assert_eq!(decoded.frames, frames);
}

#[test_case(&[0xf4, 0x01, 0, 0, 0, 0, 0, 0] ; "empty header")]
#[test_case(&[100, 0, 5, 0, 3, 0, 0, 0] ; "sized header without frames")]
#[test_case(&[100, 0, 1, 0, 1, 0, 1, 0, 0x07] ; "one pixel")]
#[test_case(&[200, 0, 3, 0, 1, 0, 2, 0, 0x21, 0x03, 0x54, 0x06] ; "odd frame size")]
fn test_animation_bytes_reencode(bytes: &[u8]) {
    let decoded = decode_animation(bytes).unwrap();
    assert_eq!(encode_animation(&decoded).unwrap(), bytes);
}

#[test_case(&[16, 1, 0, 1, 0, 3, 1] ; "single cell")]
#[test_case(&[8, 2, 0, 1, 0, 0, 2, 1, 1] ; "row")]
#[test_case(&[32, 0, 0, 0, 0] ; "empty map")]
fn test_tilemap_bytes_reencode(bytes: &[u8]) {
    let ids = vec!["myTiles.transparency16".to_string(); 3];
    let decoded = decode_tilemap(bytes, &ids).unwrap();
    assert_eq!(encode_tilemap(&decoded).unwrap(), bytes);
}

#[test]
fn test_empty_animation_header() {
    let bytes = encode_animation(&AnimationData::new(Vec::new(), 500)).unwrap();
    assert_eq!(bytes, vec![0xf4, 0x01, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn test_bundle_text_roundtrip() {
    let bytes = encode_animation(&AnimationData::new(vec![checkered(4, 4)], 100)).unwrap();
    let text = codec::encode_text(&bytes);

    assert_eq!(codec::decode_text(&text).unwrap(), bytes);
}

#[test_case("not base64!" ; "bad base64")]
#[test_case("YWJj" ; "odd hex length")]
#[test_case("enp6eg==" ; "non hex digits")]
fn test_bad_bundle_text_rejected(text: &str) {
    assert!(codec::decode_text(text).is_err());
}

#[test]
fn test_truncated_tilemap_rejected() {
    let mut bytes = encode_tilemap(&TilemapData::new(
        TileGrid::new(2, 2),
        TileSet {
            tile_width: 16,
            tiles: Vec::new(),
        },
        TileGrid::new(2, 2),
    ))
    .unwrap();
    bytes.truncate(bytes.len() - 1);

    let err = decode_tilemap(&bytes, &[]).unwrap_err();
    assert!(err.is_decode_error());
}
