//! Binary Codecs
//!
//! Tilemaps and animations are packed into compact little-endian byte layouts.
//! In a resource bundle the bytes are rendered as lowercase hex and the hex
//! text is then base64-encoded.

pub mod animation;
pub mod tilemap;

use base64::Engine;

use crate::error::{AssetError, Result};

pub use animation::{decode_animation, encode_animation, AnimationData};
pub use tilemap::{decode_tilemap, decode_tilemap_with, encode_tilemap};

/// Render bytes as lowercase hex.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Parse hex text. Whitespace is not allowed.
pub fn from_hex(text: &str) -> Result<Vec<u8>> {
    let text = text.as_bytes();
    if text.len() % 2 != 0 {
        return Err(AssetError::InvalidHex {
            reason: format!("odd length {}", text.len()),
        });
    }

    text.chunks(2)
        .map(|pair| Ok((hex_digit(pair[0])? << 4) | hex_digit(pair[1])?))
        .collect()
}

fn hex_digit(c: u8) -> Result<u8> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(AssetError::InvalidHex {
            reason: format!("unexpected character {:?}", c as char),
        }),
    }
}

/// base64(hex(bytes)), the text form stored in bundle `data` fields.
pub fn encode_text(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(to_hex(bytes))
}

/// Inverse of [`encode_text`].
pub fn decode_text(text: &str) -> Result<Vec<u8>> {
    let hex = base64::engine::general_purpose::STANDARD.decode(text.trim())?;
    let hex = String::from_utf8(hex).map_err(|e| AssetError::InvalidHex {
        reason: e.to_string(),
    })?;
    from_hex(&hex)
}

pub(crate) fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

pub(crate) fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex() {
        assert_eq!(to_hex(&[0x00, 0xab, 0x10]), "00ab10");
        assert_eq!(from_hex("00AB10").unwrap(), vec![0x00, 0xab, 0x10]);
        assert!(from_hex("abc").is_err());
        assert!(from_hex("zz").is_err());
    }

    #[test]
    fn test_text_round_trip() {
        let bytes = vec![16, 2, 0, 3, 0, 255];
        let text = encode_text(&bytes);
        assert_eq!(decode_text(&text).unwrap(), bytes);
        assert!(decode_text("!!!").is_err());
    }
}
