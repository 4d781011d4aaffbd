//! 4-bit Pixel Grid
//!
//! Pixels are palette indices in `0..16`, stored two per byte in row-major
//! order. Even pixel indices live in the low nibble.

use base64::Engine;
use sha2::{Digest, Sha256};

use crate::error::{AssetError, Result};

/// Leading byte of the `image/x-mkcd-f4` encoding.
const F4_MAGIC: u8 = 0x87;
/// Bits per pixel marker of the `image/x-mkcd-f4` encoding.
const F4_BPP: u8 = 4;
/// Header length of the `image/x-mkcd-f4` encoding.
const F4_HEADER_LEN: usize = 8;

/// A palette-indexed image with 4 bits per pixel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bitmap {
    width: u16,
    height: u16,
    x0: i32,
    y0: i32,
    data: Vec<u8>,
}

impl Bitmap {
    /// Create a transparent bitmap at origin (0, 0).
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            x0: 0,
            y0: 0,
            data: vec![0; Self::data_length(width, height)],
        }
    }

    /// Wrap packed pixel data. The buffer must hold exactly
    /// `ceil(width * height / 2)` bytes.
    pub fn from_data(width: u16, height: u16, data: Vec<u8>) -> Result<Self> {
        let expected = Self::data_length(width, height);
        if data.len() != expected {
            return Err(AssetError::TruncatedData {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            x0: 0,
            y0: 0,
            data,
        })
    }

    /// Number of bytes needed to pack a `width` x `height` grid.
    pub fn data_length(width: u16, height: u16) -> usize {
        (width as usize * height as usize + 1) / 2
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn origin(&self) -> (i32, i32) {
        (self.x0, self.y0)
    }

    /// Move the bitmap's origin. Pixel data is unchanged.
    pub fn with_origin(mut self, x0: i32, y0: i32) -> Self {
        self.x0 = x0;
        self.y0 = y0;
        self
    }

    /// Packed pixel data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Read a pixel. Out-of-bounds reads return 0.
    pub fn get(&self, x: u16, y: u16) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        let index = x as usize + y as usize * self.width as usize;
        let byte = self.data[index >> 1];
        if index & 1 == 1 {
            byte >> 4
        } else {
            byte & 0x0f
        }
    }

    /// Write a pixel. Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: u16, y: u16, value: u8) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = x as usize + y as usize * self.width as usize;
        let byte = &mut self.data[index >> 1];
        if index & 1 == 1 {
            *byte = (*byte & 0x0f) | ((value & 0x0f) << 4);
        } else {
            *byte = (*byte & 0xf0) | (value & 0x0f);
        }
    }

    /// Copy with columns mirrored left to right.
    pub fn flipped_horizontal(&self) -> Self {
        let mut flipped = Bitmap::new(self.width, self.height).with_origin(self.x0, self.y0);
        for x in 0..self.width {
            for y in 0..self.height {
                flipped.set(x, y, self.get(self.width - x - 1, y));
            }
        }
        flipped
    }

    /// Encode in the column-major `image/x-mkcd-f4` layout.
    ///
    /// Each column occupies a multiple of 4 bytes; even rows use the low nibble.
    pub fn to_f4_bytes(&self) -> Vec<u8> {
        let column_len = Self::f4_column_length(self.height);
        let mut out = vec![0u8; F4_HEADER_LEN + column_len * self.width as usize];

        out[0] = F4_MAGIC;
        out[1] = F4_BPP;
        out[2..4].copy_from_slice(&self.width.to_le_bytes());
        out[4..6].copy_from_slice(&self.height.to_le_bytes());

        for x in 0..self.width {
            let column = F4_HEADER_LEN + x as usize * column_len;
            for y in 0..self.height {
                let value = self.get(x, y);
                let offset = column + (y as usize >> 1);
                if y & 1 == 1 {
                    out[offset] |= value << 4;
                } else {
                    out[offset] |= value;
                }
            }
        }

        out
    }

    /// Decode the `image/x-mkcd-f4` layout.
    pub fn from_f4_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < F4_HEADER_LEN {
            return Err(AssetError::TruncatedData {
                expected: F4_HEADER_LEN,
                actual: bytes.len(),
            });
        }
        if bytes[0] != F4_MAGIC || bytes[1] != F4_BPP {
            return Err(AssetError::MalformedEntry {
                id: String::new(),
                reason: format!("unsupported image header {:#04x} {:#04x}", bytes[0], bytes[1]),
            });
        }

        let width = u16::from_le_bytes([bytes[2], bytes[3]]);
        let height = u16::from_le_bytes([bytes[4], bytes[5]]);
        let column_len = Self::f4_column_length(height);
        let expected = F4_HEADER_LEN + column_len * width as usize;
        if bytes.len() < expected {
            return Err(AssetError::TruncatedData {
                expected,
                actual: bytes.len(),
            });
        }

        let mut bitmap = Bitmap::new(width, height);
        for x in 0..width {
            let column = F4_HEADER_LEN + x as usize * column_len;
            for y in 0..height {
                let byte = bytes[column + (y as usize >> 1)];
                let value = if y & 1 == 1 { byte >> 4 } else { byte & 0x0f };
                bitmap.set(x, y, value);
            }
        }

        Ok(bitmap)
    }

    /// The base64 text stored in a resource bundle entry.
    pub fn to_jres_data(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.to_f4_bytes())
    }

    /// Parse bundle entry text. Accepts an optional `data:<mime>;base64,` prefix.
    pub fn from_jres_data(text: &str) -> Result<Self> {
        let payload = match text.find(";base64,") {
            Some(pos) if text.starts_with("data:") => &text[pos + ";base64,".len()..],
            _ => text,
        };
        let bytes = base64::engine::general_purpose::STANDARD.decode(payload.trim())?;
        Self::from_f4_bytes(&bytes)
    }

    /// SHA-256 of the encoded pixels; equal for byte-identical content.
    pub fn content_hash(&self) -> String {
        format!("{:x}", Sha256::digest(self.to_f4_bytes()))
    }

    fn f4_column_length(height: u16) -> usize {
        ((height as usize * 4 + 31) >> 5) << 2
    }
}
