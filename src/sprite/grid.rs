//! Byte-per-cell grid used for tilemap indices and overlay layers.

use crate::error::{AssetError, Result};

/// A `width` x `height` grid with one byte per cell, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileGrid {
    width: u16,
    height: u16,
    data: Vec<u8>,
}

impl TileGrid {
    /// Create a grid filled with zeros.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    /// Wrap existing cell data; the buffer must hold exactly `width * height` bytes.
    pub fn from_data(width: u16, height: u16, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(AssetError::TruncatedData {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn get(&self, x: u16, y: u16) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[x as usize + y as usize * self.width as usize])
    }

    pub fn set(&mut self, x: u16, y: u16, value: u8) {
        if x < self.width && y < self.height {
            self.data[x as usize + y as usize * self.width as usize] = value;
        }
    }
}
