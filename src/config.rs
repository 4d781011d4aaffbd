//! Project Configuration
//!
//! Tunables for an [`AssetProject`](crate::project::AssetProject), loaded
//! from a JSON file. Missing fields take their defaults and unknown fields
//! are ignored.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AssetError, Result};

/// Default maximum number of undo levels to keep.
pub const DEFAULT_MAX_UNDO_LEVELS: usize = 100;

/// Settings applied when a project is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Undo checkpoints kept before the oldest is dropped. 0 keeps all.
    pub max_undo_levels: usize,

    /// Size of images created without explicit dimensions.
    pub default_image_width: u16,
    pub default_image_height: u16,

    /// Frame interval in ms for new animations.
    pub default_animation_interval: u16,

    /// Size of tilemaps created without explicit dimensions.
    pub default_tilemap_width: u16,
    pub default_tilemap_height: u16,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            max_undo_levels: DEFAULT_MAX_UNDO_LEVELS,
            default_image_width: 16,
            default_image_height: 16,
            default_animation_interval: 500,
            default_tilemap_width: 16,
            default_tilemap_height: 16,
        }
    }
}

impl ProjectConfig {
    /// Read a config from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| AssetError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
