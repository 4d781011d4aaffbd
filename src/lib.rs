//! Tilekit - Versioned Asset Store
//!
//! Tilekit tracks the graphical assets of a game project: images, tiles,
//! tilemaps and animations. It provides:
//! 1. Keyed collections with unique ids and display names
//! 2. Revision-tracked undo and redo across every asset kind
//! 3. Compact binary encodings persisted into a JSON resource bundle
//!
//! # Architecture
//!
//! - `sprite`: pixel and tile grid value types
//! - `assets`: the asset model and the generic collection
//! - `codec`: tilemap and animation byte layouts
//! - `bundle`: resource bundle wire types
//! - `project`: the project store, history, usage analysis and loading

pub mod assets;
pub mod bundle;
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod project;
pub mod sprite;

pub use assets::{Asset, AssetType};
pub use config::ProjectConfig;
pub use error::{AssetError, Result};
pub use project::AssetProject;
