//! Resource Bundle
//!
//! The bundle is the only durable representation of a project's assets: a
//! JSON object mapping keys to records. A record's `mimeType` distinguishes
//! asset kinds; tiles are images flagged with `tilemapTile`. The special `"*"`
//! key carries defaults (mimeType, dataEncoding, namespace) for the others.

use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::assets::{Asset, AssetKind, Tile, TilemapData};
use crate::codec::{self, AnimationData};
use crate::error::{AssetError, Result};
use crate::sprite::Bitmap;

pub const IMAGE_MIME_TYPE: &str = "image/x-mkcd-f4";
pub const TILEMAP_MIME_TYPE: &str = "application/mkcd-tilemap";
pub const ANIMATION_MIME_TYPE: &str = "application/mkcd-animation";

/// Key of the defaults record.
pub const DEFAULTS_KEY: &str = "*";

/// One bundle record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JRes {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tileset: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tilemap_tile: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl JRes {
    pub fn is_tile(&self) -> bool {
        self.tilemap_tile.unwrap_or(false)
    }

    pub fn is_json_encoded(&self) -> bool {
        self.data_encoding.as_deref() == Some("json")
    }

    /// The id of the asset this entry decodes to. Animation ids are qualified
    /// with their namespace when the entry stores only the short form.
    pub fn asset_id(&self) -> String {
        if self.mime_type != ANIMATION_MIME_TYPE {
            return self.id.clone();
        }

        let namespace = self.namespace.as_deref().unwrap_or("").trim_end_matches('.');
        if namespace.is_empty() || self.id.starts_with(&format!("{namespace}.")) {
            self.id.clone()
        } else {
            format!("{}.{}", namespace, self.id)
        }
    }
}

/// A bundle value: bare image data or a full record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BundleEntry {
    Data(String),
    Record(JRes),
}

/// Key to entry mapping as stored on disk.
pub type ResourceBundle = BTreeMap<String, BundleEntry>;

/// Parse a bundle from JSON text.
pub fn parse_bundle(json: &str) -> Result<ResourceBundle> {
    Ok(serde_json::from_str(json)?)
}

/// Serialize a bundle to pretty JSON text.
pub fn bundle_to_json(bundle: &ResourceBundle) -> Result<String> {
    Ok(serde_json::to_string_pretty(bundle)?)
}

/// Resolve every entry against the `"*"` defaults, keyed by full id.
pub fn inflate_bundle(bundle: &ResourceBundle) -> BTreeMap<String, JRes> {
    let base = match bundle.get(DEFAULTS_KEY) {
        Some(BundleEntry::Record(record)) => record.clone(),
        _ => JRes::default(),
    };

    let mut inflated = BTreeMap::new();
    for (key, entry) in bundle {
        if key == DEFAULTS_KEY {
            continue;
        }

        let record = match entry {
            BundleEntry::Data(data) => JRes {
                data: data.clone(),
                ..Default::default()
            },
            BundleEntry::Record(record) => record.clone(),
        };

        let namespace = record
            .namespace
            .clone()
            .or_else(|| base.namespace.clone())
            .unwrap_or_default();
        let id = if !record.id.is_empty() {
            record.id.clone()
        } else if namespace.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", namespace, key)
        };
        let mime_type = if record.mime_type.is_empty() {
            base.mime_type.clone()
        } else {
            record.mime_type.clone()
        };
        let data_encoding = record
            .data_encoding
            .clone()
            .or_else(|| base.data_encoding.clone())
            .or_else(|| Some("base64".to_string()));

        inflated.insert(
            id.clone(),
            JRes {
                id,
                mime_type,
                data_encoding,
                namespace: Some(namespace),
                ..record
            },
        );
    }

    inflated
}

/// Combine bundles into one. Entries are inflated first, so each input keeps
/// its own `"*"` defaults and the result needs none.
pub fn merge_bundles<'a, I>(bundles: I) -> ResourceBundle
where
    I: IntoIterator<Item = &'a ResourceBundle>,
{
    bundles
        .into_iter()
        .flat_map(inflate_bundle)
        .map(|(id, entry)| (id, BundleEntry::Record(entry)))
        .collect()
}

/// The defaults record written alongside exported entries.
pub fn defaults_entry(namespace: &str) -> BundleEntry {
    BundleEntry::Record(JRes {
        mime_type: IMAGE_MIME_TYPE.to_string(),
        data_encoding: Some("base64".to_string()),
        namespace: Some(namespace.to_string()),
        ..Default::default()
    })
}

fn last_segment(id: &str) -> &str {
    id.rsplit('.').next().unwrap_or(id)
}

fn namespace_of(id: &str) -> &str {
    id.rfind('.').map(|pos| &id[..pos]).unwrap_or("")
}

fn insert_entry(bundle: &mut ResourceBundle, key: String, entry: BundleEntry) {
    if bundle.insert(key.clone(), entry).is_some() {
        warn!("Bundle key '{}' is used by two assets; keeping the later one", key);
    }
}

fn tags_of(tags: &[String]) -> Option<Vec<String>> {
    if tags.is_empty() {
        None
    } else {
        Some(tags.to_vec())
    }
}

/// Serialize one asset into `bundle`.
///
/// Entries are keyed by short id, except tilemaps which keep their full id.
pub fn add_asset_to_bundle(asset: &Asset, bundle: &mut ResourceBundle) -> Result<()> {
    let key = last_segment(asset.id()).to_string();
    let display_name = asset.meta().display_name().map(str::to_string);

    match asset {
        Asset::Image(image) => {
            let entry = match display_name {
                Some(name) => BundleEntry::Record(JRes {
                    data: image.jres_data.clone(),
                    mime_type: IMAGE_MIME_TYPE.to_string(),
                    display_name: Some(name),
                    tags: tags_of(&image.meta.tags),
                    ..Default::default()
                }),
                None => BundleEntry::Data(image.jres_data.clone()),
            };
            insert_entry(bundle, key, entry);
        }
        Asset::Tile(tile) => {
            insert_entry(
                bundle,
                key,
                BundleEntry::Record(JRes {
                    data: tile.jres_data.clone(),
                    mime_type: IMAGE_MIME_TYPE.to_string(),
                    tilemap_tile: Some(true),
                    display_name,
                    tags: tags_of(&tile.meta.tags),
                    ..Default::default()
                }),
            );
        }
        Asset::Tilemap(tilemap) => {
            insert_entry(
                bundle,
                tilemap.id.clone(),
                BundleEntry::Record(JRes {
                    id: tilemap.id.clone(),
                    mime_type: TILEMAP_MIME_TYPE.to_string(),
                    data: codec::encode_text(&codec::encode_tilemap(&tilemap.data)?),
                    tileset: Some(tilemap.data.tileset.tile_ids()),
                    display_name,
                    tags: tags_of(&tilemap.meta.tags),
                    ..Default::default()
                }),
            );
        }
        Asset::Animation(animation) => {
            let (width, height) = animation.frame_dimensions();
            let bytes = codec::encode_animation(&AnimationData {
                interval: animation.interval,
                width,
                height,
                frames: animation.frames.clone(),
            })?;
            insert_entry(
                bundle,
                key.clone(),
                BundleEntry::Record(JRes {
                    id: key,
                    namespace: Some(namespace_of(&animation.id).to_string()),
                    mime_type: ANIMATION_MIME_TYPE.to_string(),
                    data: codec::encode_text(&bytes),
                    display_name,
                    tags: tags_of(&animation.meta.tags),
                    ..Default::default()
                }),
            );
        }
    }

    Ok(())
}

/// Serialize every asset of a collection-like iterator into `bundle`.
pub fn add_assets_to_bundle<'a, U, I>(assets: I, bundle: &mut ResourceBundle) -> Result<()>
where
    U: AssetKind + 'a,
    I: IntoIterator<Item = &'a U>,
{
    for asset in assets {
        add_asset_to_bundle(&asset.clone().into_asset(), bundle)?;
    }
    Ok(())
}

/// Decode the pixels of an image or tile record.
pub fn decode_image_entry(entry: &JRes) -> Result<Bitmap> {
    Bitmap::from_jres_data(&entry.data).map_err(|e| malformed(entry, e))
}

/// Decode a binary animation record. Returns the fully qualified id.
pub fn decode_animation_entry(entry: &JRes) -> Result<(String, AnimationData)> {
    let bytes = codec::decode_text(&entry.data).map_err(|e| malformed(entry, e))?;
    let data = codec::decode_animation(&bytes).map_err(|e| malformed(entry, e))?;
    Ok((entry.asset_id(), data))
}

/// Frame references of a JSON-encoded animation record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonAnimation {
    pub frames: Vec<String>,
    #[serde(default)]
    pub flipped_horizontal: bool,
}

/// Decode a JSON-encoded animation record. Returns the fully qualified id.
pub fn decode_json_animation_entry(entry: &JRes) -> Result<(String, JsonAnimation)> {
    let parsed: JsonAnimation = serde_json::from_str(&entry.data).map_err(|e| malformed(entry, e))?;
    Ok((entry.asset_id(), parsed))
}

/// Decode a tilemap record, resolving its tileset through `resolve`.
pub fn decode_tilemap_entry<F>(entry: &JRes, resolve: F) -> Result<TilemapData>
where
    F: FnMut(&str) -> Option<Tile>,
{
    let bytes = codec::decode_text(&entry.data).map_err(|e| malformed(entry, e))?;
    let tileset = entry.tileset.clone().unwrap_or_default();
    codec::decode_tilemap_with(&bytes, &tileset, resolve).map_err(|e| malformed(entry, e))
}

fn malformed(entry: &JRes, err: impl std::fmt::Display) -> AssetError {
    AssetError::MalformedEntry {
        id: entry.id.clone(),
        reason: err.to_string(),
    }
}
