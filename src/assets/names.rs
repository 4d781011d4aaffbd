//! Asset naming: short ids, name validation and source references.

use std::sync::OnceLock;

use regex::Regex;

use super::{Asset, AssetType};
use crate::sprite::{ANIMATION_NAMESPACE, IMAGES_NAMESPACE, TILE_NAMESPACE};

/// Namespace prefix (with trailing dot) for a kind; tilemaps have none.
pub fn namespace_prefix(asset_type: AssetType) -> Option<String> {
    match asset_type {
        AssetType::Image => Some(format!("{}.", IMAGES_NAMESPACE)),
        AssetType::Tile => Some(format!("{}.", TILE_NAMESPACE)),
        AssetType::Animation => Some(format!("{}.", ANIMATION_NAMESPACE)),
        AssetType::Tilemap => None,
    }
}

/// Strip the kind's namespace prefix from `id`.
///
/// Returns `None` for nested names (`myTiles.a.b`) and for ids without the
/// prefix, unless `allow_no_prefix` is set, in which case the id passes through.
pub fn short_id_for(asset_type: AssetType, id: &str, allow_no_prefix: bool) -> Option<String> {
    let Some(prefix) = namespace_prefix(asset_type) else {
        return Some(id.to_string());
    };

    match id.strip_prefix(prefix.as_str()) {
        Some(short) if !short.contains('.') => Some(short.to_string()),
        Some(_) => None,
        None if allow_no_prefix => Some(id.to_string()),
        None => None,
    }
}

/// Asset names may contain letters, digits, spaces, `-` and `_`.
/// Non-ASCII characters are allowed.
pub fn validate_asset_name(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }

    name.chars().all(|c| {
        if !c.is_ascii() {
            return true;
        }
        c == ' ' || c == '-' || c == '_' || c.is_ascii_alphanumeric()
    })
}

/// The source expression that refers to `asset`, in backtick or Python call syntax.
pub fn ts_reference_for_asset(asset: &Asset, python: bool) -> Option<String> {
    let name = asset
        .meta()
        .display_name()
        .map(str::to_string)
        .or_else(|| asset.short_id());

    let Some(name) = name else {
        return match asset.asset_type() {
            AssetType::Image | AssetType::Tile => Some(asset.id().to_string()),
            _ => None,
        };
    };

    let (left, right) = if python { ("(\"\"\"", "\"\"\")") } else { ("`", "`") };

    let head = match asset.asset_type() {
        AssetType::Tile => "assets.tile",
        AssetType::Image => "assets.image",
        AssetType::Animation => "assets.animation",
        AssetType::Tilemap => "tilemap",
    };

    Some(format!("{head}{left}{name}{right}"))
}

fn reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?m)^\s*(?:(?:assets\s*\.\s*(image|tile|animation|tilemap))|(tilemap))\s*(?:`|\(""")([^`"]+)(?:`|"""\))\s*$"#,
        )
        .expect("asset reference pattern is valid")
    })
}

/// Parse a source expression like ``assets.tile`grass` `` or
/// `assets.image("""hero""")` into its kind and name.
pub fn parse_ts_reference(text: &str) -> Option<(AssetType, String)> {
    let captures = reference_regex().captures(text)?;

    let kind = captures.get(1).or_else(|| captures.get(2))?.as_str();
    let name = captures.get(3)?.as_str().trim().to_string();

    let asset_type = match kind {
        "image" => AssetType::Image,
        "tile" => AssetType::Tile,
        "animation" => AssetType::Animation,
        "tilemap" => AssetType::Tilemap,
        _ => return None,
    };

    Some((asset_type, name))
}
