//! Asset usage analysis.
//!
//! An asset counts as used when a live block refers to it, when it is a tile
//! in some tilemap's tileset, or when program source mentions it. Source
//! references take one of these forms (`<q>` is a backtick in TypeScript and
//! `("""` / `""")` in Python):
//!
//! ```text
//! tile:       myTiles.<short>   assets.tile<q><name><q>
//! image:      assets.image<q><name><q>
//! animation:  assets.animation<q><name><q>
//! tilemap:    tilemap`<short>`  assets.tilemap("""<short>""")
//! ```
//!
//! `<name>` is the short id or the display name.

use std::collections::BTreeMap;

use log::warn;
use regex::Regex;

use super::AssetProject;
use crate::assets::{Asset, AssetType};

/// Which quoting style a source file uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceSyntax {
    TypeScript,
    Python,
}

impl SourceSyntax {
    /// Generated `.g.ts` files are never scanned.
    fn for_file(filename: &str) -> Option<Self> {
        let lower = filename.to_ascii_lowercase();
        if lower.ends_with(".ts") && !lower.ends_with(".g.ts") {
            Some(SourceSyntax::TypeScript)
        } else if filename.ends_with(".py") {
            Some(SourceSyntax::Python)
        } else {
            None
        }
    }

    fn quote(&self, call: &str, name: &str) -> String {
        let name = regex::escape(name);
        match self {
            SourceSyntax::TypeScript => format!("{}`{}`", regex::escape(call), name),
            SourceSyntax::Python => format!(r#"{}\("""{}"""\)"#, regex::escape(call), name),
        }
    }
}

impl AssetProject {
    /// True if `asset` is referenced by a block, a tilemap or a source file.
    ///
    /// `files` maps file names to contents. Entries of `skip_ids` (block ids,
    /// tilemap ids or file names) are ignored.
    pub fn is_asset_used(
        &self,
        asset: &Asset,
        files: Option<&BTreeMap<String, String>>,
        skip_ids: &[String],
    ) -> bool {
        let skipped = |id: &str| skip_ids.iter().any(|s| s == id);

        if asset.meta().block_ids.iter().any(|id| !skipped(id)) {
            return true;
        }

        if asset.asset_type() == AssetType::Tile {
            let in_tilemap = self
                .state
                .tilemaps
                .iter()
                .filter(|tm| !skipped(&tm.id))
                .any(|tm| tm.data.tileset.tiles.iter().any(|t| t.id() == asset.id()));
            if in_tilemap {
                return true;
            }
        }

        let Some(files) = files else {
            return false;
        };

        let ts = reference_regex(asset, SourceSyntax::TypeScript);
        let py = reference_regex(asset, SourceSyntax::Python);

        files
            .iter()
            .filter(|(filename, _)| !skipped(filename))
            .any(|(filename, content)| match SourceSyntax::for_file(filename) {
                Some(SourceSyntax::TypeScript) => ts.as_ref().is_some_and(|re| re.is_match(content)),
                Some(SourceSyntax::Python) => py.as_ref().is_some_and(|re| re.is_match(content)),
                None => false,
            })
    }
}

fn reference_regex(asset: &Asset, syntax: SourceSyntax) -> Option<Regex> {
    let short = asset.short_id().unwrap_or_else(|| asset.id().to_string());
    let display_name = asset.meta().display_name();

    let mut alternatives = Vec::new();
    match asset.asset_type() {
        AssetType::Tile => {
            alternatives.push(format!("myTiles\\.{}", regex::escape(&short)));
            alternatives.push(syntax.quote("assets.tile", &short));
            if let Some(name) = display_name {
                alternatives.push(syntax.quote("assets.tile", name));
            }
        }
        AssetType::Tilemap => {
            let call = match syntax {
                SourceSyntax::TypeScript => "tilemap",
                SourceSyntax::Python => "assets.tilemap",
            };
            alternatives.push(syntax.quote(call, &short));
        }
        AssetType::Animation => {
            alternatives.push(syntax.quote("assets.animation", &short));
            if let Some(name) = display_name {
                alternatives.push(syntax.quote("assets.animation", name));
            }
        }
        AssetType::Image => {
            alternatives.push(syntax.quote("assets.image", &short));
            if let Some(name) = display_name {
                alternatives.push(syntax.quote("assets.image", name));
            }
        }
    }

    match Regex::new(&alternatives.join("|")) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("Could not build reference pattern for {}: {}", asset.id(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::Bitmap;

    fn files(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(name, content)| (name.to_string(), content.to_string()))
            .collect()
    }

    #[test]
    fn test_source_syntax_detection() {
        assert_eq!(SourceSyntax::for_file("main.ts"), Some(SourceSyntax::TypeScript));
        assert_eq!(SourceSyntax::for_file("MAIN.TS"), Some(SourceSyntax::TypeScript));
        assert_eq!(SourceSyntax::for_file("tilemap.g.ts"), None);
        assert_eq!(SourceSyntax::for_file("main.py"), Some(SourceSyntax::Python));
        assert_eq!(SourceSyntax::for_file("main.blocks"), None);
    }

    #[test]
    fn test_display_name_is_escaped() {
        let mut project = AssetProject::new();
        let image = project.create_new_project_image(Bitmap::new(2, 2), Some("a+b"));
        let asset = Asset::Image(image);

        let source = files(&[("main.ts", "let x = assets.image`aab`")]);
        assert!(!project.is_asset_used(&asset, Some(&source), &[]));

        let source = files(&[("main.ts", "let x = assets.image`a+b`")]);
        assert!(project.is_asset_used(&asset, Some(&source), &[]));
    }

    #[test]
    fn test_skipped_file_is_ignored() {
        let mut project = AssetProject::new();
        let tile = project.create_new_tile(Bitmap::new(16, 16), None, None);
        let asset = Asset::Tile(tile);
        let source = files(&[("main.ts", "tiles.setTile(myTiles.tile1)")]);

        assert!(project.is_asset_used(&asset, Some(&source), &[]));
        assert!(!project.is_asset_used(&asset, Some(&source), &["main.ts".to_string()]));
    }

    #[test]
    fn test_python_tilemap_reference() {
        let mut project = AssetProject::new();
        let (id, _) = project.create_new_tilemap(None, 16, None);
        let asset = project.lookup_asset(AssetType::Tilemap, &id).unwrap();

        let source = files(&[("main.py", r#"tiles.set_current_tilemap(assets.tilemap("""level1"""))"#)]);
        assert!(project.is_asset_used(&asset, Some(&source), &[]));

        let source = files(&[("main.py", "tilemap`level1`")]);
        assert!(!project.is_asset_used(&asset, Some(&source), &[]));
    }
}
