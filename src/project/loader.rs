//! Loading resource bundles into a project.
//!
//! Entries that fail to decode are logged and skipped; a bad entry never
//! aborts the rest of the load.

use std::collections::{BTreeMap, HashMap};

use log::{debug, info, warn};

use super::AssetProject;
use crate::assets::{Animation, Asset, AssetMetadata, ProjectImage, ProjectTilemap, Tile};
use crate::bundle::{self, JRes, ResourceBundle, ANIMATION_MIME_TYPE, IMAGE_MIME_TYPE, TILEMAP_MIME_TYPE};
use crate::error::Result;

/// Interval given to animations assembled from JSON frame lists.
const JSON_ANIMATION_INTERVAL: u16 = 100;

/// Outcome of a bundle load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub loaded: usize,
    pub skipped: usize,
}

impl LoadSummary {
    fn merge(&mut self, other: LoadSummary) {
        self.loaded += other.loaded;
        self.skipped += other.skipped;
    }
}

impl AssetProject {
    /// Seed the project from its own bundle plus its dependencies' bundles.
    ///
    /// Project images, tiles and animations go to the working state, those of
    /// dependencies go to the gallery. Tilemaps are only read from the project
    /// bundle. History is reset and the result becomes the committed state.
    pub fn load_bundles(&mut self, project: &ResourceBundle, dependencies: &[ResourceBundle]) -> LoadSummary {
        let mut summary = LoadSummary::default();

        for dependency in dependencies {
            let inflated = bundle::inflate_bundle(dependency);
            let (assets, skipped) = self.read_images(&inflated, false);
            summary.skipped += skipped;
            for asset in assets {
                self.gallery.add(&asset);
                summary.loaded += 1;
            }
        }

        let inflated = bundle::inflate_bundle(project);
        let (assets, skipped) = self.read_images(&inflated, true);
        summary.skipped += skipped;
        for asset in assets {
            self.state.add(&asset);
            summary.loaded += 1;
        }

        summary.merge(self.read_tilemaps(&inflated, &HashMap::new()));

        self.committed_state = self.state.clone();
        self.history.clear();
        self.needs_rebuild = true;

        info!(
            "Loaded {} assets ({} skipped) from {} bundle(s)",
            summary.loaded,
            summary.skipped,
            dependencies.len() + 1
        );
        summary
    }

    /// Add the tiles and tilemaps of `bundle` to an existing project.
    ///
    /// Tile ids already in use are replaced by fresh ones and the tilemaps are
    /// remapped to match. With `skip_duplicates`, a tile whose pixels match an
    /// existing project tile reuses that tile instead.
    pub fn load_tilemap_bundle(&mut self, bundle: &ResourceBundle, skip_duplicates: bool) -> LoadSummary {
        self.on_change();
        let inflated = bundle::inflate_bundle(bundle);
        let (assets, skipped) = self.read_images(&inflated, true);
        let mut summary = LoadSummary { loaded: 0, skipped };
        let mut mapping: HashMap<String, String> = HashMap::new();

        for asset in assets {
            let Asset::Tile(tile) = asset else {
                continue;
            };

            if skip_duplicates {
                if let Some(existing) = self.resolve_tile_by_bitmap(&tile.bitmap) {
                    debug!("Reusing tile {} for {}", existing.id, tile.id);
                    mapping.insert(tile.id, existing.id);
                    continue;
                }
            }

            let created = self.create_new_tile(tile.bitmap, Some(&tile.id), tile.meta.display_name());
            if created.id != tile.id {
                debug!("Remapped tile {} to {}", tile.id, created.id);
                mapping.insert(tile.id, created.id);
            }
            summary.loaded += 1;
        }

        summary.merge(self.read_tilemaps(&inflated, &mapping));
        info!(
            "Loaded {} tileset entries ({} skipped)",
            summary.loaded, summary.skipped
        );
        summary
    }

    /// Add the images, tiles and animations of `bundle` to the working state.
    pub fn load_assets_bundle(&mut self, bundle: &ResourceBundle) -> LoadSummary {
        let inflated = bundle::inflate_bundle(bundle);
        let (assets, skipped) = self.read_images(&inflated, true);

        if !assets.is_empty() {
            self.on_change();
        }
        for asset in &assets {
            self.state.add(asset);
        }

        let summary = LoadSummary {
            loaded: assets.len(),
            skipped,
        };
        info!("Loaded {} assets ({} skipped)", summary.loaded, summary.skipped);
        summary
    }

    /// Decode every image, tile and animation entry. Returns the assets and
    /// the number of entries skipped.
    fn read_images(&mut self, entries: &BTreeMap<String, JRes>, is_project: bool) -> (Vec<Asset>, usize) {
        let mut assets = Vec::new();
        let mut pending = Vec::new();
        let mut skipped = 0;

        for entry in entries.values() {
            let decoded = if entry.is_tile() {
                self.generate_tile(entry, is_project).map(Asset::Tile)
            } else if entry.mime_type == IMAGE_MIME_TYPE {
                self.generate_image(entry).map(Asset::Image)
            } else if entry.mime_type == ANIMATION_MIME_TYPE {
                if entry.is_json_encoded() {
                    match self.generate_json_animation(entry) {
                        Ok(animation) => {
                            pending.push(animation);
                            continue;
                        }
                        Err(e) => Err(e),
                    }
                } else {
                    self.generate_animation(entry).map(Asset::Animation)
                }
            } else {
                continue;
            };

            match decoded {
                Ok(asset) => assets.push(asset),
                Err(e) => {
                    warn!("Skipping bundle entry {}: {}", entry.id, e);
                    skipped += 1;
                }
            }
        }

        for animation in pending {
            match inflate_animation(animation, &assets) {
                Ok(animation) => assets.push(Asset::Animation(animation)),
                Err((animation_id, frame_id)) => {
                    warn!("Skipping animation {}: unknown frame {}", animation_id, frame_id);
                    skipped += 1;
                }
            }
        }

        (assets, skipped)
    }

    /// Decode every tilemap entry into the working state. Tileset ids are
    /// passed through `mapping` before being resolved.
    fn read_tilemaps(&mut self, entries: &BTreeMap<String, JRes>, mapping: &HashMap<String, String>) -> LoadSummary {
        let mut summary = LoadSummary::default();

        for entry in entries.values().filter(|e| e.mime_type == TILEMAP_MIME_TYPE) {
            let decoded = bundle::decode_tilemap_entry(entry, |id| {
                let id = mapping.get(id).map(String::as_str).unwrap_or(id);
                self.resolve_tile(id)
            });

            let data = match decoded {
                Ok(data) => data,
                Err(e) => {
                    warn!("Skipping tilemap {}: {}", entry.id, e);
                    summary.skipped += 1;
                    continue;
                }
            };

            let display_name = entry
                .display_name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| entry.id.clone());
            let tilemap = ProjectTilemap {
                internal_id: self.get_new_internal_id(),
                id: entry.id.clone(),
                meta: metadata(entry, Some(display_name)),
                data,
            };
            self.state.tilemaps.add(&tilemap);
            summary.loaded += 1;
        }

        summary
    }

    fn generate_image(&mut self, entry: &JRes) -> Result<ProjectImage> {
        let bitmap = bundle::decode_image_entry(entry)?;
        let mut image = ProjectImage::new(self.get_new_internal_id(), entry.id.clone(), bitmap);
        image.jres_data = entry.data.clone();
        image.meta = metadata(entry, entry.display_name.clone());
        Ok(image)
    }

    fn generate_tile(&mut self, entry: &JRes, is_project: bool) -> Result<Tile> {
        let bitmap = bundle::decode_image_entry(entry)?;
        let mut tile = Tile::new(self.get_new_internal_id(), entry.id.clone(), bitmap);
        tile.jres_data = entry.data.clone();
        tile.meta = metadata(entry, entry.display_name.clone());
        tile.is_project_tile = is_project;
        Ok(tile)
    }

    fn generate_animation(&mut self, entry: &JRes) -> Result<Animation> {
        let (id, data) = bundle::decode_animation_entry(entry)?;
        let mut animation = Animation::new(self.get_new_internal_id(), id, data.frames, data.interval);
        animation.frame_size = (data.width, data.height);
        animation.meta = metadata(entry, entry.display_name.clone());
        Ok(animation)
    }

    fn generate_json_animation(&mut self, entry: &JRes) -> Result<Animation> {
        let (id, parsed) = bundle::decode_json_animation_entry(entry)?;
        let mut animation = Animation::new(self.get_new_internal_id(), id, Vec::new(), JSON_ANIMATION_INTERVAL);
        animation.meta = metadata(entry, entry.display_name.clone());
        animation.frame_ids = parsed.frames;
        animation.flipped_horizontal = parsed.flipped_horizontal;
        Ok(animation)
    }
}

fn metadata(entry: &JRes, display_name: Option<String>) -> AssetMetadata {
    AssetMetadata {
        display_name,
        tags: entry.tags.clone().unwrap_or_default(),
        ..Default::default()
    }
}

/// Fill in frames from the image or tile with each frame id. On failure
/// returns the animation id and the missing frame id.
fn inflate_animation(mut animation: Animation, assets: &[Asset]) -> std::result::Result<Animation, (String, String)> {
    let mut frames = Vec::with_capacity(animation.frame_ids.len());

    for frame_id in &animation.frame_ids {
        let bitmap = assets.iter().find_map(|asset| match asset {
            Asset::Image(image) if image.id == *frame_id => Some(&image.bitmap),
            Asset::Tile(tile) if tile.id == *frame_id => Some(&tile.bitmap),
            _ => None,
        });

        match bitmap {
            Some(bitmap) if animation.flipped_horizontal => frames.push(bitmap.flipped_horizontal()),
            Some(bitmap) => frames.push(bitmap.clone()),
            None => return Err((animation.id.clone(), frame_id.clone())),
        }
    }

    animation.frames = frames;
    Ok(animation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetType;
    use crate::sprite::Bitmap;

    fn image_data(color: u8) -> String {
        let mut bitmap = Bitmap::new(2, 2);
        bitmap.set(1, 0, color);
        bitmap.to_jres_data()
    }

    #[test]
    fn test_json_animation_inflation() {
        let json = format!(
            r#"{{
                "*": {{ "mimeType": "image/x-mkcd-f4", "dataEncoding": "base64", "namespace": "myImages" }},
                "frame1": "{}",
                "frame2": "{}",
                "walk": {{
                    "id": "walk",
                    "namespace": "myAnimations",
                    "mimeType": "application/mkcd-animation",
                    "dataEncoding": "json",
                    "data": "{{\"frames\":[\"myImages.frame1\",\"myImages.frame2\"],\"flippedHorizontal\":true}}"
                }}
            }}"#,
            image_data(3),
            image_data(5)
        );
        let bundle = bundle::parse_bundle(&json).unwrap();

        let mut project = AssetProject::new();
        let summary = project.load_assets_bundle(&bundle);
        assert_eq!(summary, LoadSummary { loaded: 3, skipped: 0 });

        let Asset::Animation(walk) = project
            .lookup_asset(AssetType::Animation, "myAnimations.walk")
            .unwrap()
        else {
            panic!("expected an animation");
        };
        assert_eq!(walk.interval, JSON_ANIMATION_INTERVAL);
        assert_eq!(walk.frames.len(), 2);
        // pixel (1, 0) lands on (0, 0) after the flip
        assert_eq!(walk.frames[0].get(0, 0), 3);
        assert_eq!(walk.frames[1].get(0, 0), 5);
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let json = format!(
            r#"{{
                "*": {{ "mimeType": "image/x-mkcd-f4", "namespace": "myImages" }},
                "good": "{}",
                "bad": "%%%",
                "anim": {{ "mimeType": "application/mkcd-animation", "dataEncoding": "json", "data": "{{\"frames\":[\"myImages.missing\"]}}" }}
            }}"#,
            image_data(1)
        );
        let bundle = bundle::parse_bundle(&json).unwrap();

        let mut project = AssetProject::new();
        let summary = project.load_assets_bundle(&bundle);
        assert_eq!(summary, LoadSummary { loaded: 1, skipped: 2 });
        assert!(project.lookup_asset(AssetType::Image, "myImages.good").is_some());
    }

    #[test]
    fn test_dependencies_go_to_gallery() {
        let dependency = bundle::parse_bundle(&format!(
            r#"{{ "*": {{ "mimeType": "image/x-mkcd-f4", "namespace": "sprites.castle" }}, "tileGrass1": {{ "data": "{}", "tilemapTile": true }} }}"#,
            image_data(7)
        ))
        .unwrap();

        let mut project = AssetProject::new();
        project.load_bundles(&ResourceBundle::new(), &[dependency]);

        assert!(project.get_assets(AssetType::Tile).is_empty());
        let gallery = project.get_gallery_assets(AssetType::Tile);
        assert_eq!(gallery.len(), 1);
        let Asset::Tile(tile) = &gallery[0] else {
            panic!("expected a tile");
        };
        assert_eq!(tile.id, "sprites.castle.tileGrass1");
        assert!(!tile.is_project_tile);

        assert!(project.resolve_tile("sprites.castle.tileGrass1").is_some());
        assert!(project.is_name_taken(AssetType::Tile, "sprites.castle.tileGrass1"));
    }
}
