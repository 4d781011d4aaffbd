//! Asset Project
//!
//! An [`AssetProject`] owns three snapshots:
//! - `state`: the working copy every edit goes to
//! - `committed_state`: the state as of the last undo checkpoint
//! - `gallery`: read-only assets contributed by dependencies
//!
//! Every mutating call bumps the working revision before touching any
//! collection. [`AssetProject::push_undo`] turns the difference between the
//! working and committed revisions into a history entry.

pub mod history;
pub mod loader;
pub mod snapshot;
pub mod usage;

use std::collections::HashSet;

use log::debug;

use crate::assets::{
    names, Animation, Asset, AssetKind, AssetMetadata, AssetType, InternalId, ListenerId,
    ProjectImage, ProjectTilemap, Tile, TileRef, TileSet, TilemapData,
};
use crate::bundle::{self, ResourceBundle, DEFAULTS_KEY};
use crate::config::ProjectConfig;
use crate::error::Result;
use crate::sprite::{
    Bitmap, TileGrid, ANIMATION_NAMESPACE, ANIMATION_PREFIX, IMAGES_NAMESPACE, IMAGE_PREFIX,
    TILEMAP_PREFIX, TILE_NAMESPACE, TILE_PREFIX,
};

pub use history::{SnapshotDiff, UndoHistory};
pub use loader::LoadSummary;
pub use snapshot::AssetSnapshot;

/// Versioned store of a project's images, tiles, tilemaps and animations.
#[derive(Debug)]
pub struct AssetProject {
    state: AssetSnapshot,
    committed_state: AssetSnapshot,
    gallery: AssetSnapshot,
    history: UndoHistory,
    next_id: u32,
    next_internal_id: InternalId,
    needs_rebuild: bool,
    config: ProjectConfig,
}

impl Default for AssetProject {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetProject {
    pub fn new() -> Self {
        Self::with_config(ProjectConfig::default())
    }

    pub fn with_config(config: ProjectConfig) -> Self {
        let mut project = Self {
            state: AssetSnapshot::new(0),
            committed_state: AssetSnapshot::new(0),
            gallery: AssetSnapshot::new(0),
            history: UndoHistory::new(config.max_undo_levels),
            next_id: 0,
            next_internal_id: 0,
            needs_rebuild: true,
            config,
        };
        project.state.revision = project.next_revision();
        project
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Current working revision.
    pub fn revision(&self) -> u32 {
        self.state.revision
    }

    /// True when assets changed since the build pipeline last looked.
    pub fn needs_rebuild(&self) -> bool {
        self.needs_rebuild
    }

    /// Read and clear the rebuild flag.
    pub fn take_needs_rebuild(&mut self) -> bool {
        std::mem::take(&mut self.needs_rebuild)
    }

    pub fn get_new_internal_id(&mut self) -> InternalId {
        let id = self.next_internal_id;
        self.next_internal_id += 1;
        id
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    /// Create a blank image. `size` defaults to the configured image size.
    pub fn create_new_image(&mut self, size: Option<(u16, u16)>) -> ProjectImage {
        self.on_change();
        let (width, height) = size.unwrap_or(self.default_image_size());
        let id = self.generate_new_id(AssetType::Image, IMAGE_PREFIX, Some(IMAGES_NAMESPACE));
        let image = ProjectImage::new(self.get_new_internal_id(), id, Bitmap::new(width, height));
        self.state.images.add(&image)
    }

    pub fn create_new_project_image(&mut self, bitmap: Bitmap, display_name: Option<&str>) -> ProjectImage {
        self.on_change();
        let id = self.generate_new_id(AssetType::Image, IMAGE_PREFIX, Some(IMAGES_NAMESPACE));
        let mut image = ProjectImage::new(self.get_new_internal_id(), id, bitmap);
        image.meta = AssetMetadata::named(display_name.map(str::to_string));
        self.state.images.add(&image)
    }

    /// Create a tile. `id` is used if it is free, otherwise one is generated.
    pub fn create_new_tile(&mut self, bitmap: Bitmap, id: Option<&str>, display_name: Option<&str>) -> Tile {
        self.on_change();
        let id = match id {
            Some(id) if !self.is_name_taken(AssetType::Tile, id) => id.to_string(),
            _ => self.generate_new_id(AssetType::Tile, TILE_PREFIX, Some(TILE_NAMESPACE)),
        };
        let mut tile = Tile::new(self.get_new_internal_id(), id, bitmap);
        tile.meta = AssetMetadata::named(display_name.map(str::to_string));
        self.state.tiles.add(&tile)
    }

    /// Create a single-frame blank animation.
    pub fn create_new_animation(&mut self, size: Option<(u16, u16)>) -> Animation {
        let (width, height) = size.unwrap_or(self.default_image_size());
        self.create_new_animation_from_data(vec![Bitmap::new(width, height)], None, None)
    }

    pub fn create_new_animation_from_data(
        &mut self,
        frames: Vec<Bitmap>,
        interval: Option<u16>,
        display_name: Option<&str>,
    ) -> Animation {
        self.on_change();
        let id = self.generate_new_id(AssetType::Animation, ANIMATION_PREFIX, Some(ANIMATION_NAMESPACE));
        let interval = interval.unwrap_or(self.config.default_animation_interval);
        let mut animation = Animation::new(self.get_new_internal_id(), id, frames, interval);
        animation.meta = AssetMetadata::named(display_name.map(str::to_string));
        self.state.animations.add(&animation)
    }

    /// Create a blank tilemap named after `name` (default `level`).
    /// Returns the generated id and the tilemap data.
    pub fn create_new_tilemap(
        &mut self,
        name: Option<&str>,
        tile_width: u8,
        size: Option<(u16, u16)>,
    ) -> (String, TilemapData) {
        let data = self.blank_tilemap(tile_width, size);
        self.create_new_tilemap_from_data(data, name)
    }

    pub fn create_new_tilemap_from_data(&mut self, data: TilemapData, name: Option<&str>) -> (String, TilemapData) {
        let tilemap = self.add_tilemap(data, name);
        (tilemap.id, tilemap.data)
    }

    /// Empty tilemap data whose tileset holds only the transparency tile.
    pub fn blank_tilemap(&mut self, tile_width: u8, size: Option<(u16, u16)>) -> TilemapData {
        let (width, height) = size.unwrap_or((
            self.config.default_tilemap_width,
            self.config.default_tilemap_height,
        ));
        let transparency = self.get_transparency(tile_width);
        TilemapData::new(
            TileGrid::new(width, height),
            TileSet {
                tile_width,
                tiles: vec![TileRef::Resolved(transparency)],
            },
            TileGrid::new(width, height),
        )
    }

    /// The blank tile of the given width, created on first use.
    pub fn get_transparency(&mut self, tile_width: u8) -> Tile {
        let id = format!("{}.transparency{}", TILE_NAMESPACE, tile_width);
        if let Some(tile) = self.state.tiles.get_by_id(&id) {
            return tile;
        }

        self.on_change();
        let side = u16::from(tile_width);
        let tile = Tile::new(self.get_new_internal_id(), id, Bitmap::new(side, side));
        self.state.tiles.add(&tile)
    }

    fn add_tilemap(&mut self, data: TilemapData, name: Option<&str>) -> ProjectTilemap {
        self.on_change();
        let id = self.generate_new_id(AssetType::Tilemap, name.unwrap_or(TILEMAP_PREFIX), None);
        let tilemap = ProjectTilemap {
            internal_id: self.get_new_internal_id(),
            meta: AssetMetadata::named(Some(id.clone())),
            id,
            data,
        };
        self.state.tilemaps.add(&tilemap)
    }

    // ------------------------------------------------------------------
    // Updates
    // ------------------------------------------------------------------

    /// Replace the tile with the same `internal_id`.
    ///
    /// If the id or pixels changed, every tilemap referencing the tile gets
    /// the new value in its tileset. Returns `None` for unknown tiles.
    pub fn update_tile(&mut self, tile: &Tile) -> Option<Tile> {
        self.on_change();
        let existing = self.resolve_project_tile_by_internal_id(tile.internal_id)?;
        let stored = self.state.tiles.update(&existing.id, tile);

        if existing.id != tile.id || existing.bitmap != tile.bitmap {
            let affected = self
                .state
                .tilemaps
                .filter_snapshot(|tm| tm.data.tileset.references(tile.internal_id));
            for mut tilemap in affected {
                for slot in tilemap.data.tileset.tiles.iter_mut() {
                    if slot.internal_id() == Some(tile.internal_id) {
                        *slot = TileRef::Resolved(stored.clone());
                    }
                }
                self.update_tilemap(&tilemap.id, tilemap.data);
            }
        }

        Some(stored)
    }

    /// Replace a tilemap's data. Returns `None` if `id` is unknown.
    pub fn update_tilemap(&mut self, id: &str, data: TilemapData) -> Option<ProjectTilemap> {
        let existing = self.state.tilemaps.get_by_id(id)?;
        self.on_change();
        let updated = ProjectTilemap { data, ..existing };
        Some(self.state.tilemaps.update(id, &updated))
    }

    /// Replace an asset by id. Tiles go through [`update_tile`](Self::update_tile).
    pub fn update_asset(&mut self, asset: &Asset) -> Option<Asset> {
        self.on_change();
        match asset {
            Asset::Tile(tile) => self.update_tile(tile).map(Asset::Tile),
            other => Some(self.state.update(other)),
        }
    }

    pub fn delete_tile(&mut self, id: &str) {
        self.on_change();
        self.state.tiles.remove_by_id(id);
    }

    /// Copy an asset under a freshly generated id.
    pub fn duplicate_asset(&mut self, asset: &Asset) -> Asset {
        self.on_change();
        let display_name = asset.meta().display_name().map(str::to_string);
        let display_name = display_name.as_deref();

        match asset {
            Asset::Image(image) => self
                .create_new_project_image(image.bitmap.clone(), display_name)
                .into_asset(),
            Asset::Tile(tile) => self
                .create_new_tile(tile.bitmap.clone(), None, display_name)
                .into_asset(),
            Asset::Tilemap(tilemap) => self
                .add_tilemap(tilemap.data.clone(), display_name)
                .into_asset(),
            Asset::Animation(animation) => self
                .create_new_animation_from_data(
                    animation.frames.clone(),
                    Some(animation.interval),
                    display_name,
                )
                .into_asset(),
        }
    }

    pub fn remove_asset(&mut self, asset: &Asset) {
        self.on_change();
        self.state.remove_by_id(asset.asset_type(), asset.id());
    }

    /// Mark the project changed without touching any asset.
    pub fn force_update(&mut self) {
        self.on_change();
    }

    /// Drop unnamed assets whose block ids are all inactive, and prune
    /// inactive block ids from the rest.
    pub fn remove_inactive_block_assets(&mut self, active_block_ids: &[String]) {
        let active: HashSet<&str> = active_block_ids.iter().map(String::as_str).collect();

        let candidates: Vec<Asset> = AssetType::ALL
            .iter()
            .flat_map(|kind| self.state.get_assets(*kind))
            .filter(|asset| {
                asset.meta().display_name().is_none()
                    && asset
                        .meta()
                        .block_ids
                        .iter()
                        .any(|id| !active.contains(id.as_str()))
            })
            .collect();

        if candidates.is_empty() {
            return;
        }
        self.on_change();

        for asset in candidates {
            let remaining: Vec<String> = asset
                .meta()
                .block_ids
                .iter()
                .filter(|id| active.contains(id.as_str()))
                .cloned()
                .collect();

            if remaining.is_empty() {
                debug!("Removing inactive block asset {}", asset.id());
                self.state.remove_by_id(asset.asset_type(), asset.id());
            } else {
                self.state.update(&with_block_ids(asset, remaining));
            }
        }
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    pub fn get_project_images(&self) -> Vec<ProjectImage> {
        self.state.images.get_snapshot()
    }

    /// Project tiles of the given width. With `create_if_missing`, a blank tile
    /// is created when there are none.
    pub fn get_project_tiles(&mut self, tile_width: u8, create_if_missing: bool) -> Option<TileSet> {
        let width = u16::from(tile_width);
        let tiles = self.state.tiles.filter_snapshot(|t| t.bitmap.width() == width);

        if tiles.is_empty() {
            if create_if_missing {
                self.create_new_tile(Bitmap::new(width, width), None, None);
                return self.get_project_tiles(tile_width, false);
            }
            return None;
        }

        Some(TileSet {
            tile_width,
            tiles: tiles.into_iter().map(TileRef::Resolved).collect(),
        })
    }

    pub fn get_tilemap(&self, id: &str) -> Option<ProjectTilemap> {
        self.state.tilemaps.get_by_id(id)
    }

    /// Project or gallery tile by id.
    pub fn resolve_tile(&self, id: &str) -> Option<Tile> {
        self.state
            .tiles
            .get_by_id(id)
            .or_else(|| self.gallery.tiles.get_by_id(id))
    }

    pub fn resolve_project_tile_by_internal_id(&self, internal_id: InternalId) -> Option<Tile> {
        self.state.tiles.get_by_internal_id(internal_id)
    }

    /// A project tile with exactly these pixels.
    pub fn resolve_tile_by_bitmap(&self, bitmap: &Bitmap) -> Option<Tile> {
        let hash = bitmap.content_hash();
        self.state
            .tiles
            .iter()
            .find(|tile| tile.bitmap.content_hash() == hash)
            .cloned()
    }

    /// Project asset by id, falling back to the gallery.
    pub fn lookup_asset(&self, kind: AssetType, id: &str) -> Option<Asset> {
        self.state
            .get_by_id(kind, id)
            .or_else(|| self.gallery.get_by_id(kind, id))
    }

    /// Project asset by display name or short id.
    pub fn lookup_asset_by_name(&self, kind: AssetType, name: &str) -> Option<Asset> {
        self.state.get_by_display_name(kind, name)
    }

    /// First project asset attached to `block_id`.
    pub fn lookup_block_asset(&self, kind: AssetType, block_id: &str) -> Option<Asset> {
        self.state
            .find_by_meta(kind, |meta| meta.block_ids.iter().any(|id| id == block_id))
    }

    /// Resolve a source expression such as ``assets.image`hero` ``.
    pub fn lookup_project_asset_by_ts_reference(&self, text: &str) -> Option<Asset> {
        let (kind, name) = names::parse_ts_reference(text)?;
        match kind {
            AssetType::Tilemap => self
                .lookup_asset_by_name(kind, &name)
                .or_else(|| self.lookup_asset(kind, &name)),
            _ => self.lookup_asset_by_name(kind, &name),
        }
    }

    pub fn get_assets(&self, kind: AssetType) -> Vec<Asset> {
        self.state.get_assets(kind)
    }

    pub fn get_gallery_assets(&self, kind: AssetType) -> Vec<Asset> {
        self.gallery.get_assets(kind)
    }

    /// Every project asset, tiles first.
    pub fn get_all_assets(&self) -> Vec<Asset> {
        AssetType::ALL
            .iter()
            .flat_map(|kind| self.state.get_assets(*kind))
            .collect()
    }

    // ------------------------------------------------------------------
    // Naming
    // ------------------------------------------------------------------

    /// True if `name`, or its short id, is reserved in the project or gallery.
    pub fn is_name_taken(&self, kind: AssetType, name: &str) -> bool {
        let taken = |n: &str| self.state.is_id_taken(kind, n) || self.gallery.is_id_taken(kind, n);

        let short = names::short_id_for(kind, name, false);
        let check_short = short.as_deref().is_some_and(|s| s != name);

        taken(name) || (check_short && short.as_deref().is_some_and(taken))
    }

    /// First free `namespace.prefixN` for `N = 1, 2, ...`. Trailing digits on
    /// `prefix` are ignored.
    pub fn generate_new_id(&self, kind: AssetType, prefix: &str, namespace: Option<&str>) -> String {
        let prefix = prefix.trim_end_matches(|c: char| c.is_ascii_digit());
        let prefix = match namespace {
            Some(ns) if !ns.is_empty() => format!("{ns}.{prefix}"),
            _ => prefix.to_string(),
        };

        let mut index = 1;
        while self.is_name_taken(kind, &format!("{prefix}{index}")) {
            index += 1;
        }
        format!("{prefix}{index}")
    }

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    /// Call `callback` whenever the working copy of `asset` changes.
    pub fn add_change_listener<F>(&mut self, asset: &Asset, callback: F) -> ListenerId
    where
        F: FnMut(InternalId) + 'static,
    {
        self.state.add_listener(asset, callback)
    }

    pub fn remove_change_listener(&mut self, kind: AssetType, listener: ListenerId) -> bool {
        self.state.remove_listener(kind, listener)
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Checkpoint the working state. Does nothing if nothing changed since
    /// the last checkpoint.
    pub fn push_undo(&mut self) {
        if self.state.revision == self.committed_state.revision {
            return;
        }

        let diff = SnapshotDiff::between(&self.committed_state, &self.state);
        debug!(
            "[HISTORY] Checkpoint {} -> {} ({} changes)",
            diff.before_revision,
            diff.after_revision,
            diff.len()
        );
        self.history.push(diff);
        self.committed_state = self.state.clone();
        self.cleanup_temporary_assets();
    }

    /// Revert the most recent checkpoint. Uncommitted edits are checkpointed
    /// first. Returns `Ok(false)` if there was nothing to undo.
    pub fn undo(&mut self) -> Result<bool> {
        if self.state.revision != self.committed_state.revision {
            self.push_undo();
        }

        let Some(diff) = self.history.pop_undo() else {
            return Ok(false);
        };

        if let Err(err) = diff.apply(&mut self.state, true) {
            self.history.push_redone(diff);
            return Err(err);
        }
        debug!("[HISTORY] Undo to revision {}", diff.before_revision);
        self.history.push_redo(diff);
        self.committed_state = self.state.clone();
        self.needs_rebuild = true;
        Ok(true)
    }

    /// Reapply the most recently undone checkpoint. Returns `Ok(false)` if
    /// there was nothing to redo.
    pub fn redo(&mut self) -> Result<bool> {
        let Some(diff) = self.history.pop_redo() else {
            return Ok(false);
        };

        if let Err(err) = diff.apply(&mut self.state, false) {
            self.history.push_redo(diff);
            return Err(err);
        }
        debug!("[HISTORY] Redo to revision {}", diff.after_revision);
        self.history.push_redone(diff);
        self.committed_state = self.state.clone();
        self.needs_rebuild = true;
        Ok(true)
    }

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo() || self.state.revision != self.committed_state.revision
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ------------------------------------------------------------------
    // Bundle export
    // ------------------------------------------------------------------

    /// Tiles and tilemaps as a resource bundle.
    pub fn get_project_tileset_bundle(&self) -> Result<ResourceBundle> {
        let mut out = ResourceBundle::new();
        self.state.tiles.to_bundle(&mut out)?;
        self.state.tilemaps.to_bundle(&mut out)?;
        out.insert(DEFAULTS_KEY.to_string(), bundle::defaults_entry(TILE_NAMESPACE));
        Ok(out)
    }

    /// Images and animations as a resource bundle.
    pub fn get_project_assets_bundle(&self) -> Result<ResourceBundle> {
        let mut out = ResourceBundle::new();
        self.state.images.to_bundle(&mut out)?;
        self.state.animations.to_bundle(&mut out)?;
        out.insert(DEFAULTS_KEY.to_string(), bundle::defaults_entry(IMAGES_NAMESPACE));
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn on_change(&mut self) {
        self.needs_rebuild = true;
        self.state.revision = self.next_revision();
    }

    fn next_revision(&mut self) -> u32 {
        let revision = self.next_id;
        self.next_id += 1;
        revision
    }

    fn default_image_size(&self) -> (u16, u16) {
        (self.config.default_image_width, self.config.default_image_height)
    }

    /// Images with no display name and no block ids only live until the
    /// next checkpoint.
    fn cleanup_temporary_assets(&mut self) {
        let orphaned = self
            .state
            .images
            .filter_snapshot(|image| image.meta.display_name().is_none() && image.meta.block_ids.is_empty());
        for image in orphaned {
            debug!("Dropping temporary image {}", image.id);
            self.state.images.remove_by_id(&image.id);
        }
    }
}

fn with_block_ids(asset: Asset, block_ids: Vec<String>) -> Asset {
    match asset {
        Asset::Image(mut a) => {
            a.meta.block_ids = block_ids;
            Asset::Image(a)
        }
        Asset::Tile(mut a) => {
            a.meta.block_ids = block_ids;
            Asset::Tile(a)
        }
        Asset::Tilemap(mut a) => {
            a.meta.block_ids = block_ids;
            Asset::Tilemap(a)
        }
        Asset::Animation(mut a) => {
            a.meta.block_ids = block_ids;
            Asset::Animation(a)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(project: &mut AssetProject, name: &str) -> ProjectImage {
        project.create_new_project_image(Bitmap::new(4, 4), Some(name))
    }

    #[test]
    fn test_generate_new_id_counts_from_one() {
        let mut project = AssetProject::new();
        assert_eq!(
            project.generate_new_id(AssetType::Tile, "tile", Some(TILE_NAMESPACE)),
            "myTiles.tile1"
        );

        project.create_new_tile(Bitmap::new(16, 16), None, None);
        assert_eq!(
            project.generate_new_id(AssetType::Tile, "tile42", Some(TILE_NAMESPACE)),
            "myTiles.tile2"
        );
    }

    #[test]
    fn test_is_name_taken_checks_short_id() {
        let mut project = AssetProject::new();
        let image = named(&mut project, "hero");
        assert_eq!(image.id, "myImages.image1");

        assert!(project.is_name_taken(AssetType::Image, "myImages.image1"));
        assert!(project.is_name_taken(AssetType::Image, "image1"));
        assert!(project.is_name_taken(AssetType::Image, "hero"));
        assert!(!project.is_name_taken(AssetType::Tile, "image1"));
    }

    #[test]
    fn test_mutations_bump_revision() {
        let mut project = AssetProject::new();
        assert!(project.take_needs_rebuild());
        assert!(!project.needs_rebuild());

        let start = project.revision();
        project.force_update();
        assert!(project.revision() > start);
        assert!(project.needs_rebuild());
    }

    #[test]
    fn test_transparency_tile_is_shared() {
        let mut project = AssetProject::new();
        let first = project.get_transparency(16);
        let second = project.get_transparency(16);
        assert_eq!(first.id, "myTiles.transparency16");
        assert_eq!(first.internal_id, second.internal_id);
        assert_eq!(first.bitmap.width(), 16);
    }

    #[test]
    fn test_create_tilemap_uses_id_as_display_name() {
        let mut project = AssetProject::new();
        let (id, data) = project.create_new_tilemap(None, 8, Some((4, 3)));
        assert_eq!(id, "level1");
        assert_eq!(data.tilemap.width(), 4);
        assert_eq!(data.tileset.tile_ids(), vec!["myTiles.transparency8"]);

        let stored = project.get_tilemap(&id).unwrap();
        assert_eq!(stored.meta.display_name.as_deref(), Some("level1"));

        let (second, _) = project.create_new_tilemap(Some("level1"), 8, None);
        assert_eq!(second, "level2");
    }

    #[test]
    fn test_failed_undo_and_redo_keep_history() {
        let mut project = AssetProject::new();
        let hero = named(&mut project, "hero");
        project.push_undo();
        let revision = project.revision();

        let mut conflicting = AssetSnapshot::new(revision);
        conflicting
            .images
            .add(&ProjectImage::new(99, hero.id.clone(), Bitmap::new(2, 2)));
        let empty = AssetSnapshot::new(revision);

        project.history.push(SnapshotDiff::between(&conflicting, &empty));
        assert!(project.undo().is_err());
        assert_eq!(project.history().undo_count(), 2);
        assert_eq!(project.get_assets(AssetType::Image).len(), 1);

        project.history.clear();
        project.history.push_redo(SnapshotDiff::between(&empty, &conflicting));
        assert!(project.redo().is_err());
        assert_eq!(project.history().redo_count(), 1);
        assert_eq!(project.get_assets(AssetType::Image).len(), 1);
        assert_eq!(project.revision(), revision);
    }

    #[test]
    fn test_create_tile_keeps_free_id() {
        let mut project = AssetProject::new();
        let tile = project.create_new_tile(Bitmap::new(8, 8), Some("myTiles.grass"), None);
        assert_eq!(tile.id, "myTiles.grass");

        let clash = project.create_new_tile(Bitmap::new(8, 8), Some("myTiles.grass"), None);
        assert_eq!(clash.id, "myTiles.tile1");
    }

    #[test]
    fn test_get_project_tiles_creates_when_missing() {
        let mut project = AssetProject::new();
        assert!(project.get_project_tiles(16, false).is_none());

        let tileset = project.get_project_tiles(16, true).unwrap();
        assert_eq!(tileset.tile_width, 16);
        assert_eq!(tileset.tiles.len(), 1);
    }

    #[test]
    fn test_duplicate_asset_renames_display_name() {
        let mut project = AssetProject::new();
        let image = named(&mut project, "hero");
        let copy = project.duplicate_asset(&Asset::Image(image.clone()));

        assert_ne!(copy.id(), image.id);
        assert_ne!(copy.internal_id(), image.internal_id);
        assert_eq!(copy.meta().display_name(), Some("hero0"));
    }

    #[test]
    fn test_lookup_block_asset() {
        let mut project = AssetProject::new();
        let mut image = named(&mut project, "hero");
        image.meta.block_ids.push("block-7".to_string());
        project.update_asset(&Asset::Image(image.clone()));

        let found = project.lookup_block_asset(AssetType::Image, "block-7").unwrap();
        assert_eq!(found.internal_id(), image.internal_id);
        assert!(project.lookup_block_asset(AssetType::Tile, "block-7").is_none());
    }

    #[test]
    fn test_lookup_by_ts_reference() {
        let mut project = AssetProject::new();
        named(&mut project, "hero");
        project.create_new_tilemap(None, 16, None);

        let image = project.lookup_project_asset_by_ts_reference("assets.image`hero`").unwrap();
        assert_eq!(image.id(), "myImages.image1");

        let tilemap = project.lookup_project_asset_by_ts_reference("tilemap`level1`").unwrap();
        assert_eq!(tilemap.asset_type(), AssetType::Tilemap);

        assert!(project.lookup_project_asset_by_ts_reference("not an asset").is_none());
    }

    #[test]
    fn test_remove_inactive_block_assets() {
        let mut project = AssetProject::new();

        let mut gone = project.create_new_tile(Bitmap::new(8, 8), None, None);
        gone.meta.block_ids = vec!["old".to_string()];
        project.update_tile(&gone);

        let mut pruned = project.create_new_tile(Bitmap::new(8, 8), None, None);
        pruned.meta.block_ids = vec!["old".to_string(), "live".to_string()];
        project.update_tile(&pruned);

        let mut kept = project.create_new_tile(Bitmap::new(8, 8), None, Some("grass"));
        kept.meta.block_ids = vec!["old".to_string()];
        project.update_tile(&kept);

        project.remove_inactive_block_assets(&["live".to_string()]);

        assert!(project.resolve_tile(&gone.id).is_none());
        assert_eq!(
            project.resolve_tile(&pruned.id).unwrap().meta.block_ids,
            vec!["live".to_string()]
        );
        assert_eq!(
            project.resolve_tile(&kept.id).unwrap().meta.block_ids,
            vec!["old".to_string()]
        );
    }

    #[test]
    fn test_bundle_exports_include_defaults() {
        let mut project = AssetProject::new();
        project.create_new_tilemap(None, 16, None);
        named(&mut project, "hero");

        let tileset = project.get_project_tileset_bundle().unwrap();
        assert!(tileset.contains_key("*"));
        assert!(tileset.contains_key("transparency16"));
        assert!(tileset.contains_key("level1"));

        let assets = project.get_project_assets_bundle().unwrap();
        assert!(assets.contains_key("*"));
        assert!(assets.contains_key("image1"));
    }
}
