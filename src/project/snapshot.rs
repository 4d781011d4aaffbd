//! One version of every asset collection in a project.

use crate::assets::{
    Animation, Asset, AssetCollection, AssetKind, AssetMetadata, AssetType, InternalId,
    ListenerId, ProjectImage, ProjectTilemap, Tile,
};

/// The four collections of a project plus the revision they correspond to.
#[derive(Debug, Clone, Default)]
pub struct AssetSnapshot {
    pub revision: u32,
    pub tiles: AssetCollection<Tile>,
    pub images: AssetCollection<ProjectImage>,
    pub tilemaps: AssetCollection<ProjectTilemap>,
    pub animations: AssetCollection<Animation>,
}

macro_rules! with_collection {
    ($snapshot:expr, $kind:expr, |$c:ident| $body:expr) => {
        match $kind {
            AssetType::Image => {
                let $c = &$snapshot.images;
                $body
            }
            AssetType::Tile => {
                let $c = &$snapshot.tiles;
                $body
            }
            AssetType::Tilemap => {
                let $c = &$snapshot.tilemaps;
                $body
            }
            AssetType::Animation => {
                let $c = &$snapshot.animations;
                $body
            }
        }
    };
}

impl AssetSnapshot {
    pub fn new(revision: u32) -> Self {
        Self {
            revision,
            ..Default::default()
        }
    }

    /// Total number of assets across all kinds.
    pub fn len(&self) -> usize {
        self.tiles.len() + self.images.len() + self.tilemaps.len() + self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_id_taken(&self, kind: AssetType, name: &str) -> bool {
        with_collection!(self, kind, |c| c.is_id_taken(name))
    }

    pub fn get_by_id(&self, kind: AssetType, id: &str) -> Option<Asset> {
        with_collection!(self, kind, |c| c.get_by_id(id).map(AssetKind::into_asset))
    }

    pub fn get_by_display_name(&self, kind: AssetType, name: &str) -> Option<Asset> {
        with_collection!(self, kind, |c| c
            .get_by_display_name(name)
            .map(AssetKind::into_asset))
    }

    pub fn get_assets(&self, kind: AssetType) -> Vec<Asset> {
        with_collection!(self, kind, |c| c
            .iter()
            .cloned()
            .map(AssetKind::into_asset)
            .collect())
    }

    /// First asset of `kind` whose metadata matches `predicate`.
    pub fn find_by_meta<F>(&self, kind: AssetType, predicate: F) -> Option<Asset>
    where
        F: Fn(&AssetMetadata) -> bool,
    {
        with_collection!(self, kind, |c| c
            .iter()
            .find(|a| predicate(a.meta()))
            .cloned()
            .map(AssetKind::into_asset))
    }

    /// Add or replace an asset, keyed by its id.
    pub fn add(&mut self, asset: &Asset) -> Asset {
        match asset {
            Asset::Image(a) => self.images.add(a).into_asset(),
            Asset::Tile(a) => self.tiles.add(a).into_asset(),
            Asset::Tilemap(a) => self.tilemaps.add(a).into_asset(),
            Asset::Animation(a) => self.animations.add(a).into_asset(),
        }
    }

    pub fn update(&mut self, asset: &Asset) -> Asset {
        match asset {
            Asset::Image(a) => self.images.update(&a.id, a).into_asset(),
            Asset::Tile(a) => self.tiles.update(&a.id, a).into_asset(),
            Asset::Tilemap(a) => self.tilemaps.update(&a.id, a).into_asset(),
            Asset::Animation(a) => self.animations.update(&a.id, a).into_asset(),
        }
    }

    pub fn remove_by_id(&mut self, kind: AssetType, id: &str) {
        match kind {
            AssetType::Image => self.images.remove_by_id(id),
            AssetType::Tile => self.tiles.remove_by_id(id),
            AssetType::Tilemap => self.tilemaps.remove_by_id(id),
            AssetType::Animation => self.animations.remove_by_id(id),
        }
    }

    pub fn add_listener<F>(&mut self, asset: &Asset, callback: F) -> ListenerId
    where
        F: FnMut(InternalId) + 'static,
    {
        let internal_id = asset.internal_id();
        match asset.asset_type() {
            AssetType::Image => self.images.add_listener(internal_id, callback),
            AssetType::Tile => self.tiles.add_listener(internal_id, callback),
            AssetType::Tilemap => self.tilemaps.add_listener(internal_id, callback),
            AssetType::Animation => self.animations.add_listener(internal_id, callback),
        }
    }

    pub fn remove_listener(&mut self, kind: AssetType, listener: ListenerId) -> bool {
        match kind {
            AssetType::Image => self.images.remove_listener(listener),
            AssetType::Tile => self.tiles.remove_listener(listener),
            AssetType::Tilemap => self.tilemaps.remove_listener(listener),
            AssetType::Animation => self.animations.remove_listener(listener),
        }
    }
}
