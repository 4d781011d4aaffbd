//! Asset Collection
//!
//! An ordered store of one asset kind. Ids, short ids and display names are
//! reserved in a name index for O(1) uniqueness checks. Every value going in
//! or out is cloned, so callers never alias stored state.
//!
//! Change listeners are keyed by `internal_id`. Notifications are queued while
//! a mutating call runs and delivered once its bookkeeping is complete; the
//! `&mut self` receiver keeps callbacks from re-entering the collection.

use std::collections::HashSet;
use std::fmt;

use log::debug;

use super::{AssetKind, InternalId};
use crate::bundle::{self, ResourceBundle};
use crate::error::{AssetError, Result};

/// Handle returned by [`AssetCollection::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ListenerCallback = Box<dyn FnMut(InternalId)>;

struct AssetListener {
    id: ListenerId,
    internal_id: InternalId,
    callback: ListenerCallback,
}

/// The changed slots between two versions of a collection.
///
/// Position `i` of `before` and `after` describes one asset. `None` on one side
/// marks a pure addition or removal.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionDiff<U> {
    pub before: Vec<Option<U>>,
    pub after: Vec<Option<U>>,
}

impl<U> Default for CollectionDiff<U> {
    fn default() -> Self {
        Self {
            before: Vec::new(),
            after: Vec::new(),
        }
    }
}

impl<U> CollectionDiff<U> {
    pub fn len(&self) -> usize {
        self.before.len()
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty()
    }

    fn push(&mut self, before: Option<U>, after: Option<U>) {
        self.before.push(before);
        self.after.push(after);
    }
}

/// Ordered keyed store of one asset kind.
pub struct AssetCollection<U: AssetKind> {
    assets: Vec<U>,
    taken_names: HashSet<String>,
    listeners: Vec<AssetListener>,
    next_listener_id: u64,
    pending: Vec<InternalId>,
}

impl<U: AssetKind> Default for AssetCollection<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: AssetKind> Clone for AssetCollection<U> {
    /// Deep-copies assets and the name index. Listeners stay with the original.
    fn clone(&self) -> Self {
        Self {
            assets: self.assets.clone(),
            taken_names: self.taken_names.clone(),
            listeners: Vec::new(),
            next_listener_id: self.next_listener_id,
            pending: Vec::new(),
        }
    }
}

impl<U: AssetKind> fmt::Debug for AssetCollection<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetCollection")
            .field("kind", &U::ASSET_TYPE)
            .field("assets", &self.assets)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<U: AssetKind> AssetCollection<U> {
    pub fn new() -> Self {
        Self {
            assets: Vec::new(),
            taken_names: HashSet::new(),
            listeners: Vec::new(),
            next_listener_id: 0,
            pending: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Store a copy of `asset` and return another copy.
    ///
    /// If the id is already bound this behaves as [`update`](Self::update). A
    /// display name that is already taken gets a numeric suffix.
    pub fn add(&mut self, asset: &U) -> U {
        let stored = self.add_core(asset);
        self.flush_notifications();
        stored
    }

    /// Replace the asset bound to `id` with `new_value`.
    ///
    /// Unknown ids are added. A value equal to the stored one is a no-op. Either
    /// way the result is a fresh copy, never `new_value` itself.
    pub fn update(&mut self, id: &str, new_value: &U) -> U {
        let stored = self.update_core(id, new_value);
        self.flush_notifications();
        stored
    }

    /// Remove the asset bound to `id` and release its names.
    pub fn remove_by_id(&mut self, id: &str) {
        let Some(index) = self.position_by_id(id) else {
            return;
        };

        let existing = self.assets.remove(index);
        self.release_names(&existing);
    }

    pub fn get_by_id(&self, id: &str) -> Option<U> {
        self.lookup_by_id(id).cloned()
    }

    /// Look up by display name or short id.
    pub fn get_by_display_name(&self, name: &str) -> Option<U> {
        if !self.taken_names.contains(name) {
            return None;
        }

        self.assets
            .iter()
            .find(|asset| {
                asset.meta().display_name() == Some(name)
                    || asset.short_id().as_deref() == Some(name)
            })
            .cloned()
    }

    pub fn get_by_internal_id(&self, internal_id: InternalId) -> Option<U> {
        self.lookup_by_internal_id(internal_id).cloned()
    }

    /// True if `name` is reserved as an id, short id or display name.
    pub fn is_id_taken(&self, name: &str) -> bool {
        self.taken_names.contains(name)
    }

    /// Copies of every asset, in insertion order.
    pub fn get_snapshot(&self) -> Vec<U> {
        self.assets.clone()
    }

    /// Copies of the assets matching `filter`.
    pub fn filter_snapshot<F>(&self, filter: F) -> Vec<U>
    where
        F: Fn(&U) -> bool,
    {
        self.assets.iter().filter(|a| filter(a)).cloned().collect()
    }

    /// Borrowing iterator for read-only scans inside the crate.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &U> {
        self.assets.iter()
    }

    /// Serialize every asset into `bundle`.
    pub fn to_bundle(&self, out: &mut ResourceBundle) -> Result<()> {
        bundle::add_assets_to_bundle(self.assets.iter(), out)
    }

    /// Changes that turn `past` into `self`.
    pub fn diff(&self, past: &AssetCollection<U>) -> CollectionDiff<U> {
        let mut diff = CollectionDiff::default();
        let mut handled = HashSet::new();

        for past_asset in &past.assets {
            handled.insert(past_asset.internal_id());
            let current = self.lookup_by_internal_id(past_asset.internal_id());
            let unchanged = current.is_some_and(|c| c.asset_equals(past_asset));
            if !unchanged {
                diff.push(Some(past_asset.clone()), current.cloned());
            }
        }

        for current in self
            .assets
            .iter()
            .filter(|a| !handled.contains(&a.internal_id()))
        {
            diff.push(None, Some(current.clone()));
        }

        diff
    }

    /// Apply `diff` forwards, or in reverse when `backwards` is set.
    ///
    /// The name index is rebuilt afterwards; any collision is a consistency
    /// violation and listeners are not notified.
    pub fn apply_diff(&mut self, diff: &CollectionDiff<U>, backwards: bool) -> Result<()> {
        let (before, after) = if backwards {
            (&diff.after, &diff.before)
        } else {
            (&diff.before, &diff.after)
        };

        if before.len() != after.len() {
            return Err(AssetError::DiffLengthMismatch {
                before: before.len(),
                after: after.len(),
            });
        }

        let previous = self.assets.clone();
        for (old, new) in before.iter().zip(after) {
            match (old, new) {
                (None, Some(added)) => {
                    self.assets.push(added.clone());
                    self.pending.push(added.internal_id());
                }
                (None, None) => {}
                (Some(removed), replacement) => {
                    self.remove_by_internal_id(removed.internal_id());
                    if let Some(replacement) = replacement {
                        self.assets.push(replacement.clone());
                    }
                    self.pending.push(removed.internal_id());
                }
            }
        }

        if let Err(err) = self.rebuild_names() {
            self.assets = previous;
            self.pending.clear();
            return Err(err);
        }

        self.flush_notifications();
        Ok(())
    }

    /// Register `callback` for changes to the asset with `internal_id`.
    pub fn add_listener<F>(&mut self, internal_id: InternalId, callback: F) -> ListenerId
    where
        F: FnMut(InternalId) + 'static,
    {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push(AssetListener {
            id,
            internal_id,
            callback: Box::new(callback),
        });
        id
    }

    /// Returns false if the listener was not registered.
    pub fn remove_listener(&mut self, listener: ListenerId) -> bool {
        let count = self.listeners.len();
        self.listeners.retain(|l| l.id != listener);
        self.listeners.len() != count
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn add_core(&mut self, asset: &U) -> U {
        if self.lookup_by_id(asset.id()).is_some() {
            let id = asset.id().to_string();
            return self.update_core(&id, asset);
        }
        self.insert_new(asset.clone())
    }

    fn update_core(&mut self, id: &str, new_value: &U) -> U {
        let Some(existing) = self.lookup_by_id(id) else {
            return self.insert_new(new_value.clone());
        };

        if existing.asset_equals(new_value) {
            return new_value.clone();
        }

        let old_internal_id = existing.internal_id();
        self.remove_by_id(id);
        let stored = self.add_core(new_value);
        self.pending.push(old_internal_id);
        stored
    }

    fn insert_new(&mut self, mut asset: U) -> U {
        let mut reserved = vec![asset.id().to_string()];
        reserved.extend(asset.short_id());

        let displaced: Vec<usize> = self
            .assets
            .iter()
            .enumerate()
            .filter(|(_, other)| other.internal_id() != asset.internal_id())
            .filter(|(_, other)| {
                other
                    .meta()
                    .display_name()
                    .is_some_and(|name| reserved.iter().any(|r| r == name))
            })
            .map(|(index, _)| index)
            .collect();

        for name in reserved {
            self.taken_names.insert(name);
        }

        // An id always wins over another asset's display name.
        for index in displaced {
            let Some(old_name) = self.assets[index].meta().display_name().map(str::to_string) else {
                continue;
            };
            let new_name = self.generate_new_display_name(&old_name);
            debug!(
                "{} '{}' renamed from '{}' to '{}'",
                U::ASSET_TYPE,
                self.assets[index].id(),
                old_name,
                new_name
            );
            self.taken_names.insert(new_name.clone());
            self.assets[index].meta_mut().display_name = Some(new_name);
            self.pending.push(self.assets[index].internal_id());
        }

        if let Some(name) = asset.meta().display_name().map(str::to_string) {
            if name != asset.id() {
                let name = if self.taken_names.contains(&name) {
                    self.generate_new_display_name(&name)
                } else {
                    name
                };
                self.taken_names.insert(name.clone());
                asset.meta_mut().display_name = Some(name);
            }
        }

        self.assets.push(asset.clone());
        asset
    }

    fn release_names(&mut self, asset: &U) {
        self.taken_names.remove(asset.id());
        if let Some(short) = asset.short_id() {
            self.taken_names.remove(&short);
        }
        if let Some(name) = asset.meta().display_name() {
            self.taken_names.remove(name);
        }
    }

    /// Recompute `taken_names` from the stored assets. Ids and short ids are
    /// reserved before any display name is checked.
    fn rebuild_names(&mut self) -> Result<()> {
        let mut names = HashSet::new();
        let mut internal_ids = HashSet::new();

        for asset in &self.assets {
            if !internal_ids.insert(asset.internal_id()) {
                return Err(AssetError::DuplicateInternalId {
                    asset_type: U::ASSET_TYPE,
                    internal_id: asset.internal_id(),
                });
            }

            if !names.insert(asset.id().to_string()) {
                return Err(AssetError::DuplicateId {
                    asset_type: U::ASSET_TYPE,
                    id: asset.id().to_string(),
                });
            }
            names.extend(asset.short_id());
        }

        for asset in &self.assets {
            let Some(name) = asset.meta().display_name() else {
                continue;
            };
            if name != asset.id() && !names.insert(name.to_string()) {
                return Err(AssetError::ConsistencyViolation {
                    reason: format!("{} display name '{}' is already taken", U::ASSET_TYPE, name),
                });
            }
        }

        self.taken_names = names;
        Ok(())
    }

    fn generate_new_display_name(&self, prefix: &str) -> String {
        let prefix = prefix.trim_end_matches(|c: char| c.is_ascii_digit());
        let mut index = 0;
        while self.taken_names.contains(&format!("{prefix}{index}")) {
            index += 1;
        }
        format!("{prefix}{index}")
    }

    fn position_by_id(&self, id: &str) -> Option<usize> {
        self.assets.iter().position(|a| a.id() == id)
    }

    fn lookup_by_id(&self, id: &str) -> Option<&U> {
        self.assets.iter().find(|a| a.id() == id)
    }

    fn lookup_by_internal_id(&self, internal_id: InternalId) -> Option<&U> {
        self.assets.iter().find(|a| a.internal_id() == internal_id)
    }

    fn remove_by_internal_id(&mut self, internal_id: InternalId) {
        self.assets.retain(|a| a.internal_id() != internal_id);
    }

    fn flush_notifications(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for internal_id in pending {
            for listener in self
                .listeners
                .iter_mut()
                .filter(|l| l.internal_id == internal_id)
            {
                (listener.callback)(internal_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::assets::{AssetMetadata, Tile};
    use crate::sprite::Bitmap;

    fn tile(internal_id: InternalId, id: &str) -> Tile {
        Tile::new(internal_id, id, Bitmap::new(4, 4))
    }

    fn named_tile(internal_id: InternalId, id: &str, name: &str) -> Tile {
        let mut t = tile(internal_id, id);
        t.meta = AssetMetadata::named(Some(name.to_string()));
        t
    }

    #[test]
    fn test_add_reserves_names() {
        let mut tiles = AssetCollection::new();
        tiles.add(&named_tile(0, "myTiles.tile1", "grass"));

        assert!(tiles.is_id_taken("myTiles.tile1"));
        assert!(tiles.is_id_taken("tile1"));
        assert!(tiles.is_id_taken("grass"));
        assert_eq!(tiles.get_by_display_name("grass").unwrap().internal_id, 0);
        assert_eq!(tiles.get_by_display_name("tile1").unwrap().internal_id, 0);
    }

    #[test]
    fn test_add_renames_colliding_display_name() {
        let mut tiles = AssetCollection::new();
        tiles.add(&named_tile(0, "myTiles.tile1", "grass"));
        let second = tiles.add(&named_tile(1, "myTiles.tile2", "grass"));
        assert_eq!(second.meta.display_name.as_deref(), Some("grass0"));

        let third = tiles.add(&named_tile(2, "myTiles.tile3", "grass0"));
        assert_eq!(third.meta.display_name.as_deref(), Some("grass1"));
    }

    #[test]
    fn test_add_existing_id_updates() {
        let mut tiles = AssetCollection::new();
        tiles.add(&tile(0, "myTiles.tile1"));

        let mut changed = tile(0, "myTiles.tile1");
        changed.set_bitmap(Bitmap::new(8, 8));
        tiles.add(&changed);

        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles.get_by_id("myTiles.tile1").unwrap().bitmap.width(), 8);
    }

    #[test]
    fn test_update_renames_and_frees_old_id() {
        let mut tiles = AssetCollection::new();
        tiles.add(&tile(0, "myTiles.tile1"));
        tiles.update("myTiles.tile1", &tile(0, "myTiles.stone"));

        assert!(!tiles.is_id_taken("myTiles.tile1"));
        assert!(!tiles.is_id_taken("tile1"));
        assert!(tiles.get_by_id("myTiles.stone").is_some());
    }

    #[test]
    fn test_rename_onto_display_name_moves_other_asset() {
        let mut tiles = AssetCollection::new();
        tiles.add(&named_tile(0, "myTiles.tile1", "grass"));
        tiles.add(&tile(1, "myTiles.tile2"));

        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        tiles.add_listener(0, move |id| sink.borrow_mut().push(id));

        tiles.update("myTiles.tile2", &tile(1, "myTiles.grass"));

        let first = tiles.get_by_internal_id(0).unwrap();
        assert_eq!(first.meta.display_name.as_deref(), Some("grass0"));
        assert_eq!(tiles.get_by_display_name("grass").unwrap().internal_id, 1);
        assert_eq!(*calls.borrow(), vec![0]);
    }

    #[test]
    fn test_apply_diff_checks_display_names_after_ids() {
        let named = named_tile(0, "myTiles.tile1", "grass");
        let short = tile(1, "myTiles.grass");

        for (present, incoming) in [(&named, &short), (&short, &named)] {
            let mut tiles = AssetCollection::new();
            tiles.add(present);
            let diff = CollectionDiff {
                before: vec![None],
                after: vec![Some(incoming.clone())],
            };

            let err = tiles.apply_diff(&diff, false).unwrap_err();
            assert!(matches!(err, AssetError::ConsistencyViolation { .. }));
            assert_eq!(tiles.get_snapshot(), vec![present.clone()]);
        }
    }

    #[test]
    fn test_listener_fires_only_on_change() {
        let mut tiles = AssetCollection::new();
        tiles.add(&tile(3, "myTiles.tile1"));

        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        let listener = tiles.add_listener(3, move |id| sink.borrow_mut().push(id));

        tiles.update("myTiles.tile1", &tile(3, "myTiles.tile1"));
        assert!(calls.borrow().is_empty());

        let mut changed = tile(3, "myTiles.tile1");
        changed.meta.tags.push("floor".to_string());
        tiles.update("myTiles.tile1", &changed);
        assert_eq!(*calls.borrow(), vec![3]);

        assert!(tiles.remove_listener(listener));
        assert!(!tiles.remove_listener(listener));
        tiles.update("myTiles.tile1", &tile(3, "myTiles.tile1"));
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn test_diff_and_apply_backwards() {
        let mut tiles = AssetCollection::new();
        tiles.add(&tile(0, "myTiles.tile1"));
        tiles.add(&tile(1, "myTiles.tile2"));
        let past = tiles.clone();

        tiles.remove_by_id("myTiles.tile1");
        tiles.add(&tile(2, "myTiles.tile3"));
        let mut changed = tile(1, "myTiles.tile2");
        changed.set_bitmap(Bitmap::new(1, 1));
        tiles.update("myTiles.tile2", &changed);

        let diff = tiles.diff(&past);
        assert_eq!(diff.len(), 3);

        let current = tiles.get_snapshot();
        tiles.apply_diff(&diff, true).unwrap();
        let mut restored = tiles.get_snapshot();
        restored.sort_by_key(|t| t.internal_id);
        assert_eq!(restored, past.get_snapshot());

        tiles.apply_diff(&diff, false).unwrap();
        let mut again = tiles.get_snapshot();
        again.sort_by_key(|t| t.internal_id);
        let mut expected = current;
        expected.sort_by_key(|t| t.internal_id);
        assert_eq!(again, expected);
    }

    #[test]
    fn test_apply_diff_detects_collisions() {
        let mut tiles = AssetCollection::new();
        tiles.add(&tile(0, "myTiles.tile1"));

        let diff = CollectionDiff {
            before: vec![None],
            after: vec![Some(tile(5, "myTiles.tile1"))],
        };
        let err = tiles.apply_diff(&diff, false).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(tiles.get_snapshot(), vec![tile(0, "myTiles.tile1")]);
        assert!(tiles.get_by_internal_id(5).is_none());

        let mismatched: CollectionDiff<Tile> = CollectionDiff {
            before: vec![None],
            after: vec![],
        };
        assert!(matches!(
            tiles.apply_diff(&mismatched, false),
            Err(AssetError::DiffLengthMismatch { .. })
        ));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut tiles = AssetCollection::new();
        tiles.add(&tile(0, "myTiles.tile1"));
        tiles.add_listener(0, |_| {});

        let copy = tiles.clone();
        tiles.remove_by_id("myTiles.tile1");

        assert_eq!(copy.len(), 1);
        assert_eq!(copy.listener_count(), 0);
        assert!(copy.is_id_taken("tile1"));
    }
}
