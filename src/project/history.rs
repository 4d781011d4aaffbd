//! Undo/Redo History
//!
//! Each checkpoint stores the [`SnapshotDiff`] between the last committed
//! state and the working state, tagged with both revisions. Undo applies a
//! diff backwards and restores its `before_revision`; redo applies it forwards
//! and restores its `after_revision`.

use log::warn;

use crate::assets::{Animation, AssetType, CollectionDiff, ProjectImage, ProjectTilemap, Tile};
use crate::config::DEFAULT_MAX_UNDO_LEVELS;
use crate::error::Result;

use super::snapshot::AssetSnapshot;

/// Changes between two revisions of a project, one diff per kind.
#[derive(Debug, Clone)]
pub struct SnapshotDiff {
    pub before_revision: u32,
    pub after_revision: u32,
    pub tiles: CollectionDiff<Tile>,
    pub images: CollectionDiff<ProjectImage>,
    pub tilemaps: CollectionDiff<ProjectTilemap>,
    pub animations: CollectionDiff<Animation>,
}

impl SnapshotDiff {
    /// Changes that turn `before` into `after`.
    pub fn between(before: &AssetSnapshot, after: &AssetSnapshot) -> Self {
        Self {
            before_revision: before.revision,
            after_revision: after.revision,
            tiles: after.tiles.diff(&before.tiles),
            images: after.images.diff(&before.images),
            tilemaps: after.tilemaps.diff(&before.tilemaps),
            animations: after.animations.diff(&before.animations),
        }
    }

    /// Number of changed slots across all kinds.
    pub fn len(&self) -> usize {
        self.tiles.len() + self.images.len() + self.tilemaps.len() + self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply to `state` and restore the matching revision.
    ///
    /// Tiles go first so that tilemaps never observe a stale tile. If any kind
    /// fails, the kinds already applied are reverted and the revision is left
    /// untouched.
    pub fn apply(&self, state: &mut AssetSnapshot, backwards: bool) -> Result<()> {
        const ORDER: [AssetType; 4] = [
            AssetType::Tile,
            AssetType::Image,
            AssetType::Tilemap,
            AssetType::Animation,
        ];

        for (applied, kind) in ORDER.iter().enumerate() {
            if let Err(err) = self.apply_kind(state, *kind, backwards) {
                for done in ORDER[..applied].iter().rev() {
                    if let Err(revert) = self.apply_kind(state, *done, !backwards) {
                        warn!("Could not revert {} changes: {}", done, revert);
                    }
                }
                return Err(err);
            }
        }

        state.revision = if backwards {
            self.before_revision
        } else {
            self.after_revision
        };
        Ok(())
    }

    fn apply_kind(&self, state: &mut AssetSnapshot, kind: AssetType, backwards: bool) -> Result<()> {
        match kind {
            AssetType::Tile => state.tiles.apply_diff(&self.tiles, backwards),
            AssetType::Image => state.images.apply_diff(&self.images, backwards),
            AssetType::Tilemap => state.tilemaps.apply_diff(&self.tilemaps, backwards),
            AssetType::Animation => state.animations.apply_diff(&self.animations, backwards),
        }
    }
}

/// Linear undo and redo stacks.
///
/// The undo stack is limited to `max_undo_levels` entries; the oldest are
/// dropped first. A limit of 0 keeps everything.
#[derive(Debug, Clone)]
pub struct UndoHistory {
    undo_stack: Vec<SnapshotDiff>,
    redo_stack: Vec<SnapshotDiff>,
    max_undo_levels: usize,
    discarded: usize,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO_LEVELS)
    }
}

impl UndoHistory {
    pub fn new(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_undo_levels: max_levels,
            discarded: 0,
        }
    }

    /// Record a new checkpoint. The redo stack is cleared since history
    /// has diverged.
    pub fn push(&mut self, diff: SnapshotDiff) {
        self.redo_stack.clear();
        self.undo_stack.push(diff);
        self.trim_history();
    }

    pub fn pop_undo(&mut self) -> Option<SnapshotDiff> {
        self.undo_stack.pop()
    }

    pub fn pop_redo(&mut self) -> Option<SnapshotDiff> {
        self.redo_stack.pop()
    }

    /// Move an undone diff onto the redo stack.
    pub fn push_redo(&mut self, diff: SnapshotDiff) {
        self.redo_stack.push(diff);
    }

    /// Move a redone diff back onto the undo stack without touching redo.
    pub fn push_redone(&mut self, diff: SnapshotDiff) {
        self.undo_stack.push(diff);
        self.trim_history();
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn peek_undo(&self) -> Option<&SnapshotDiff> {
        self.undo_stack.last()
    }

    pub fn max_undo_levels(&self) -> usize {
        self.max_undo_levels
    }

    /// Change the limit, trimming immediately if the stack is now too deep.
    pub fn set_max_undo_levels(&mut self, max_levels: usize) {
        self.max_undo_levels = max_levels;
        self.trim_history();
    }

    /// Checkpoints dropped by trimming since creation.
    pub fn discarded_count(&self) -> usize {
        self.discarded
    }

    fn trim_history(&mut self) {
        if self.max_undo_levels == 0 || self.undo_stack.len() <= self.max_undo_levels {
            return;
        }
        let excess = self.undo_stack.len() - self.max_undo_levels;
        self.undo_stack.drain(..excess);
        self.discarded += excess;
    }
}
