//! Snapshot-based undo/redo stacks.

use crate::stroke::Stroke;
use std::sync::Arc;

/// Maximum number of undo snapshots to keep.
const MAX_UNDO_HISTORY: usize = 50;

/// A full snapshot of the committed stroke collection.
///
/// Strokes are immutable once committed, so snapshots share them by
/// reference; cloning a snapshot copies pointers, not geometry.
pub type Snapshot = Vec<Arc<Stroke>>;

/// Undo/redo stacks over full stroke-collection snapshots.
#[derive(Debug, Default)]
pub struct History {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the state that exists immediately before a committing
    /// mutation (stroke commit, clear-all). Clears the redo stack.
    pub fn record(&mut self, current: Snapshot) {
        self.undo_stack.push(current);
        self.redo_stack.clear();

        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
            log::debug!("undo history capped at {MAX_UNDO_HISTORY} snapshots");
        }
    }

    /// Pop the latest snapshot, pushing `current` onto the redo stack.
    ///
    /// Returns the snapshot to restore, or `None` if there is nothing to
    /// undo (in which case `current` is dropped and nothing changes).
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let snapshot = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(snapshot)
    }

    /// Symmetric counterpart of [`History::undo`].
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let snapshot = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(snapshot)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Drop all history (e.g. when seeding a fresh session).
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
