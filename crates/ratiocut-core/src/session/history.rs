//! Bounded undo/redo history.
//!
//! Entries are immutable values in an indexable deque with a cursor. Pushing
//! after an undo truncates the redo tail; exceeding capacity drops from the
//! front and shifts the cursor with it.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::adjust::AdjustmentState;
use crate::geometry::{AspectRatio, CropRect};

/// One committed editing state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Active crop in source coordinates
    pub crop: CropRect,
    /// Ratio lock the crop was made under, if any
    pub ratio: Option<AspectRatio>,
    pub adjustments: AdjustmentState,
    /// Monotonic id, unique within a session
    pub sequence_id: u64,
}

#[derive(Debug, Clone)]
pub struct HistoryStack {
    entries: VecDeque<HistoryEntry>,
    cursor: usize,
    capacity: usize,
    next_sequence: u64,
}

impl HistoryStack {
    /// An empty stack. Capacity is at least 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            capacity: capacity.max(1),
            next_sequence: 0,
        }
    }

    /// Drop everything and start over from a single entry.
    pub fn reset(
        &mut self,
        crop: CropRect,
        ratio: Option<AspectRatio>,
        adjustments: AdjustmentState,
    ) -> &HistoryEntry {
        self.entries.clear();
        self.cursor = 0;
        self.push(crop, ratio, adjustments)
    }

    /// Commit a new entry after the cursor, discarding any redo tail.
    pub fn push(
        &mut self,
        crop: CropRect,
        ratio: Option<AspectRatio>,
        adjustments: AdjustmentState,
    ) -> &HistoryEntry {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        let entry = HistoryEntry {
            crop,
            ratio,
            adjustments,
            sequence_id: self.next_sequence,
        };
        self.next_sequence += 1;
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
        &self.entries[self.cursor]
    }

    /// Step back; `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Step forward; `None` at the newest entry.
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Forget all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}
