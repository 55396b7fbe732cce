use serde::{Deserialize, Serialize};

use super::edit::TextEdit;

/// Handle of a position registered on a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionId(pub u64);

/// Offset and length that follow the buffer through subsequent edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedPosition {
    pub offset: usize,
    pub length: usize,
    /// Set once an edit swallowed the whole region
    pub deleted: bool,
}

impl TrackedPosition {
    pub fn new(offset: usize, length: usize) -> Self {
        Self {
            offset,
            length,
            deleted: false,
        }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.end()
    }

    /// Map this position through one applied edit
    ///
    /// Edits touching the region (including insertions at either boundary) grow or shrink it.
    pub fn shift(&mut self, edit: &TextEdit) {
        let start = self.offset;
        let end = self.end();
        let edit_end = edit.end();
        let inserted = edit.text.len();

        if edit.offset >= start && edit_end <= end {
            // inside or touching
            let new_end = (end as isize + edit.delta()) as usize;
            self.length = new_end - start;
        } else if edit_end <= start {
            self.offset = (start as isize + edit.delta()) as usize;
        } else if edit.offset >= end {
            // after, nothing to do
        } else if edit.offset <= start && edit_end >= end {
            self.offset = edit.offset;
            self.length = 0;
            self.deleted = true;
        } else if edit.offset < start {
            // overlaps the head of the region
            let new_end = (end as isize + edit.delta()) as usize;
            self.offset = edit.offset + inserted;
            self.length = new_end.saturating_sub(self.offset);
        } else {
            // overlaps the tail of the region
            self.length = edit.offset - start;
        }
    }
}
