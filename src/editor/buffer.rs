use crop::Rope;
use lsp_types::{Position, Range};
use rustc_hash::FxHashMap;
use tracing::trace;

use super::edit::{EditReceipt, TextEdit};
use super::error::{EditError, Result};
use super::position::{PositionId, TrackedPosition};

/// Immutable view of the buffer that edits are computed against
#[derive(Debug, Clone)]
pub struct Snapshot {
    version: u64,
    rope: Rope,
}

impl Snapshot {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }
}

/// Text of one document with version tracking and registered positions
pub struct TextBuffer {
    rope: Rope,
    version: u64,
    positions: FxHashMap<PositionId, TrackedPosition>,
    next_position: u64,
}

impl TextBuffer {
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from(text),
            version: 0,
            positions: FxHashMap::default(),
            next_position: 0,
        }
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn len(&self) -> usize {
        self.rope.byte_len()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.byte_len() == 0
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: self.version,
            rope: self.rope.clone(),
        }
    }

    /// Text of a byte range, clamped to the buffer
    pub fn slice(&self, range: std::ops::Range<usize>) -> String {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        self.rope.byte_slice(start..end).to_string()
    }

    /// Apply non-overlapping edits computed against `snapshot_version` as one atomic change.
    ///
    /// Inserts at the same offset land in the order they were given.
    pub fn apply(&mut self, snapshot_version: u64, edits: &[TextEdit]) -> Result<EditReceipt> {
        if snapshot_version != self.version {
            return Err(EditError::StaleSnapshot {
                expected: snapshot_version,
                actual: self.version,
            });
        }

        let mut sorted: Vec<&TextEdit> = edits
            .iter()
            .filter(|edit| edit.length > 0 || !edit.text.is_empty())
            .collect();
        // Stable, so equal keys keep input order
        sorted.sort_by_key(|edit| (edit.offset, edit.end()));

        if sorted.is_empty() {
            return Ok(EditReceipt {
                version_before: self.version,
                version_after: self.version,
                inverse: Vec::new(),
            });
        }

        self.validate(&sorted)?;

        // Inverse edits live in post-apply coordinates, so accumulate the delta front to back
        let mut inverse = Vec::with_capacity(sorted.len());
        let mut delta: isize = 0;
        for edit in &sorted {
            let old_text = self.slice(edit.offset..edit.end());
            let offset = (edit.offset as isize + delta) as usize;
            inverse.push(TextEdit::new(offset, edit.text.len(), old_text));
            delta += edit.delta();
        }

        // Back to front keeps lower offsets valid while applying
        for edit in sorted.iter().rev() {
            if edit.length > 0 {
                self.rope.delete(edit.offset..edit.end());
            }
            if !edit.text.is_empty() {
                self.rope.insert(edit.offset, &edit.text);
            }
            for position in self.positions.values_mut() {
                position.shift(edit);
            }
        }

        let version_before = self.version;
        self.version += 1;
        trace!(
            "Applied {} edits, version {} -> {}",
            sorted.len(),
            version_before,
            self.version
        );

        Ok(EditReceipt {
            version_before,
            version_after: self.version,
            inverse,
        })
    }

    fn validate(&self, sorted: &[&TextEdit]) -> Result<()> {
        let len = self.len();
        let text = self.rope.to_string();
        let mut previous_end = 0;

        for (i, edit) in sorted.iter().enumerate() {
            if edit.end() > len {
                return Err(EditError::OutOfBounds {
                    offset: edit.offset,
                    end: edit.end(),
                    len,
                });
            }
            if i > 0 && edit.offset < previous_end {
                return Err(EditError::Overlapping(edit.offset));
            }
            for boundary in [edit.offset, edit.end()] {
                if !text.is_char_boundary(boundary) {
                    return Err(EditError::NotCharBoundary(boundary));
                }
            }
            previous_end = edit.end();
        }
        Ok(())
    }

    /// Register a region that should follow subsequent edits
    pub fn track(&mut self, offset: usize, length: usize) -> PositionId {
        let id = PositionId(self.next_position);
        self.next_position += 1;
        self.positions
            .insert(id, TrackedPosition::new(offset, length));
        id
    }

    pub fn position(&self, id: PositionId) -> Option<TrackedPosition> {
        self.positions.get(&id).copied()
    }

    pub fn untrack(&mut self, id: PositionId) {
        self.positions.remove(&id);
    }

    pub fn tracked_count(&self) -> usize {
        self.positions.len()
    }

    /// Convert a byte offset to an LSP position (UTF-16 columns)
    pub fn lsp_position(&self, byte_pos: usize) -> Position {
        let byte_pos = byte_pos.min(self.len());
        let line = self.rope.line_of_byte(byte_pos);
        let line_start_byte = self.rope.byte_of_line(line);

        let line_start_utf16 = self.rope.utf16_code_unit_of_byte(line_start_byte);
        let target_utf16 = self.rope.utf16_code_unit_of_byte(byte_pos);

        Position {
            line: line as u32,
            character: (target_utf16 - line_start_utf16) as u32,
        }
    }

    /// Express byte edits (against the current version) as LSP text edits
    pub fn to_lsp_edits(&self, edits: &[TextEdit]) -> Vec<lsp_types::TextEdit> {
        edits
            .iter()
            .map(|edit| lsp_types::TextEdit {
                range: Range::new(
                    self.lsp_position(edit.offset),
                    self.lsp_position(edit.end()),
                ),
                new_text: edit.text.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_is_atomic_against_snapshot() {
        let mut buffer = TextBuffer::new("Hello, world!");
        let snapshot = buffer.snapshot();

        let receipt = buffer
            .apply(
                snapshot.version(),
                &[
                    TextEdit::replace(7..12, "Rust"),
                    TextEdit::insert(0, ">> "),
                ],
            )
            .unwrap();

        assert_eq!(buffer.text(), ">> Hello, Rust!");
        assert_eq!(receipt.version_after, 1);

        // inverse restores the original text
        buffer.apply(1, &receipt.inverse).unwrap();
        assert_eq!(buffer.text(), "Hello, world!");
        assert_eq!(snapshot.text(), "Hello, world!");
    }

    #[test]
    fn test_inserts_at_same_offset_keep_input_order() {
        let mut buffer = TextBuffer::new("ab");
        let receipt = buffer
            .apply(
                0,
                &[
                    TextEdit::insert(1, "1"),
                    TextEdit::insert(1, "2"),
                    TextEdit::insert(1, "3"),
                ],
            )
            .unwrap();
        assert_eq!(buffer.text(), "a123b");

        buffer.apply(1, &receipt.inverse).unwrap();
        assert_eq!(buffer.text(), "ab");
    }

    #[test]
    fn test_stale_snapshot_rejected() {
        let mut buffer = TextBuffer::new("abc");
        let snapshot = buffer.snapshot();
        buffer.apply(0, &[TextEdit::insert(3, "d")]).unwrap();

        let err = buffer
            .apply(snapshot.version(), &[TextEdit::insert(0, "x")])
            .unwrap_err();
        assert_eq!(
            err,
            EditError::StaleSnapshot {
                expected: 0,
                actual: 1
            }
        );
        assert_eq!(buffer.text(), "abcd");
    }

    #[test]
    fn test_overlapping_and_out_of_bounds() {
        let mut buffer = TextBuffer::new("abcdef");
        assert_eq!(
            buffer
                .apply(0, &[TextEdit::delete(0..3), TextEdit::delete(2..4)])
                .unwrap_err(),
            EditError::Overlapping(2)
        );
        assert!(matches!(
            buffer.apply(0, &[TextEdit::delete(4..10)]).unwrap_err(),
            EditError::OutOfBounds { .. }
        ));
        assert_eq!(buffer.version(), 0);
    }

    #[test]
    fn test_tracked_positions_follow_edits() {
        let mut buffer = TextBuffer::new("type A struct {}\ntype B struct {}\n");
        let b = buffer.track(22, 1);
        buffer
            .apply(0, &[TextEdit::insert(0, "// header\n")])
            .unwrap();
        let pos = buffer.position(b).unwrap();
        assert_eq!(buffer.slice(pos.range()), "B");
    }

    #[test]
    fn test_lsp_positions_use_utf16() {
        let buffer = TextBuffer::new("こんにちは\nab");
        assert_eq!(buffer.lsp_position(6), Position::new(0, 2));
        assert_eq!(buffer.lsp_position(16), Position::new(1, 0));

        let edits = buffer.to_lsp_edits(&[TextEdit::replace(16..17, "x")]);
        assert_eq!(edits[0].range, Range::new(Position::new(1, 0), Position::new(1, 1)));
    }
}
