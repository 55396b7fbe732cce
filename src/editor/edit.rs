use serde::{Deserialize, Serialize};

/// Replacement of `length` bytes at `offset` with `text`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    pub offset: usize,
    pub length: usize,
    pub text: String,
}

impl TextEdit {
    pub fn new(offset: usize, length: usize, text: impl Into<String>) -> Self {
        Self {
            offset,
            length,
            text: text.into(),
        }
    }

    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::new(offset, 0, text)
    }

    pub fn delete(range: std::ops::Range<usize>) -> Self {
        Self::new(range.start, range.end - range.start, String::new())
    }

    pub fn replace(range: std::ops::Range<usize>, text: impl Into<String>) -> Self {
        Self::new(range.start, range.end - range.start, text)
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Byte delta this edit introduces
    pub fn delta(&self) -> isize {
        self.text.len() as isize - self.length as isize
    }
}

/// Outcome of applying a batch of edits
#[derive(Debug, Clone)]
pub struct EditReceipt {
    pub version_before: u64,
    pub version_after: u64,
    /// Edits that restore the previous text, expressed against `version_after`
    pub inverse: Vec<TextEdit>,
}

impl EditReceipt {
    pub fn is_noop(&self) -> bool {
        self.version_before == self.version_after
    }
}
