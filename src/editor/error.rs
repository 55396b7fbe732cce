use thiserror::Error;

/// Text buffer errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Edits were computed against version {expected} but the buffer is at version {actual}")]
    StaleSnapshot { expected: u64, actual: u64 },

    #[error("Edit {offset}..{end} is out of bounds (length {len})")]
    OutOfBounds { offset: usize, end: usize, len: usize },

    #[error("Edits overlap at offset {0}")]
    Overlapping(usize),

    #[error("Offset {0} is not on a character boundary")]
    NotCharBoundary(usize),
}

pub type Result<T> = std::result::Result<T, EditError>;
