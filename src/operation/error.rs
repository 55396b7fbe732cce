use thiserror::Error;

use crate::core::MemberPath;
use crate::editor::error::EditError;

/// Structural operation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperationError {
    /// Raised before any text was touched
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// A text edit could not be applied; completed steps were rolled back
    #[error("Failed to {step}: {source}")]
    Apply {
        step: String,
        #[source]
        source: EditError,
    },

    /// The edited document no longer parses; completed steps were rolled back
    #[error("Edit produced invalid source: {0}")]
    InvalidResult(String),

    /// Rolling back failed; the document is left as is
    #[error("Rollback failed after \"{cause}\": {source}")]
    RollbackFailed {
        cause: String,
        #[source]
        source: EditError,
    },
}

impl OperationError {
    pub fn precondition(msg: impl Into<String>) -> Self {
        OperationError::Precondition(msg.into())
    }

    pub fn target_not_found(name: &str) -> Self {
        OperationError::Precondition(format!("sibling {:?} not found in container", name))
    }

    pub fn member_not_found(path: &MemberPath) -> Self {
        OperationError::Precondition(format!("member {} not found", path))
    }

    pub fn apply(step: impl Into<String>, source: EditError) -> Self {
        OperationError::Apply {
            step: step.into(),
            source,
        }
    }

    /// True if nothing was mutated when this error was raised
    pub fn is_precondition(&self) -> bool {
        matches!(self, OperationError::Precondition(_))
    }
}
