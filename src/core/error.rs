use thiserror::Error;

/// Main application error type that aggregates domain-specific errors
#[derive(Error, Debug)]
pub enum TrellisError {
    /// Configuration layer errors
    #[error(transparent)]
    Config(#[from] crate::config::error::ConfigError),

    /// Parser layer errors
    #[error(transparent)]
    Parse(#[from] crate::parser::error::ParseError),

    /// Text buffer errors
    #[error(transparent)]
    Edit(#[from] crate::editor::error::EditError),

    /// Structural operation errors
    #[error(transparent)]
    Operation(#[from] crate::operation::error::OperationError),

    /// Background proposal errors
    #[error(transparent)]
    Proposal(#[from] crate::proposal::error::ProposalError),

    /// Document is not open in the workspace
    #[error("Document not open: {0}")]
    DocumentNotFound(String),

    /// Linked edit session errors
    #[error("Linked mode error: {0}")]
    Linked(String),

    /// Foreground service is gone
    #[error("Service error: {0}")]
    Service(String),

    /// Generic I/O errors not covered by specific layers
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for trellis operations
pub type Result<T> = std::result::Result<T, TrellisError>;

impl TrellisError {
    pub fn document_not_found(uri: impl Into<String>) -> Self {
        TrellisError::DocumentNotFound(uri.into())
    }

    pub fn linked(msg: impl Into<String>) -> Self {
        TrellisError::Linked(msg.into())
    }

    pub fn service(msg: impl Into<String>) -> Self {
        TrellisError::Service(msg.into())
    }

    /// True when the error was raised before any document was touched
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            TrellisError::Operation(crate::operation::error::OperationError::Precondition(_))
        )
    }
}
