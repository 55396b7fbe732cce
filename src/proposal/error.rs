use std::sync::Arc;
use thiserror::Error;

/// Proposal lookup and background computation errors
#[derive(Error, Debug, Clone)]
pub enum ProposalError {
    #[error("Proposal computation failed: {0}")]
    Failed(Arc<anyhow::Error>),

    #[error("Proposal computation was cancelled")]
    Cancelled,

    #[error("Proposal computation panicked: {0}")]
    Panicked(String),

    #[error("Unknown proposal: {0}")]
    UnknownProposal(String),

    #[error("No member container at offset {0}")]
    NoContainer(usize),
}

impl ProposalError {
    pub fn failed(error: impl Into<anyhow::Error>) -> Self {
        ProposalError::Failed(Arc::new(error.into()))
    }
}
