//! Completion proposals: the catalog of member kinds, the context a proposal is
//! applied in, and background computation of choice lists.

pub mod async_computation;
pub mod capability;
pub mod catalog;
pub mod choices;
pub mod context;
pub mod descriptor;
pub mod error;

use serde::{Deserialize, Serialize};

pub use async_computation::{
    AsyncProposalComputation, CompletionListener, ComputationState, ListenerId, ProposalJob,
};
pub use capability::Capability;
pub use catalog::ProposalCatalog;
pub use choices::SubtypeChoicesJob;
pub use context::ProposalContext;
pub use descriptor::{OperationFactory, ProposalDescriptor};
pub use error::ProposalError;

/// Label of the placeholder shown while choices are being computed
pub const LOADING_LABEL: &str = "Loading…";

/// A selectable suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Descriptor id when the proposal inserts a member
    pub id: Option<String>,
    pub label: String,
    /// Text written into the document when chosen
    pub replacement: String,
    pub detail: Option<String>,
    pub icon: Option<String>,
    pub relevance: i32,
}

impl Proposal {
    /// A plain choice for a linked group
    pub fn choice(label: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            id: None,
            label: label.into(),
            replacement: replacement.into(),
            detail: None,
            icon: None,
            relevance: 0,
        }
    }

    /// Placeholder returned while a computation is still running
    pub fn loading() -> Self {
        Self::choice(LOADING_LABEL, "")
    }

    pub fn is_loading(&self) -> bool {
        self.id.is_none() && self.label == LOADING_LABEL && self.replacement.is_empty()
    }

    /// Completion entry for inserting a member of `descriptor`'s kind
    pub fn for_descriptor(descriptor: &ProposalDescriptor, name: String) -> Self {
        Self {
            id: Some(descriptor.id.clone()),
            label: descriptor.label.clone(),
            replacement: name,
            detail: descriptor.default_super_types.first().cloned(),
            icon: Some(descriptor.icon.clone()),
            relevance: descriptor.relevance,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
