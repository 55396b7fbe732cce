use super::{Capability, ProposalContext};
use crate::operation::StructuralEdit;

/// Builds the operation that applies a proposal
pub type OperationFactory = fn(&ProposalDescriptor, ProposalContext) -> Box<dyn StructuralEdit>;

/// Immutable catalog entry describing one kind of member that can be proposed
#[derive(Debug, Clone)]
pub struct ProposalDescriptor {
    /// Stable identifier, e.g. `string-field`
    pub id: String,
    /// Text shown in the completion list
    pub label: String,
    pub capability: Capability,
    /// Fully qualified supertypes to try in order
    pub default_super_types: Vec<String>,
    pub default_name: String,
    pub name_suffix: String,
    pub icon: String,
    pub relevance: i32,
    pub factory: OperationFactory,
}

impl ProposalDescriptor {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        capability: Capability,
        factory: OperationFactory,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            capability,
            default_super_types: Vec::new(),
            default_name: "My".to_string(),
            name_suffix: String::new(),
            icon: "field".to_string(),
            relevance: 0,
            factory,
        }
    }

    pub fn with_super_types<I, S>(mut self, super_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_super_types = super_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_name(mut self, default_name: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.default_name = default_name.into();
        self.name_suffix = suffix.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_relevance(mut self, relevance: i32) -> Self {
        self.relevance = relevance;
        self
    }

    /// Instantiate the operation for this proposal
    pub fn create(&self, context: ProposalContext) -> Box<dyn StructuralEdit> {
        (self.factory)(self, context)
    }

    /// Case-insensitive match of a typed prefix against the label or default name
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        let prefix = prefix.to_lowercase();
        prefix.is_empty()
            || self.label.to_lowercase().starts_with(&prefix)
            || self.default_name.to_lowercase().starts_with(&prefix)
            || self.id.starts_with(&prefix)
    }
}
