use serde::{Deserialize, Serialize};

use super::ProposalDescriptor;
use crate::core::MemberPath;
use crate::ordering::InsertPosition;
use crate::parser::Outline;

/// Where and how a proposal is being applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalContext {
    /// Container the new member goes into
    pub container: MemberPath,
    /// Cursor offset the completion was requested at
    pub offset: usize,
    pub position: InsertPosition,
    pub default_name: String,
    pub name_suffix: String,
    /// Fully qualified supertypes to try in order
    pub super_type_chain: Vec<String>,
    /// Characters typed before the completion was requested
    pub search_prefix: Option<String>,
    /// Explicit member name chosen by the caller
    pub name: Option<String>,
}

impl ProposalContext {
    pub fn new(
        descriptor: &ProposalDescriptor,
        container: MemberPath,
        offset: usize,
        position: InsertPosition,
    ) -> Self {
        Self {
            container,
            offset,
            position,
            default_name: descriptor.default_name.clone(),
            name_suffix: descriptor.name_suffix.clone(),
            super_type_chain: descriptor.default_super_types.clone(),
            search_prefix: None,
            name: None,
        }
    }

    pub fn with_prefix(mut self, prefix: Option<String>) -> Self {
        self.search_prefix = prefix.filter(|prefix| !prefix.is_empty());
        self
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    /// Insert position implied by a cursor offset: before the first child starting after it
    pub fn position_at(outline: &Outline, container: &MemberPath, offset: usize) -> InsertPosition {
        outline
            .children(container)
            .into_iter()
            .find(|child| child.span.start >= offset)
            .map(|child| InsertPosition::Before(child.name.clone()))
            .unwrap_or(InsertPosition::Last)
    }

    /// Name for the new member, unique within the container's root type.
    ///
    /// An explicit name is used as is. Otherwise a typed prefix starting with an
    /// uppercase letter replaces the default stem, and a counter is inserted before
    /// the suffix until the name is free.
    pub fn unique_name(&self, outline: &Outline) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }

        let stem = match self.search_prefix.as_deref() {
            Some(prefix) if prefix.starts_with(|c: char| c.is_uppercase()) => {
                prefix.strip_suffix(self.name_suffix.as_str()).unwrap_or(prefix)
            }
            _ => self.default_name.as_str(),
        };
        let root = self.container.root_name();

        let candidate = format!("{}{}", stem, self.name_suffix);
        if !outline.name_taken(root, &candidate) {
            return candidate;
        }
        (1..)
            .map(|n| format!("{}{}{}", stem, n, self.name_suffix))
            .find(|candidate| !outline.name_taken(root, candidate))
            .unwrap_or(candidate)
    }
}
