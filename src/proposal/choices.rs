use async_trait::async_trait;
use hashbrown::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::{Proposal, ProposalError, ProposalJob};
use crate::symbols::{split_qualified, SymbolEnvironment};

/// Supertype choices for a freshly inserted member: the base type and its subtypes
pub struct SubtypeChoicesJob {
    environment: Arc<dyn SymbolEnvironment>,
    base: String,
    /// Package import path to qualifier, as imported by the document at submission
    qualifiers: HashMap<String, String>,
    /// Package of the document itself
    package: Option<String>,
}

impl SubtypeChoicesJob {
    pub fn new(
        environment: Arc<dyn SymbolEnvironment>,
        base: impl Into<String>,
        qualifiers: HashMap<String, String>,
        package: Option<String>,
    ) -> Self {
        Self {
            environment,
            base: base.into(),
            qualifiers,
            package,
        }
    }

    fn reference(&self, qualified: &str) -> String {
        let (path, simple) = split_qualified(qualified);
        if path.is_empty() || self.package.as_deref() == Some(path) {
            return simple.to_string();
        }
        let qualifier = self
            .qualifiers
            .get(path)
            .cloned()
            .unwrap_or_else(|| path.rsplit('/').next().unwrap_or(path).to_string());
        format!("{}.{}", qualifier, simple)
    }
}

#[async_trait]
impl ProposalJob for SubtypeChoicesJob {
    async fn compute(&self, cancel: CancellationToken) -> Result<Vec<Proposal>, ProposalError> {
        let candidates = self.environment.subtypes_of(&self.base);
        let mut proposals = Vec::with_capacity(candidates.len());

        for qualified in candidates {
            if cancel.is_cancelled() {
                return Err(ProposalError::Cancelled);
            }
            let (_, simple) = split_qualified(&qualified);
            let mut proposal =
                Proposal::choice(simple, self.reference(&qualified)).with_detail(qualified.clone());
            if qualified == self.base {
                proposal.relevance = 100;
            }
            proposals.push(proposal);
            tokio::task::yield_now().await;
        }

        proposals.sort_by(|a, b| b.relevance.cmp(&a.relevance).then_with(|| a.label.cmp(&b.label)));
        Ok(proposals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::TypeIndex;

    #[tokio::test]
    async fn test_base_first_then_subtypes() {
        let index = TypeIndex::from_entries(vec![
            ("github.com/acme/ui/fields.StringField", vec![]),
            (
                "github.com/acme/app/custom.EmailField",
                vec!["github.com/acme/ui/fields.StringField"],
            ),
        ]);
        let mut qualifiers = HashMap::new();
        qualifiers.insert("github.com/acme/ui/fields".to_string(), "fields".to_string());

        let job = SubtypeChoicesJob::new(
            Arc::new(index),
            "github.com/acme/ui/fields.StringField",
            qualifiers,
            Some("github.com/acme/app/custom".to_string()),
        );
        let proposals = job.compute(CancellationToken::new()).await.unwrap();
        let replacements: Vec<&str> = proposals.iter().map(|p| p.replacement.as_str()).collect();
        assert_eq!(replacements, vec!["fields.StringField", "EmailField"]);
    }
}
