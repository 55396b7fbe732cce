//! Open documents and the entry points editors call: completion proposals,
//! applying a proposal, and running structural operations.

pub mod editor_service;
pub mod service;
pub mod surface;

use hashbrown::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Config;
use crate::core::{MemberPath, Result, TrellisError};
use crate::document::SourceDocument;
use crate::language::{Go, LanguageSupport};
use crate::linked::ChoiceSource;
use crate::operation::{execute, EditContext, OperationError, OperationOutcome, StructuralEdit};
use crate::ordering::InsertPosition;
use crate::proposal::{
    Capability, Proposal, ProposalCatalog, ProposalContext, ProposalError, SubtypeChoicesJob,
};
use crate::recipe::SUPER_TYPE_GROUP;
use crate::symbols::{qualify_reference, SymbolEnvironment};

pub use editor_service::EditorService;
pub use surface::EditorSurface;

/// Single-writer model of the open documents
pub struct Workspace {
    documents: HashMap<String, SourceDocument>,
    catalog: Arc<ProposalCatalog>,
    environment: Arc<dyn SymbolEnvironment>,
    config: Config,
    language: Arc<dyn LanguageSupport>,
}

impl Workspace {
    pub fn new(
        catalog: Arc<ProposalCatalog>,
        environment: Arc<dyn SymbolEnvironment>,
        config: Config,
    ) -> Self {
        Self {
            documents: HashMap::new(),
            catalog,
            environment,
            config,
            language: Arc::new(Go::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &ProposalCatalog {
        &self.catalog
    }

    pub fn environment(&self) -> Arc<dyn SymbolEnvironment> {
        self.environment.clone()
    }

    /// Open (or replace) a document from text
    pub fn open(&mut self, uri: &str, text: &str, package: Option<String>) -> Result<()> {
        let document = SourceDocument::open(uri, text, package, self.language.clone())?;
        self.documents.insert(uri.to_string(), document);
        Ok(())
    }

    /// Open a file from disk; its URI is returned
    pub fn open_file(&mut self, path: &Path, package: Option<String>) -> Result<String> {
        let text = std::fs::read_to_string(path)?;
        let uri = format!("file://{}", path.display());
        self.open(&uri, &text, package)?;
        Ok(uri)
    }

    /// Close a document, returning its final text
    pub fn close(&mut self, uri: &str) -> Option<String> {
        self.documents.remove(uri).map(|document| document.text())
    }

    pub fn document(&self, uri: &str) -> Result<&SourceDocument> {
        self.documents
            .get(uri)
            .ok_or_else(|| TrellisError::document_not_found(uri))
    }

    pub fn document_mut(&mut self, uri: &str) -> Result<&mut SourceDocument> {
        self.documents
            .get_mut(uri)
            .ok_or_else(|| TrellisError::document_not_found(uri))
    }

    pub fn text(&self, uri: &str) -> Result<String> {
        Ok(self.document(uri)?.text())
    }

    /// Innermost container around `offset` and the capability of its supertype
    pub fn container_at(&self, uri: &str, offset: usize) -> Result<Option<(MemberPath, Capability)>> {
        let document = self.document(uri)?;
        let outline = document.outline();
        let Some(container) = outline.container_at(offset) else {
            return Ok(None);
        };
        let Some(super_type) = container.super_type.as_deref() else {
            return Ok(None);
        };
        let qualified = qualify_reference(outline, document.language(), document.package(), super_type);
        Ok(self
            .catalog
            .resolve_capability(super_type, self.environment.as_ref(), qualified.as_deref())
            .map(|capability| (container.path.clone(), capability)))
    }

    /// Proposals that may be inserted at `offset`, best first
    pub fn proposals_at(&self, uri: &str, offset: usize, prefix: Option<&str>) -> Result<Vec<Proposal>> {
        let Some((container, capability)) = self.container_at(uri, offset)? else {
            debug!("No container at {} in {}", offset, uri);
            return Ok(Vec::new());
        };
        let outline = self.document(uri)?.outline();
        let position = ProposalContext::position_at(outline, &container, offset);

        let proposals = self
            .catalog
            .proposals_applicable_to(capability.accepts(), prefix)
            .into_iter()
            .map(|descriptor| {
                let context = ProposalContext::new(descriptor, container.clone(), offset, position.clone())
                    .with_prefix(prefix.map(str::to_string));
                Proposal::for_descriptor(descriptor, context.unique_name(outline))
            })
            .collect::<Vec<_>>();
        debug!(
            "{} proposal(s) for {} ({}) at {}",
            proposals.len(),
            container,
            capability,
            offset
        );
        Ok(proposals)
    }

    /// Insert the member described by proposal `id` at `offset`
    pub fn apply_proposal(
        &mut self,
        uri: &str,
        offset: usize,
        id: &str,
        prefix: Option<String>,
        name: Option<String>,
    ) -> Result<OperationOutcome> {
        self.apply_proposal_at(uri, offset, id, prefix, name, None)
    }

    /// Like [`Workspace::apply_proposal`], with an explicit sibling position
    /// instead of the one implied by `offset`
    pub fn apply_proposal_at(
        &mut self,
        uri: &str,
        offset: usize,
        id: &str,
        prefix: Option<String>,
        name: Option<String>,
        position: Option<InsertPosition>,
    ) -> Result<OperationOutcome> {
        let descriptor = self
            .catalog
            .descriptor(id)
            .ok_or_else(|| ProposalError::UnknownProposal(id.to_string()))?;
        let (container, capability) = self
            .container_at(uri, offset)?
            .ok_or(ProposalError::NoContainer(offset))?;
        if !capability.accepts_child(descriptor.capability) {
            return Err(OperationError::precondition(format!(
                "{} does not accept a {}",
                container, descriptor.capability
            ))
            .into());
        }

        let outline = self.document(uri)?.outline();
        let position =
            position.unwrap_or_else(|| ProposalContext::position_at(outline, &container, offset));
        let context = ProposalContext::new(descriptor, container, offset, position)
            .with_prefix(prefix)
            .with_name(name);
        let operation = self.catalog.create_proposal(descriptor, context);
        self.run(uri, operation.as_ref())
    }

    /// Validate and run a structural operation on one document
    pub fn run(&mut self, uri: &str, operation: &dyn StructuralEdit) -> Result<OperationOutcome> {
        let document = self
            .documents
            .get_mut(uri)
            .ok_or_else(|| TrellisError::document_not_found(uri))?;
        let mut ctx = EditContext::new(
            document,
            self.environment.as_ref(),
            &self.catalog,
            &self.config,
        );
        let outcome = execute(operation, &mut ctx)?;
        info!("{} on {}", operation.label(), uri);
        Ok(outcome)
    }

    /// Choice sources for the linked groups of an insert
    pub fn choice_sources(
        &self,
        uri: &str,
        outcome: &OperationOutcome,
    ) -> Result<HashMap<String, ChoiceSource>> {
        let mut sources = HashMap::new();
        let has_super_type_slot = outcome
            .slots
            .iter()
            .any(|slot| slot.group == SUPER_TYPE_GROUP);
        let Some(base) = outcome.super_type.as_deref().filter(|_| has_super_type_slot) else {
            return Ok(sources);
        };

        let document = self.document(uri)?;
        let qualifiers = document
            .outline()
            .imports()
            .iter()
            .map(|import| (import.path.clone(), import.qualifier().to_string()))
            .collect();
        let job = SubtypeChoicesJob::new(
            self.environment.clone(),
            base,
            qualifiers,
            document.package().map(str::to_string),
        );
        sources.insert(SUPER_TYPE_GROUP.to_string(), ChoiceSource::Background(Box::new(job)));
        Ok(sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::TypeIndex;

    const SOURCE: &str = "package forms\n\nimport \"github.com/acme/ui/forms\"\n\ntype PersonForm struct {\n\tforms.Form\n\n\t// trellis:order:10.0\n\tTabs struct {\n\t\tfields.TabBox\n\t}\n}\n";

    fn workspace() -> Workspace {
        let mut workspace = Workspace::new(
            Arc::new(ProposalCatalog::with_defaults()),
            Arc::new(TypeIndex::default()),
            Config::default(),
        );
        workspace
            .open("mem://person.go", SOURCE, Some("github.com/acme/app/forms".into()))
            .unwrap();
        workspace
    }

    #[test]
    fn test_proposals_follow_container_capability() {
        let workspace = workspace();
        let in_form = SOURCE.find("\n\n\t// trellis").unwrap() + 1;
        let ids: Vec<String> = workspace
            .proposals_at("mem://person.go", in_form, None)
            .unwrap()
            .into_iter()
            .filter_map(|proposal| proposal.id)
            .collect();
        assert!(ids.contains(&"string-field".to_string()));
        assert!(!ids.contains(&"column".to_string()));

        let in_tabs = SOURCE.find("fields.TabBox").unwrap() + 14;
        let ids: Vec<String> = workspace
            .proposals_at("mem://person.go", in_tabs, None)
            .unwrap()
            .into_iter()
            .filter_map(|proposal| proposal.id)
            .collect();
        assert_eq!(ids, vec!["tab-page".to_string(), "menu".to_string()]);
    }

    #[test]
    fn test_apply_rejects_unaccepted_kind() {
        let mut workspace = workspace();
        let in_tabs = SOURCE.find("fields.TabBox").unwrap() + 14;
        let error = workspace
            .apply_proposal("mem://person.go", in_tabs, "string-field", None, None)
            .unwrap_err();
        assert!(error.is_precondition());
        assert_eq!(workspace.text("mem://person.go").unwrap(), SOURCE);
    }

    #[test]
    fn test_unknown_document() {
        let workspace = workspace();
        assert!(matches!(
            workspace.text("mem://missing.go"),
            Err(TrellisError::DocumentNotFound(_))
        ));
    }
}
