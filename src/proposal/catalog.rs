use hashbrown::HashMap;
use std::collections::VecDeque;

use super::{Capability, ProposalContext, ProposalDescriptor};
use crate::operation::{InsertOperation, StructuralEdit};
use crate::recipe::{StructRecipe, TableRecipe};
use crate::symbols::SymbolEnvironment;

/// Import path of the UI kit the default catalog proposes members from
pub const UI_KIT: &str = "github.com/acme/ui";

fn kit(package: &str, name: &str) -> String {
    format!("{}/{}.{}", UI_KIT, package, name)
}

fn insert_struct(descriptor: &ProposalDescriptor, context: ProposalContext) -> Box<dyn StructuralEdit> {
    Box::new(InsertOperation::from_proposal(descriptor, context, Box::new(StructRecipe)))
}

fn insert_table(descriptor: &ProposalDescriptor, context: ProposalContext) -> Box<dyn StructuralEdit> {
    let recipe = TableRecipe::new(kit("fields", "Table"), kit("fields", "StringColumn"));
    Box::new(InsertOperation::from_proposal(descriptor, context, Box::new(recipe)))
}

/// Registry of proposal descriptors and of the capabilities of known supertypes.
///
/// Built once at startup and passed to the workspace; read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ProposalCatalog {
    descriptors: Vec<ProposalDescriptor>,
    /// Simple type name to capability
    type_capabilities: HashMap<String, Capability>,
}

impl ProposalCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of the standard UI kit
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();

        catalog.register_type("Form", Capability::Form);
        for (name, capability) in [
            ("Field", Capability::FormField),
            ("StringField", Capability::ValueField),
            ("IntegerField", Capability::ValueField),
            ("DateField", Capability::ValueField),
            ("BooleanField", Capability::ValueField),
            ("Button", Capability::Button),
            ("GroupBox", Capability::GroupBox),
            ("TabBox", Capability::TabBox),
            ("TabPage", Capability::TabPage),
            ("TableField", Capability::TableField),
            ("Table", Capability::Table),
            ("StringColumn", Capability::Column),
            ("Menu", Capability::Menu),
            ("CodeType", Capability::CodeType),
            ("Code", Capability::Code),
        ] {
            catalog.register_type(name, capability);
        }

        let value_fields = [
            ("string-field", "String field", "StringField", "String", 100),
            ("integer-field", "Integer field", "IntegerField", "Integer", 90),
            ("date-field", "Date field", "DateField", "Date", 80),
            ("boolean-field", "Boolean field", "BooleanField", "Boolean", 70),
        ];
        for (id, label, type_name, stem, relevance) in value_fields {
            catalog.register(
                ProposalDescriptor::new(id, label, Capability::ValueField, insert_struct)
                    .with_super_types([kit("fields", type_name), kit("fields", "Field")])
                    .with_name(stem, "Field")
                    .with_icon("field")
                    .with_relevance(relevance),
            );
        }

        catalog.register(
            ProposalDescriptor::new("button", "Button", Capability::Button, insert_struct)
                .with_super_types([kit("fields", "Button")])
                .with_name("My", "Button")
                .with_icon("button")
                .with_relevance(60),
        );
        catalog.register(
            ProposalDescriptor::new("group-box", "Group box", Capability::GroupBox, insert_struct)
                .with_super_types([kit("fields", "GroupBox")])
                .with_name("My", "Box")
                .with_icon("group")
                .with_relevance(50),
        );
        catalog.register(
            ProposalDescriptor::new("tab-box", "Tab box", Capability::TabBox, insert_struct)
                .with_super_types([kit("fields", "TabBox")])
                .with_name("My", "TabBox")
                .with_icon("tabs")
                .with_relevance(40),
        );
        catalog.register(
            ProposalDescriptor::new("tab-page", "Tab page", Capability::TabPage, insert_struct)
                .with_super_types([kit("fields", "TabPage")])
                .with_name("My", "Page")
                .with_icon("tab")
                .with_relevance(45),
        );
        catalog.register(
            ProposalDescriptor::new("table-field", "Table field", Capability::TableField, insert_table)
                .with_super_types([kit("fields", "TableField")])
                .with_name("My", "TableField")
                .with_icon("table")
                .with_relevance(30),
        );
        catalog.register(
            ProposalDescriptor::new("column", "String column", Capability::Column, insert_struct)
                .with_super_types([kit("fields", "StringColumn")])
                .with_name("My", "Column")
                .with_icon("column")
                .with_relevance(50),
        );
        catalog.register(
            ProposalDescriptor::new("menu", "Menu", Capability::Menu, insert_struct)
                .with_super_types([kit("menus", "Menu")])
                .with_name("My", "Menu")
                .with_icon("menu")
                .with_relevance(10),
        );
        catalog.register(
            ProposalDescriptor::new("code", "Code", Capability::Code, insert_struct)
                .with_super_types([kit("codes", "Code")])
                .with_name("My", "Code")
                .with_icon("code")
                .with_relevance(20),
        );

        catalog
    }

    pub fn register(&mut self, descriptor: ProposalDescriptor) {
        self.descriptors.retain(|existing| existing.id != descriptor.id);
        self.descriptors.push(descriptor);
    }

    pub fn register_type(&mut self, simple_name: impl Into<String>, capability: Capability) {
        self.type_capabilities.insert(simple_name.into(), capability);
    }

    pub fn descriptors(&self) -> &[ProposalDescriptor] {
        &self.descriptors
    }

    pub fn descriptor(&self, id: &str) -> Option<&ProposalDescriptor> {
        self.descriptors.iter().find(|descriptor| descriptor.id == id)
    }

    /// Capability of a supertype reference, by its simple name
    pub fn capability_of(&self, type_ref: &str) -> Option<Capability> {
        let type_ref = type_ref.trim_start_matches('*');
        let simple = type_ref.rsplit('.').next().unwrap_or(type_ref);
        self.type_capabilities.get(simple).copied()
    }

    /// Capability of a supertype, following embedded types through the environment
    pub fn resolve_capability(
        &self,
        type_ref: &str,
        environment: &dyn SymbolEnvironment,
        qualified: Option<&str>,
    ) -> Option<Capability> {
        if let Some(capability) = self.capability_of(type_ref) {
            return Some(capability);
        }

        let mut queue: VecDeque<String> = qualified.map(str::to_string).into_iter().collect();
        let mut visited = 0;
        while let Some(current) = queue.pop_front() {
            visited += 1;
            if visited > 64 {
                break;
            }
            if let Some(capability) = self.capability_of(&current) {
                return Some(capability);
            }
            queue.extend(environment.embedded_types(&current));
        }
        None
    }

    /// Descriptors whose capability a container accepting `accepted` takes, best first
    pub fn proposals_applicable_to(
        &self,
        accepted: &[Capability],
        context_prefix: Option<&str>,
    ) -> Vec<&ProposalDescriptor> {
        let mut applicable: Vec<&ProposalDescriptor> = self
            .descriptors
            .iter()
            .filter(|descriptor| {
                accepted
                    .iter()
                    .any(|capability| descriptor.capability.is_a(*capability))
            })
            .filter(|descriptor| descriptor.matches_prefix(context_prefix.unwrap_or("")))
            .collect();
        applicable.sort_by(|a, b| b.relevance.cmp(&a.relevance).then_with(|| a.label.cmp(&b.label)));
        applicable
    }

    /// Instantiate the operation for `descriptor` in `context`
    pub fn create_proposal(
        &self,
        descriptor: &ProposalDescriptor,
        context: ProposalContext,
    ) -> Box<dyn StructuralEdit> {
        descriptor.create(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applicable_to_form() {
        let catalog = ProposalCatalog::with_defaults();
        let ids: Vec<&str> = catalog
            .proposals_applicable_to(Capability::Form.accepts(), None)
            .iter()
            .map(|descriptor| descriptor.id.as_str())
            .collect();
        assert_eq!(ids.first(), Some(&"string-field"));
        assert!(ids.contains(&"table-field"));
        assert!(ids.contains(&"menu"));
        assert!(!ids.contains(&"column"));
    }

    #[test]
    fn test_applicable_to_tab_box() {
        let catalog = ProposalCatalog::with_defaults();
        let ids: Vec<&str> = catalog
            .proposals_applicable_to(Capability::TabBox.accepts(), None)
            .iter()
            .map(|descriptor| descriptor.id.as_str())
            .collect();
        assert_eq!(ids, vec!["tab-page", "menu"]);
    }

    #[test]
    fn test_prefix_filter() {
        let catalog = ProposalCatalog::with_defaults();
        let ids: Vec<&str> = catalog
            .proposals_applicable_to(Capability::Form.accepts(), Some("int"))
            .iter()
            .map(|descriptor| descriptor.id.as_str())
            .collect();
        assert_eq!(ids, vec!["integer-field"]);
    }

    #[test]
    fn test_capability_of() {
        let catalog = ProposalCatalog::with_defaults();
        assert_eq!(catalog.capability_of("forms.Form"), Some(Capability::Form));
        assert_eq!(catalog.capability_of("*fields.StringField"), Some(Capability::ValueField));
        assert_eq!(catalog.capability_of("fields.Unknown"), None);
    }
}
