use std::sync::Arc;

use trellis::config::Config;
use trellis::operation::{
    CopyOperation, DeleteOperation, InsertOperation, MoveOperation, OperationError,
};
use trellis::ordering::InsertPosition;
use trellis::proposal::ProposalCatalog;
use trellis::recipe::{StructRecipe, NAME_GROUP, SUPER_TYPE_GROUP};
use trellis::symbols::TypeIndex;
use trellis::workspace::Workspace;
use trellis::{MemberPath, OrderKey, TrellisError};

const URI: &str = "mem://person.go";

const PERSON: &str = "package person

import (
\t\"github.com/acme/ui/fields\"
\t\"github.com/acme/ui/forms\"
)

type PersonForm struct {
\tforms.Form
\t// trellis:order:10.0
\tMainBox struct {
\t\tfields.GroupBox
\t\t// trellis:order:10.0
\t\tNameField struct {
\t\t\tfields.StringField
\t\t}
\t\t// trellis:order:20.0
\t\tAgeField struct {
\t\t\tfields.IntegerField
\t\t}
\t}
}

func (p *PersonForm) GetAgeField() *fields.IntegerField {
\treturn &p.MainBox.AgeField.IntegerField
}

func (p *PersonForm) GetMainBox() *fields.GroupBox {
\treturn &p.MainBox.GroupBox
}

func (p *PersonForm) GetNameField() *fields.StringField {
\treturn &p.MainBox.NameField.StringField
}
";

fn workspace(text: &str) -> Workspace {
    let mut workspace = Workspace::new(
        Arc::new(ProposalCatalog::with_defaults()),
        Arc::new(TypeIndex::default()),
        Config::default(),
    );
    workspace
        .open(URI, text, Some("github.com/acme/app/person".to_string()))
        .unwrap();
    workspace
}

fn path(path: &str) -> MemberPath {
    path.parse().unwrap()
}

/// Offset of the closing brace line of MainBox
fn end_of_main_box(text: &str) -> usize {
    text.find("\t}\n}\n").unwrap()
}

fn orders(workspace: &Workspace, container: &str) -> Vec<(String, Option<OrderKey>)> {
    workspace
        .document(URI)
        .unwrap()
        .outline()
        .children(&path(container))
        .into_iter()
        .map(|member| (member.name.clone(), member.order))
        .collect()
}

#[test]
fn test_insert_then_delete_restores_text() {
    let mut workspace = workspace(PERSON);
    let outcome = workspace
        .apply_proposal(URI, end_of_main_box(PERSON), "date-field", None, None)
        .unwrap();
    assert_eq!(outcome.member, Some(path("PersonForm/MainBox/DateField")));

    let text = workspace.text(URI).unwrap();
    assert!(text.contains(
        "\t\t// trellis:order:30.0\n\t\tDateField struct {\n\t\t\tfields.DateField\n\t\t}\n\t}\n}\n"
    ));
    assert!(text.contains(
        "}\n\nfunc (p *PersonForm) GetDateField() *fields.DateField {\n\treturn &p.MainBox.DateField.DateField\n}\n\nfunc (p *PersonForm) GetMainBox()"
    ));

    workspace
        .run(URI, &DeleteOperation::new(path("PersonForm/MainBox/DateField")))
        .unwrap();
    assert_eq!(workspace.text(URI).unwrap(), PERSON);
}

#[test]
fn test_insert_with_new_import_round_trips() {
    let mut workspace = workspace(PERSON);
    let outcome = workspace
        .apply_proposal(URI, end_of_main_box(PERSON), "menu", None, None)
        .unwrap();

    let text = workspace.text(URI).unwrap();
    assert!(text.contains(
        "\t\"github.com/acme/ui/forms\"\n\t\"github.com/acme/ui/menus\"\n)"
    ));
    assert!(text.contains("\t\tMyMenu struct {\n\t\t\tmenus.Menu\n\t\t}\n"));
    let get_menu = text.find("GetMyMenu()").unwrap();
    assert!(text.find("GetMainBox()").unwrap() < get_menu);
    assert!(get_menu < text.find("GetNameField()").unwrap());

    // Linked slots point at the live text
    let names: Vec<&str> = outcome
        .slots
        .iter()
        .filter(|slot| slot.group == NAME_GROUP)
        .map(|slot| &text[slot.range.clone()])
        .collect();
    assert_eq!(names, vec!["MyMenu", "MyMenu", "MyMenu"]);
    let super_type = outcome
        .slots
        .iter()
        .find(|slot| slot.group == SUPER_TYPE_GROUP)
        .unwrap();
    assert_eq!(&text[super_type.range.clone()], "menus.Menu");
    assert_eq!(
        outcome.exit_position,
        Some(text.find("\t}\n}\n").unwrap())
    );

    workspace
        .run(URI, &DeleteOperation::new(path("PersonForm/MainBox/MyMenu")))
        .unwrap();
    assert_eq!(workspace.text(URI).unwrap(), PERSON);
}

#[test]
fn test_insert_first_renumbers_siblings() {
    let mut workspace = workspace(PERSON);
    let insert = InsertOperation::new(
        path("PersonForm/MainBox"),
        "TitleField",
        vec!["github.com/acme/ui/fields.StringField".to_string()],
        InsertPosition::First,
        Box::new(StructRecipe),
    );
    workspace.run(URI, &insert).unwrap();

    assert_eq!(
        orders(&workspace, "PersonForm/MainBox"),
        vec![
            ("TitleField".to_string(), Some(OrderKey(10.0))),
            ("NameField".to_string(), Some(OrderKey(20.0))),
            ("AgeField".to_string(), Some(OrderKey(30.0))),
        ]
    );
    let text = workspace.text(URI).unwrap();
    assert!(text.contains(
        "\t\tfields.GroupBox\n\t\t// trellis:order:10.0\n\t\tTitleField struct {\n\t\t\tfields.StringField\n\t\t}\n\t\t// trellis:order:20.0\n\t\tNameField struct {"
    ));
}

fn insert_then_delete(position: InsertPosition) {
    let mut workspace = workspace(PERSON);
    let insert = InsertOperation::new(
        path("PersonForm/MainBox"),
        "TitleField",
        vec!["github.com/acme/ui/fields.StringField".to_string()],
        position,
        Box::new(StructRecipe),
    );
    workspace.run(URI, &insert).unwrap();
    assert_ne!(workspace.text(URI).unwrap(), PERSON);

    workspace
        .run(URI, &DeleteOperation::new(path("PersonForm/MainBox/TitleField")))
        .unwrap();
    assert_eq!(
        orders(&workspace, "PersonForm/MainBox"),
        vec![
            ("NameField".to_string(), Some(OrderKey(10.0))),
            ("AgeField".to_string(), Some(OrderKey(20.0))),
        ]
    );
    assert_eq!(workspace.text(URI).unwrap(), PERSON);
}

#[test]
fn test_insert_first_then_delete_restores_keys() {
    insert_then_delete(InsertPosition::First);
}

#[test]
fn test_insert_before_then_delete_restores_keys() {
    insert_then_delete(InsertPosition::Before("AgeField".to_string()));
}

#[test]
fn test_insert_after_keeps_earlier_keys() {
    let mut workspace = workspace(PERSON);
    let insert = InsertOperation::new(
        path("PersonForm/MainBox"),
        "TitleField",
        vec!["github.com/acme/ui/fields.StringField".to_string()],
        InsertPosition::After("NameField".to_string()),
        Box::new(StructRecipe),
    );
    workspace.run(URI, &insert).unwrap();

    assert_eq!(
        orders(&workspace, "PersonForm/MainBox"),
        vec![
            ("NameField".to_string(), Some(OrderKey(10.0))),
            ("TitleField".to_string(), Some(OrderKey(20.0))),
            ("AgeField".to_string(), Some(OrderKey(30.0))),
        ]
    );
}

#[test]
fn test_insert_before_missing_target_is_rejected() {
    let mut workspace = workspace(PERSON);
    let insert = InsertOperation::new(
        path("PersonForm/MainBox"),
        "TitleField",
        vec!["github.com/acme/ui/fields.StringField".to_string()],
        InsertPosition::Before("MissingField".to_string()),
        Box::new(StructRecipe),
    );
    let error = workspace.run(URI, &insert).unwrap_err();
    assert!(error.is_precondition());
    assert_eq!(workspace.text(URI).unwrap(), PERSON);
}

#[test]
fn test_insert_rejects_taken_name() {
    let mut workspace = workspace(PERSON);
    let insert = InsertOperation::new(
        path("PersonForm/MainBox"),
        "AgeField",
        vec!["github.com/acme/ui/fields.IntegerField".to_string()],
        InsertPosition::Last,
        Box::new(StructRecipe),
    );
    assert!(matches!(
        workspace.run(URI, &insert),
        Err(TrellisError::Operation(OperationError::Precondition(_)))
    ));
}

const COPY_SOURCE: &str = "package person

import (
\t\"github.com/acme/ui/fields\"
\t\"github.com/acme/ui/forms\"
)

type PersonForm struct {
\tforms.Form
\t// trellis:order:10.0
\tMainBox struct {
\t\tfields.GroupBox
\t\t// trellis:order:10.0
\t\tName struct {
\t\t\tfields.StringField
\t\t\t// trellis:order:10.0
\t\t\tNameExtra struct {
\t\t\t\tfields.Label
\t\t\t}
\t\t}
\t\t// trellis:order:20.0
\t\tAge struct {
\t\t\tfields.IntegerField
\t\t}
\t}
}
";

#[test]
fn test_copy_renames_whole_words_only() {
    let mut workspace = workspace(COPY_SOURCE);
    let copy = CopyOperation::new(
        path("PersonForm/MainBox/Name"),
        path("PersonForm/MainBox"),
        "NameCopy",
        InsertPosition::Last,
    );
    let outcome = workspace.run(URI, &copy).unwrap();
    assert_eq!(outcome.member, Some(path("PersonForm/MainBox/NameCopy")));

    let text = workspace.text(URI).unwrap();
    assert!(text.contains(
        "\t\t// trellis:order:30.0\n\t\tNameCopy struct {\n\t\t\tfields.StringField\n\t\t\t// trellis:order:10.0\n\t\t\tNameExtra struct {\n\t\t\t\tfields.Label\n\t\t\t}\n\t\t}\n\t}\n}\n"
    ));
    assert_eq!(text.matches("NameExtra struct").count(), 2);
    assert!(!text.contains("NameCopyExtra"));
    // The original is untouched
    assert!(text.contains("\t\t// trellis:order:10.0\n\t\tName struct {"));
    assert!(text.ends_with(
        "}\n\nfunc (p *PersonForm) GetNameCopy() *fields.StringField {\n\treturn &p.MainBox.NameCopy.StringField\n}\n"
    ));
}

#[test]
fn test_deleting_copy_keeps_original_descendant_accessor() {
    let source = format!(
        "{}\nfunc (p *PersonForm) GetNameExtra() *fields.Label {{\n\treturn &p.MainBox.Name.NameExtra.Label\n}}\n",
        COPY_SOURCE
    );
    let mut workspace = workspace(&source);
    workspace
        .run(
            URI,
            &CopyOperation::new(
                path("PersonForm/MainBox/Name"),
                path("PersonForm/MainBox"),
                "NameCopy",
                InsertPosition::Last,
            ),
        )
        .unwrap();
    assert!(workspace.text(URI).unwrap().contains("GetNameCopy()"));

    workspace
        .run(URI, &DeleteOperation::new(path("PersonForm/MainBox/NameCopy")))
        .unwrap();
    let text = workspace.text(URI).unwrap();
    assert!(text.contains("GetNameExtra() *fields.Label"));
    assert_eq!(text, source);
}

const MOVE_SOURCE: &str = "package person

import (
\t\"github.com/acme/ui/fields\"
\t\"github.com/acme/ui/forms\"
)

type PersonForm struct {
\tforms.Form
\t// trellis:order:10.0
\tMainBox struct {
\t\tfields.GroupBox
\t\t// trellis:order:10.0
\t\tNameField struct {
\t\t\tfields.StringField
\t\t}
\t\t// trellis:order:20.0
\t\tAgeField struct {
\t\t\tfields.IntegerField
\t\t}
\t}
\t// trellis:order:20.0
\tDetailBox struct {
\t\tfields.GroupBox
\t}
}

func (p *PersonForm) GetAgeField() *fields.IntegerField {
\treturn &p.MainBox.AgeField.IntegerField
}
";

const MOVED: &str = "package person

import (
\t\"github.com/acme/ui/fields\"
\t\"github.com/acme/ui/forms\"
)

type PersonForm struct {
\tforms.Form
\t// trellis:order:10.0
\tMainBox struct {
\t\tfields.GroupBox
\t\t// trellis:order:10.0
\t\tNameField struct {
\t\t\tfields.StringField
\t\t}
\t}
\t// trellis:order:20.0
\tDetailBox struct {
\t\tfields.GroupBox
\t\t// trellis:order:10.0
\t\tAgeField struct {
\t\t\tfields.IntegerField
\t\t}
\t}
}

func (p *PersonForm) GetAgeField() *fields.IntegerField {
\treturn &p.DetailBox.AgeField.IntegerField
}
";

#[test]
fn test_move_relocates_member_and_accessor() {
    let mut workspace = workspace(MOVE_SOURCE);
    let moving = MoveOperation::new(
        path("PersonForm/MainBox/AgeField"),
        path("PersonForm/DetailBox"),
        InsertPosition::First,
    );
    let outcome = workspace.run(URI, &moving).unwrap();
    assert_eq!(outcome.member, Some(path("PersonForm/DetailBox/AgeField")));
    assert_eq!(workspace.text(URI).unwrap(), MOVED);
}

#[test]
fn test_move_into_own_subtree_is_rejected() {
    let mut workspace = workspace(MOVE_SOURCE);
    let moving = MoveOperation::new(
        path("PersonForm/MainBox"),
        path("PersonForm/MainBox/NameField"),
        InsertPosition::Last,
    );
    assert!(workspace.run(URI, &moving).unwrap_err().is_precondition());
    assert_eq!(workspace.text(URI).unwrap(), MOVE_SOURCE);
}

const COMPOSITE: &str = "package person

import (
\t\"github.com/acme/ui/fields\"
\t\"github.com/acme/ui/forms\"
\t\"github.com/acme/ui/menus\"
)

type PersonForm struct {
\tforms.Form
\t// trellis:order:10.0
\tMainBox struct {
\t\tfields.GroupBox
\t\t// trellis:order:10.0
\t\tNameField struct {
\t\t\tfields.StringField
\t\t}
\t\t// trellis:order:20.0
\t\tMyMenu struct {
\t\t\tmenus.Menu
\t\t}
\t}
\t// trellis:order:20.0
\tDetailBox struct {
\t\tfields.GroupBox
\t}
}

func (p *PersonForm) GetDetailBox() *fields.GroupBox {
\treturn &p.DetailBox.GroupBox
}

func (p *PersonForm) GetMainBox() *fields.GroupBox {
\treturn &p.MainBox.GroupBox
}

func (p *PersonForm) GetMyMenu() *menus.Menu {
\treturn &p.MainBox.MyMenu.Menu
}

func (p *PersonForm) GetNameField() *fields.StringField {
\treturn &p.MainBox.NameField.StringField
}
";

const COMPOSITE_DELETED: &str = "package person

import (
\t\"github.com/acme/ui/fields\"
\t\"github.com/acme/ui/forms\"
)

type PersonForm struct {
\tforms.Form
\t// trellis:order:20.0
\tDetailBox struct {
\t\tfields.GroupBox
\t}
}

func (p *PersonForm) GetDetailBox() *fields.GroupBox {
\treturn &p.DetailBox.GroupBox
}
";

#[test]
fn test_delete_composite_removes_descendant_accessors_and_imports() {
    let mut workspace = workspace(COMPOSITE);
    let outcome = workspace
        .run(URI, &DeleteOperation::new(path("PersonForm/MainBox")))
        .unwrap();
    // Three accessors, one import, the member itself, DetailBox rekeyed
    assert_eq!(outcome.steps, 6);
    assert_eq!(workspace.text(URI).unwrap(), COMPOSITE_DELETED);
}

#[test]
fn test_delete_root_is_rejected() {
    let mut workspace = workspace(PERSON);
    let error = workspace
        .run(URI, &DeleteOperation::new(path("PersonForm")))
        .unwrap_err();
    assert!(error.is_precondition());
}
