//! Structural view of a Go source file.
//!
//! The outline records every top-level struct type as a root container and
//! every named field whose type is an anonymous struct as a member. A member's
//! first embedded field is its supertype, and the `// trellis:order:<n>` comment
//! line directly above it carries its order key. Methods and imports are kept
//! for the accessor and import synchronizers.

use hashbrown::HashMap;
use std::ops::Range;
use tree_sitter::{Node, Tree};

use crate::core::{MemberPath, OrderKey};
use crate::editor::{line_end, line_start};
use crate::language::LanguageSupport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageClause {
    pub name: String,
    /// Offset just past the package clause line
    pub line_end: usize,
}

/// One `import` declaration, single or grouped
#[derive(Debug, Clone)]
pub struct ImportDecl {
    /// Whole lines of the declaration
    pub span: Range<usize>,
    pub grouped: bool,
    /// Start of the line holding the closing parenthesis, if it sits on its own line
    pub close_line_start: Option<usize>,
    /// Indices into [`Outline::imports`]
    pub specs: Vec<usize>,
}

/// One import spec
#[derive(Debug, Clone)]
pub struct ImportDirective {
    pub path: String,
    pub alias: Option<String>,
    /// Whole line of the spec
    pub line: Range<usize>,
    /// Index into [`Outline::import_decls`]
    pub decl: usize,
}

impl ImportDirective {
    /// Name the package is referenced by in this file
    pub fn qualifier(&self) -> &str {
        match self.alias.as_deref() {
            Some(alias) => alias,
            None => self.path.rsplit('/').next().unwrap_or(&self.path),
        }
    }
}

/// Body braces of a struct type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyInfo {
    /// Offset just past `{`
    pub open: usize,
    /// Offset of `}`
    pub close: usize,
    /// Where a member appended at the end is inserted
    pub insert_at: usize,
    /// `}` shares its line with other content
    pub inline: bool,
}

#[derive(Debug, Clone)]
pub struct MemberNode {
    pub path: MemberPath,
    pub name: String,
    pub name_range: Range<usize>,
    pub order: Option<OrderKey>,
    /// Byte range of the order key literal value
    pub order_literal: Option<Range<usize>>,
    pub super_type: Option<String>,
    pub super_type_range: Option<Range<usize>>,
    /// Whole lines, including the order comment
    pub span: Range<usize>,
    pub body: Option<BodyInfo>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl MemberNode {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Indentation depth of the declaration line
    pub fn depth(&self) -> usize {
        self.path.depth()
    }
}

/// A method declaration at file level
#[derive(Debug, Clone)]
pub struct MethodDecl {
    /// Receiver base type name
    pub owner: String,
    pub name: String,
    pub name_range: Range<usize>,
    /// Whole lines, including an attached doc comment
    pub span: Range<usize>,
}

/// Any top-level named type and the types it embeds
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: String,
    pub embedded: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Outline {
    package: Option<PackageClause>,
    imports: Vec<ImportDirective>,
    import_decls: Vec<ImportDecl>,
    members: Vec<MemberNode>,
    index: HashMap<MemberPath, usize>,
    methods: Vec<MethodDecl>,
    type_decls: Vec<TypeDecl>,
}

impl Outline {
    /// Build the outline of `source` from its syntax tree
    pub fn read(tree: &Tree, source: &str, language: &dyn LanguageSupport) -> Self {
        let mut reader = OutlineReader {
            source,
            language,
            outline: Outline::default(),
        };
        reader.read_source_file(tree.root_node());
        reader.outline
    }

    pub fn package(&self) -> Option<&PackageClause> {
        self.package.as_ref()
    }

    pub fn imports(&self) -> &[ImportDirective] {
        &self.imports
    }

    pub fn import_decls(&self) -> &[ImportDecl] {
        &self.import_decls
    }

    pub fn import_by_path(&self, path: &str) -> Option<&ImportDirective> {
        self.imports.iter().find(|import| import.path == path)
    }

    pub fn import_by_qualifier(&self, qualifier: &str) -> Option<&ImportDirective> {
        self.imports
            .iter()
            .find(|import| import.qualifier() == qualifier)
    }

    pub fn methods(&self) -> &[MethodDecl] {
        &self.methods
    }

    pub fn method(&self, owner: &str, name: &str) -> Option<&MethodDecl> {
        self.methods
            .iter()
            .find(|method| method.owner == owner && method.name == name)
    }

    pub fn type_decls(&self) -> &[TypeDecl] {
        &self.type_decls
    }

    pub fn member(&self, path: &MemberPath) -> Option<&MemberNode> {
        self.index.get(path).map(|&i| &self.members[i])
    }

    pub fn roots(&self) -> impl Iterator<Item = &MemberNode> {
        self.members.iter().filter(|member| member.is_root())
    }

    /// All members in document order, roots included
    pub fn members(&self) -> &[MemberNode] {
        &self.members
    }

    /// Direct children of `path` in document order
    pub fn children(&self, path: &MemberPath) -> Vec<&MemberNode> {
        self.index
            .get(path)
            .map(|&i| {
                self.members[i]
                    .children
                    .iter()
                    .map(|&c| &self.members[c])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `path` and everything below it, pre-order
    pub fn subtree(&self, path: &MemberPath) -> Vec<&MemberNode> {
        let mut out = Vec::new();
        if let Some(&i) = self.index.get(path) {
            self.collect_subtree(i, &mut out);
        }
        out
    }

    fn collect_subtree<'a>(&'a self, index: usize, out: &mut Vec<&'a MemberNode>) {
        let member = &self.members[index];
        out.push(member);
        for &child in &member.children {
            self.collect_subtree(child, out);
        }
    }

    pub fn parent(&self, path: &MemberPath) -> Option<&MemberNode> {
        let &i = self.index.get(path)?;
        self.members[i].parent.map(|p| &self.members[p])
    }

    /// Innermost struct body containing `offset`
    pub fn container_at(&self, offset: usize) -> Option<&MemberNode> {
        self.members
            .iter()
            .filter(|member| {
                member
                    .body
                    .is_some_and(|body| body.open <= offset && offset <= body.close)
            })
            .max_by_key(|member| member.path.depth())
    }

    /// True if any member below `root` is named `name`
    pub fn name_taken(&self, root: &str, name: &str) -> bool {
        self.members
            .iter()
            .any(|member| !member.is_root() && member.path.root_name() == root && member.name == name)
    }
}

struct PendingOrder {
    key: OrderKey,
    literal: Option<Range<usize>>,
    comment_start: usize,
    row: usize,
}

struct OutlineReader<'a> {
    source: &'a str,
    language: &'a dyn LanguageSupport,
    outline: Outline,
}

impl<'a> OutlineReader<'a> {
    fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or_default()
    }

    fn whole_lines(&self, start: usize, end: usize) -> Range<usize> {
        line_start(self.source, start)..line_end(self.source, end)
    }

    fn starts_line(&self, offset: usize) -> bool {
        self.source[line_start(self.source, offset)..offset]
            .trim()
            .is_empty()
    }

    fn read_source_file(&mut self, root: Node) {
        let mut cursor = root.walk();
        // (start offset, last row) of the comment block seen just before the current node
        let mut comment_block: Option<(usize, usize)> = None;

        for child in root.children(&mut cursor) {
            match child.kind() {
                "comment" => {
                    let row = child.start_position().row;
                    comment_block = match comment_block {
                        Some((start, end_row)) if end_row + 1 == row => {
                            Some((start, child.end_position().row))
                        }
                        _ => Some((child.start_byte(), child.end_position().row)),
                    };
                    continue;
                }
                "package_clause" => self.read_package(child),
                "import_declaration" => self.read_import_declaration(child),
                "type_declaration" => self.read_type_declaration(child),
                "method_declaration" => {
                    let doc_start = comment_block
                        .filter(|&(_, end_row)| end_row + 1 == child.start_position().row)
                        .map(|(start, _)| start);
                    self.read_method(child, doc_start);
                }
                _ => {}
            }
            comment_block = None;
        }
    }

    fn read_package(&mut self, clause: Node) {
        let mut cursor = clause.walk();
        let name = clause
            .children(&mut cursor)
            .find(|child| child.kind() == "package_identifier")
            .map(|child| self.text(child).to_string())
            .unwrap_or_default();
        self.outline.package = Some(PackageClause {
            name,
            line_end: line_end(self.source, clause.end_byte()),
        });
    }

    fn read_import_declaration(&mut self, decl: Node) {
        let decl_index = self.outline.import_decls.len();
        let mut entry = ImportDecl {
            span: self.whole_lines(decl.start_byte(), decl.end_byte()),
            grouped: false,
            close_line_start: None,
            specs: Vec::new(),
        };

        let mut cursor = decl.walk();
        for child in decl.children(&mut cursor) {
            match child.kind() {
                "import_spec" => {
                    if let Some(spec) = self.read_import_spec(child, decl_index) {
                        entry.specs.push(spec);
                    }
                }
                "import_spec_list" => {
                    entry.grouped = true;
                    let mut list_cursor = child.walk();
                    for spec in child.children(&mut list_cursor) {
                        match spec.kind() {
                            "import_spec" => {
                                if let Some(spec) = self.read_import_spec(spec, decl_index) {
                                    entry.specs.push(spec);
                                }
                            }
                            ")" if self.starts_line(spec.start_byte()) => {
                                entry.close_line_start =
                                    Some(line_start(self.source, spec.start_byte()));
                            }
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }

        self.outline.import_decls.push(entry);
    }

    fn read_import_spec(&mut self, spec: Node, decl: usize) -> Option<usize> {
        let path = spec.child_by_field_name("path")?;
        let path = self.text(path).trim_matches(|c| c == '"' || c == '`');
        if path.is_empty() {
            return None;
        }
        let alias = spec
            .child_by_field_name("name")
            .map(|name| self.text(name).to_string());

        self.outline.imports.push(ImportDirective {
            path: path.to_string(),
            alias,
            line: self.whole_lines(spec.start_byte(), spec.end_byte()),
            decl,
        });
        Some(self.outline.imports.len() - 1)
    }

    fn read_type_declaration(&mut self, decl: Node) {
        let mut cursor = decl.walk();
        let children: Vec<Node> = decl.children(&mut cursor).collect();
        let grouped = children.iter().any(|child| child.kind() == "(");
        let specs = children.into_iter().filter(|child| child.kind() == "type_spec");

        for spec in specs {
            let (Some(name), Some(ty)) = (
                spec.child_by_field_name("name"),
                spec.child_by_field_name("type"),
            ) else {
                continue;
            };
            let type_name = self.text(name).to_string();

            let embedded = if ty.kind() == "struct_type" {
                let span = if grouped {
                    self.whole_lines(spec.start_byte(), spec.end_byte())
                } else {
                    self.whole_lines(decl.start_byte(), decl.end_byte())
                };
                let index = self.push_member(MemberNode {
                    path: MemberPath::root(type_name.clone()),
                    name: type_name.clone(),
                    name_range: name.byte_range(),
                    order: None,
                    order_literal: None,
                    super_type: None,
                    super_type_range: None,
                    span,
                    body: None,
                    parent: None,
                    children: Vec::new(),
                });
                self.read_struct_body(ty, index)
            } else {
                match ty.kind() {
                    "type_identifier" | "qualified_type" | "generic_type" => {
                        vec![self.text(ty).to_string()]
                    }
                    _ => Vec::new(),
                }
            };

            self.outline.type_decls.push(TypeDecl {
                name: type_name,
                embedded,
            });
        }
    }

    fn push_member(&mut self, member: MemberNode) -> usize {
        let index = self.outline.members.len();
        if let Some(parent) = member.parent {
            self.outline.members[parent].children.push(index);
        }
        self.outline.index.insert(member.path.clone(), index);
        self.outline.members.push(member);
        index
    }

    /// Reads the fields of a struct type into the member at `index`; returns its embedded types
    fn read_struct_body(&mut self, struct_type: Node, index: usize) -> Vec<String> {
        let mut embedded = Vec::new();
        let mut cursor = struct_type.walk();
        let Some(list) = struct_type
            .children(&mut cursor)
            .find(|child| child.kind() == "field_declaration_list")
        else {
            return embedded;
        };

        let open = list.start_byte() + 1;
        let close = list.end_byte().saturating_sub(1);
        let inline = !self.starts_line(close);
        self.outline.members[index].body = Some(BodyInfo {
            open,
            close,
            insert_at: if inline {
                close
            } else {
                line_start(self.source, close)
            },
            inline,
        });

        let mut pending: Option<PendingOrder> = None;
        let mut list_cursor = list.walk();
        for child in list.children(&mut list_cursor) {
            match child.kind() {
                "comment" => {
                    let text = self.text(child);
                    pending = self
                        .language
                        .extract_order(text)
                        .filter(|_| self.starts_line(child.start_byte()))
                        .map(|key| PendingOrder {
                            key,
                            literal: self.language.find_order_literal(text).map(|range| {
                                child.start_byte() + range.start..child.start_byte() + range.end
                            }),
                            comment_start: child.start_byte(),
                            row: child.start_position().row,
                        });
                }
                "field_declaration" => {
                    let order = pending
                        .take()
                        .filter(|order| order.row + 1 == child.start_position().row);
                    if let Some(ty) = self.read_field(child, index, order) {
                        embedded.push(ty);
                    }
                }
                _ => pending = None,
            }
        }
        embedded
    }

    /// Returns the type of an embedded field
    fn read_field(
        &mut self,
        field: Node,
        parent: usize,
        order: Option<PendingOrder>,
    ) -> Option<String> {
        let ty = field.child_by_field_name("type")?;

        let Some(name) = field.child_by_field_name("name") else {
            // Embedded field, `*T` keeps its star
            let range = field.start_byte()..ty.end_byte();
            let type_ref = self.source[range.clone()].replace(char::is_whitespace, "");
            let parent = &mut self.outline.members[parent];
            if parent.super_type.is_none() {
                parent.super_type = Some(type_ref.clone());
                parent.super_type_range = Some(range);
            }
            return Some(type_ref);
        };

        if ty.kind() != "struct_type" {
            return None;
        }

        let member_name = self.text(name).to_string();
        let path = self.outline.members[parent].path.child(member_name.clone());
        let start = order
            .as_ref()
            .map(|order| order.comment_start)
            .unwrap_or(field.start_byte());

        let index = self.push_member(MemberNode {
            path,
            name: member_name,
            name_range: name.byte_range(),
            order: order.as_ref().map(|order| order.key),
            order_literal: order.and_then(|order| order.literal),
            super_type: None,
            super_type_range: None,
            span: self.whole_lines(start, field.end_byte()),
            body: None,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.read_struct_body(ty, index);
        None
    }

    fn read_method(&mut self, method: Node, doc_start: Option<usize>) {
        let (Some(receiver), Some(name)) = (
            method.child_by_field_name("receiver"),
            method.child_by_field_name("name"),
        ) else {
            return;
        };

        // `(f *PersonForm)` or `(PersonForm)`
        let owner = self
            .text(receiver)
            .trim_matches(|c| c == '(' || c == ')')
            .split_whitespace()
            .last()
            .unwrap_or_default()
            .trim_start_matches('*')
            .split('[')
            .next()
            .unwrap_or_default()
            .to_string();

        let start = doc_start.unwrap_or(method.start_byte());
        self.outline.methods.push(MethodDecl {
            owner,
            name: self.text(name).to_string(),
            name_range: name.byte_range(),
            span: self.whole_lines(start, method.end_byte()),
        });
    }
}
