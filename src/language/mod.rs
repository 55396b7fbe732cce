pub mod go;

use std::ops::Range;

use crate::core::OrderKey;

pub use go::Go;

/// What an accessor for one member looks like
#[derive(Debug, Clone)]
pub struct AccessorSpec<'a> {
    /// Top-level type receiving the method
    pub owner: &'a str,
    /// Generated method name, e.g. `GetNameField`
    pub name: &'a str,
    /// Field path below the owner, e.g. `["MainBox", "NameField"]`
    pub field_path: &'a [String],
    /// Embedded supertype reference of the member, as written in source
    pub super_type: Option<&'a str>,
}

/// Rendered accessor text and where the member name and supertype occur in it
#[derive(Debug, Clone)]
pub struct RenderedAccessor {
    pub text: String,
    pub name_ranges: Vec<Range<usize>>,
    /// Supertype reference in the return type
    pub type_range: Option<Range<usize>>,
    /// Embedded field name in the returned selector
    pub embedded_range: Option<Range<usize>>,
}

/// Source dialect rules used by the structural engine
pub trait LanguageSupport: Send + Sync {
    /// Order key carried by a comment, if it is an order literal comment
    fn extract_order(&self, comment_text: &str) -> Option<OrderKey>;

    /// Byte range of the first order key literal value in `text`
    fn find_order_literal(&self, text: &str) -> Option<Range<usize>>;

    /// Comment line (without indentation or newline) carrying `key`
    fn order_comment(&self, key: OrderKey) -> String;

    /// Accessor method declaration, ending with a newline
    fn render_accessor(&self, spec: &AccessorSpec<'_>) -> RenderedAccessor;

    /// Single import spec (without the `import` keyword)
    fn render_import_spec(&self, path: &str, alias: Option<&str>) -> String;

    /// Package qualifier of a type reference (`fields` for `fields.StringField`)
    fn qualifier<'a>(&self, type_ref: &'a str) -> Option<&'a str>;

    /// Unqualified type name (`StringField` for `*fields.StringField`)
    fn simple_name<'a>(&self, type_ref: &'a str) -> &'a str;

    /// Every package qualifier referenced in `text`
    fn qualifiers_in(&self, text: &str) -> Vec<String>;

    /// True if `name` is usable as a member identifier
    fn is_identifier(&self, name: &str) -> bool;
}
