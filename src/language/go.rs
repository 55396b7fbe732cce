use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

use super::{AccessorSpec, LanguageSupport, RenderedAccessor};
use crate::core::OrderKey;

/// Marker that introduces an order literal comment
pub const ORDER_MARKER: &str = "// trellis:order:";

static ORDER_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"//\s*trellis:order:\s*([-+]?[0-9]+(?:\.[0-9]+)?(?:[eE][-+]?[0-9]+)?)")
        .expect("static order literal pattern")
});

static QUALIFIED_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([a-z_][A-Za-z0-9_]*)\.[A-Z][A-Za-z0-9_]*").expect("static qualifier pattern")
});

/// Go keywords that can not name a member
const KEYWORDS: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range",
    "return", "select", "struct", "switch", "type", "var",
];

/// Go dialect
#[derive(Default, Debug, Clone, Copy)]
pub struct Go;

impl Go {
    pub fn new() -> Self {
        Self
    }

    /// Receiver variable for methods on `owner` (`f` for `PersonForm`)
    fn receiver_name(owner: &str) -> String {
        owner
            .chars()
            .next()
            .map(|c| c.to_lowercase().to_string())
            .unwrap_or_else(|| "r".to_string())
    }
}

impl LanguageSupport for Go {
    fn extract_order(&self, comment_text: &str) -> Option<OrderKey> {
        let captures = ORDER_LITERAL.captures(comment_text.trim())?;
        captures.get(1)?.as_str().parse().ok()
    }

    fn find_order_literal(&self, text: &str) -> Option<Range<usize>> {
        ORDER_LITERAL
            .captures(text)
            .and_then(|captures| captures.get(1))
            .map(|m| m.range())
    }

    fn order_comment(&self, key: OrderKey) -> String {
        format!("{}{}", ORDER_MARKER, key)
    }

    fn render_accessor(&self, spec: &AccessorSpec<'_>) -> RenderedAccessor {
        let receiver = Self::receiver_name(spec.owner);
        let member_name = spec.field_path.last().map(String::as_str).unwrap_or("");

        let mut text = format!("func ({} *{}) ", receiver, spec.owner);
        let mut name_ranges = Vec::new();

        // The member name is the tail of the accessor name
        let accessor_name_start = text.len();
        text.push_str(spec.name);
        if !member_name.is_empty() && spec.name.ends_with(member_name) {
            let start = accessor_name_start + spec.name.len() - member_name.len();
            name_ranges.push(start..start + member_name.len());
        }

        let (reference, embedded) = match spec.super_type {
            Some(super_type) => (
                Some(super_type.trim_start_matches('*')),
                Some(self.simple_name(super_type)),
            ),
            None => (None, None),
        };
        let type_range = match reference {
            Some(reference) => {
                text.push_str("() *");
                let start = text.len();
                text.push_str(reference);
                Some(start..text.len())
            }
            None => {
                text.push_str("() any");
                None
            }
        };
        text.push_str(&format!(" {{\n\treturn &{}", receiver));

        for (i, segment) in spec.field_path.iter().enumerate() {
            text.push('.');
            if i + 1 == spec.field_path.len() {
                name_ranges.push(text.len()..text.len() + segment.len());
            }
            text.push_str(segment);
        }
        let embedded_range = embedded.map(|embedded| {
            text.push('.');
            let start = text.len();
            text.push_str(embedded);
            start..text.len()
        });
        text.push_str("\n}\n");

        RenderedAccessor {
            text,
            name_ranges,
            type_range,
            embedded_range,
        }
    }

    fn render_import_spec(&self, path: &str, alias: Option<&str>) -> String {
        match alias {
            Some(alias) => format!("{} \"{}\"", alias, path),
            None => format!("\"{}\"", path),
        }
    }

    fn qualifier<'a>(&self, type_ref: &'a str) -> Option<&'a str> {
        let type_ref = type_ref.trim_start_matches('*');
        let (qualifier, _) = type_ref.split_once('.')?;
        Some(qualifier)
    }

    fn simple_name<'a>(&self, type_ref: &'a str) -> &'a str {
        let type_ref = type_ref.trim_start_matches('*');
        let type_ref = type_ref.split('[').next().unwrap_or(type_ref);
        type_ref.rsplit('.').next().unwrap_or(type_ref)
    }

    fn qualifiers_in(&self, text: &str) -> Vec<String> {
        let mut qualifiers: Vec<String> = QUALIFIED_TYPE
            .captures_iter(text)
            .filter_map(|captures| captures.get(1).map(|m| m.as_str().to_string()))
            .collect();
        qualifiers.sort();
        qualifiers.dedup();
        qualifiers
    }

    fn is_identifier(&self, name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_alphabetic() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_alphanumeric() || c == '_') && !KEYWORDS.contains(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_comment_roundtrip() {
        let go = Go::new();
        let comment = go.order_comment(OrderKey(20.0));
        assert_eq!(comment, "// trellis:order:20.0");
        assert_eq!(go.extract_order(&comment), Some(OrderKey(20.0)));
        assert_eq!(go.extract_order("// regular comment"), None);
    }

    #[test]
    fn test_find_order_literal() {
        let go = Go::new();
        let text = "\t// trellis:order:30.0\n\tNameField struct {\n\t\t// trellis:order:10.0\n";
        let range = go.find_order_literal(text).unwrap();
        assert_eq!(&text[range], "30.0");
    }

    #[test]
    fn test_render_accessor() {
        let go = Go::new();
        let path = vec!["MainBox".to_string(), "NameField".to_string()];
        let rendered = go.render_accessor(&AccessorSpec {
            owner: "PersonForm",
            name: "GetNameField",
            field_path: &path,
            super_type: Some("fields.StringField"),
        });
        assert_eq!(
            rendered.text,
            "func (p *PersonForm) GetNameField() *fields.StringField {\n\treturn &p.MainBox.NameField.StringField\n}\n"
        );
        assert_eq!(rendered.name_ranges.len(), 2);
        for range in rendered.name_ranges {
            assert_eq!(&rendered.text[range], "NameField");
        }
        assert_eq!(&rendered.text[rendered.type_range.unwrap()], "fields.StringField");
        assert_eq!(&rendered.text[rendered.embedded_range.unwrap()], "StringField");
    }

    #[test]
    fn test_type_reference_helpers() {
        let go = Go::new();
        assert_eq!(go.qualifier("fields.StringField"), Some("fields"));
        assert_eq!(go.qualifier("GroupBox"), None);
        assert_eq!(go.simple_name("*fields.StringField"), "StringField");
        assert_eq!(
            go.qualifiers_in("a fields.StringField\n\tforms.Form\n\tfields.IntField"),
            vec!["fields".to_string(), "forms".to_string()]
        );
        assert!(go.is_identifier("NameField"));
        assert!(!go.is_identifier("9lives"));
        assert!(!go.is_identifier("struct"));
    }
}
