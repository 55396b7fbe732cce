//! Source text for new members.
//!
//! A recipe renders the unindented declaration of one member (without its order
//! comment) and marks the ranges a linked edit session should track.

mod structs;
mod table;

use std::fmt;
use std::ops::Range;

use crate::language::LanguageSupport;

pub use structs::StructRecipe;
pub use table::TableRecipe;

/// Linked group id of the member name
pub const NAME_GROUP: &str = "name";
/// Linked group id of the supertype reference
pub const SUPER_TYPE_GROUP: &str = "super_type";

/// How a slot displays its group's text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SlotText {
    #[default]
    Verbatim,
    /// Only the last dotted segment, as in an embedded-field selector
    SimpleName,
}

impl SlotText {
    pub fn project(self, text: &str) -> &str {
        match self {
            SlotText::Verbatim => text,
            SlotText::SimpleName => text
                .rsplit('.')
                .next()
                .unwrap_or(text)
                .trim_start_matches('*'),
        }
    }
}

/// A tracked range inside rendered text, tagged with its linked group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub group: String,
    pub range: Range<usize>,
    pub text: SlotText,
}

impl Slot {
    pub fn new(group: impl Into<String>, range: Range<usize>) -> Self {
        Self {
            group: group.into(),
            range,
            text: SlotText::Verbatim,
        }
    }

    pub fn with_text(mut self, text: SlotText) -> Self {
        self.text = text;
        self
    }

    /// Same slot over `range`
    pub fn moved_to(&self, range: Range<usize>) -> Self {
        Self {
            range,
            ..self.clone()
        }
    }
}

/// Unindented member declaration, ending with a newline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSource {
    pub text: String,
    pub slots: Vec<Slot>,
}

impl MemberSource {
    /// Indent to `depth` tabs and prepend `order_comment` on its own line
    pub fn place(&self, depth: usize, order_comment: &str) -> MemberSource {
        let indent = "\t".repeat(depth);
        let mut text = format!("{}{}\n", indent, order_comment);
        // (original line start, placed content start) per line
        let mut lines = Vec::new();

        let mut original = 0;
        for line in self.text.split_inclusive('\n') {
            let blank = line.trim().is_empty();
            if !blank {
                text.push_str(&indent);
            }
            lines.push((original, text.len()));
            text.push_str(line);
            original += line.len();
        }

        let map = |offset: usize| {
            let (start, placed) = lines
                .iter()
                .rev()
                .find(|(start, _)| *start <= offset)
                .copied()
                .unwrap_or((0, 0));
            placed + (offset - start)
        };
        let slots = self
            .slots
            .iter()
            .map(|slot| slot.moved_to(map(slot.range.start)..map(slot.range.end)))
            .collect();

        MemberSource { text, slots }
    }
}

/// Input to a recipe
pub struct RecipeRequest<'a> {
    pub name: &'a str,
    /// Supertype as referenced from the target file (`fields.StringField`)
    pub super_type: &'a str,
    /// References for [`Recipe::required_types`], same order
    pub references: &'a [String],
    pub order_step: f64,
    pub language: &'a dyn LanguageSupport,
}

pub trait Recipe: Send + Sync + fmt::Debug {
    /// Fully qualified types the rendered text references besides the supertype
    fn required_types(&self) -> Vec<String> {
        Vec::new()
    }

    fn render(&self, request: &RecipeRequest<'_>) -> MemberSource;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_shifts_slots() {
        let source = MemberSource {
            text: "NameField struct {\n\tfields.StringField\n}\n".to_string(),
            slots: vec![
                Slot::new(NAME_GROUP, 0..9),
                Slot::new(SUPER_TYPE_GROUP, 20..38),
            ],
        };
        let placed = source.place(2, "// trellis:order:10.0");
        assert_eq!(
            placed.text,
            "\t\t// trellis:order:10.0\n\t\tNameField struct {\n\t\t\tfields.StringField\n\t\t}\n"
        );
        assert_eq!(&placed.text[placed.slots[0].range.clone()], "NameField");
        assert_eq!(&placed.text[placed.slots[1].range.clone()], "fields.StringField");
    }

    #[test]
    fn test_slot_text_projection() {
        assert_eq!(SlotText::Verbatim.project("fields.DateField"), "fields.DateField");
        assert_eq!(SlotText::SimpleName.project("fields.DateField"), "DateField");
        assert_eq!(SlotText::SimpleName.project("*DateField"), "DateField");

        let slot = Slot::new(SUPER_TYPE_GROUP, 3..9).with_text(SlotText::SimpleName);
        assert_eq!(slot.moved_to(10..16).text, SlotText::SimpleName);
    }
}
