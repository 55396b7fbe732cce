use regex::Regex;

use super::{
    check_container, check_new_name, insert_member_text, rewrite_order_keys, siblings_of,
    EditContext, OperationError, OperationOutcome, Result, StructuralEdit,
};
use crate::core::{MemberPath, OrderKey};
use crate::editor::text::reindent;
use crate::language::LanguageSupport;
use crate::ordering::InsertPosition;
use crate::recipe::{Slot, NAME_GROUP};
use crate::sync::AccessorSynchronizer;

/// Duplicates a member under a new name
#[derive(Debug, Clone)]
pub struct CopyOperation {
    pub source: MemberPath,
    pub target: MemberPath,
    pub new_name: String,
    pub position: InsertPosition,
}

impl CopyOperation {
    pub fn new(
        source: MemberPath,
        target: MemberPath,
        new_name: impl Into<String>,
        position: InsertPosition,
    ) -> Self {
        Self {
            source,
            target,
            new_name: new_name.into(),
            position,
        }
    }
}

/// Replace whole-word occurrences of `from` with `to`
pub fn rename_whole_word(text: &str, from: &str, to: &str) -> Result<String> {
    let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(from)))
        .map_err(|e| OperationError::precondition(format!("cannot rename {}: {}", from, e)))?;
    Ok(pattern.replace_all(text, regex::NoExpand(to)).into_owned())
}

/// Give member text (starting at its first line) the order key `key`.
///
/// The literal is rewritten when the first line carries it, otherwise a comment line
/// is prepended at `depth`.
pub fn set_order_literal(
    text: &str,
    key: OrderKey,
    depth: usize,
    language: &dyn LanguageSupport,
) -> String {
    let first_line_end = text.find('\n').unwrap_or(text.len());
    match language.find_order_literal(text) {
        Some(literal) if literal.end <= first_line_end => {
            let mut out = String::with_capacity(text.len());
            out.push_str(&text[..literal.start]);
            out.push_str(&key.to_string());
            out.push_str(&text[literal.end..]);
            out
        }
        _ => format!(
            "{}{}\n{}",
            "\t".repeat(depth),
            language.order_comment(key),
            text
        ),
    }
}

impl StructuralEdit for CopyOperation {
    fn label(&self) -> String {
        format!("Copy {} to {}", self.source, self.target.child(self.new_name.as_str()))
    }

    fn validate(&self, ctx: &EditContext<'_>) -> Result<()> {
        let member = ctx.member(&self.source)?;
        if member.is_root() {
            return Err(OperationError::precondition("cannot copy a top-level type"));
        }
        check_container(ctx, &self.target)?;
        check_new_name(ctx, self.target.root_name(), &self.new_name)?;
        ctx.assigner()
            .assign(&siblings_of(ctx.outline(), &self.target, None), &self.position)?;
        Ok(())
    }

    fn run(&self, ctx: &mut EditContext<'_>) -> Result<OperationOutcome> {
        let member = ctx.member(&self.source)?;
        let assignment = ctx
            .assigner()
            .assign(&siblings_of(ctx.outline(), &self.target, None), &self.position)?;

        let original = ctx.document().buffer().slice(member.span.clone());
        let renamed = rename_whole_word(&original, &member.name, &self.new_name)?;
        let keyed = set_order_literal(&renamed, assignment.key, member.depth(), ctx.language());
        let placed = reindent(&keyed, member.depth(), self.target.depth() + 1);

        rewrite_order_keys(ctx, &self.target, &assignment.reassignments)?;
        insert_member_text(ctx, &self.target, assignment.anchor.as_deref(), &placed)?;

        let path = self.target.child(self.new_name.as_str());
        AccessorSynchronizer::create(ctx, &path)?;

        let copy = ctx.member(&path)?;
        let mut slots = vec![Slot::new(NAME_GROUP, copy.name_range.clone())];
        slots.extend(
            AccessorSynchronizer::name_ranges(ctx, &path)
                .into_iter()
                .map(|range| Slot::new(NAME_GROUP, range)),
        );

        Ok(OperationOutcome {
            member: Some(path),
            slots,
            exit_position: Some(copy.span.end),
            ..OperationOutcome::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Go;

    #[test]
    fn test_rename_whole_word_only() {
        let text = "NameField struct {\n\tNameFieldExtra struct{}\n\tx.NameField\n}";
        let renamed = rename_whole_word(text, "NameField", "NameCopyField").unwrap();
        assert_eq!(
            renamed,
            "NameCopyField struct {\n\tNameFieldExtra struct{}\n\tx.NameCopyField\n}"
        );
    }

    #[test]
    fn test_set_order_literal() {
        let go = Go::new();
        let text = "\t// trellis:order:10.0\n\tA struct {\n\t\t// trellis:order:10.0\n\t}\n";
        assert_eq!(
            set_order_literal(text, OrderKey(30.0), 1, &go),
            "\t// trellis:order:30.0\n\tA struct {\n\t\t// trellis:order:10.0\n\t}\n"
        );

        let bare = "\tA struct {\n\t\t// trellis:order:10.0\n\t}\n";
        assert_eq!(
            set_order_literal(bare, OrderKey(20.0), 1, &go),
            "\t// trellis:order:20.0\n\tA struct {\n\t\t// trellis:order:10.0\n\t}\n"
        );
    }
}
