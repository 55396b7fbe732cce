use std::sync::Arc;
use tracing::{debug, warn};
use tree_sitter::{InputEdit, Point, Tree};

use crate::core::Result;
use crate::editor::error::EditError;
use crate::editor::{EditReceipt, PositionId, Snapshot, TextBuffer, TextEdit, TrackedPosition};
use crate::language::LanguageSupport;
use crate::parser::{first_syntax_error, GoParser, Outline};

/// One open source file: text, syntax tree and outline kept in step
pub struct SourceDocument {
    uri: String,
    /// Import path of the file's package, when known
    package: Option<String>,
    language: Arc<dyn LanguageSupport>,
    parser: GoParser,
    tree: Tree,
    buffer: TextBuffer,
    outline: Outline,
}

impl SourceDocument {
    pub fn open(
        uri: impl Into<String>,
        text: &str,
        package: Option<String>,
        language: Arc<dyn LanguageSupport>,
    ) -> Result<Self> {
        let uri = uri.into();
        let mut parser = GoParser::new()?;
        let tree = parser.parse(text)?;
        if let Some(error) = first_syntax_error(&tree, text) {
            warn!("{} has syntax errors: {}", uri, error);
        }
        let outline = Outline::read(&tree, text, language.as_ref());
        debug!(
            "Opened {} ({} members, {} imports)",
            uri,
            outline.members().len(),
            outline.imports().len()
        );

        Ok(Self {
            uri,
            package,
            language,
            parser,
            tree,
            buffer: TextBuffer::new(text),
            outline,
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    pub fn language(&self) -> &dyn LanguageSupport {
        self.language.as_ref()
    }

    pub fn outline(&self) -> &Outline {
        &self.outline
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub fn version(&self) -> u64 {
        self.buffer.version()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.buffer.snapshot()
    }

    pub fn has_syntax_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// First syntax error of the current tree, as a message
    pub fn syntax_error(&self) -> Option<String> {
        first_syntax_error(&self.tree, &self.buffer.text()).map(|e| e.to_string())
    }

    pub fn track(&mut self, offset: usize, length: usize) -> PositionId {
        self.buffer.track(offset, length)
    }

    pub fn position(&self, id: PositionId) -> Option<TrackedPosition> {
        self.buffer.position(id)
    }

    pub fn untrack(&mut self, id: PositionId) {
        self.buffer.untrack(id)
    }

    /// Apply edits atomically, then update the syntax tree and outline
    pub fn apply(
        &mut self,
        snapshot_version: u64,
        edits: &[TextEdit],
    ) -> std::result::Result<EditReceipt, EditError> {
        let old_text = self.buffer.text();
        let receipt = self.buffer.apply(snapshot_version, edits)?;
        if receipt.is_noop() {
            return Ok(receipt);
        }

        let mut sorted: Vec<&TextEdit> = edits.iter().collect();
        sorted.sort_by_key(|edit| std::cmp::Reverse(edit.offset));
        for edit in sorted {
            self.tree.edit(&input_edit(&old_text, edit));
        }

        let new_text = self.buffer.text();
        self.tree = match self.parser.parse_incremental(&new_text, Some(&self.tree)) {
            Ok(tree) => tree,
            Err(e) => {
                warn!("Incremental parse of {} failed ({}), reparsing", self.uri, e);
                self.parser
                    .parse(&new_text)
                    .unwrap_or_else(|_| self.tree.clone())
            }
        };
        self.outline = Outline::read(&self.tree, &new_text, self.language.as_ref());
        Ok(receipt)
    }
}

/// Row/column (in bytes) of `offset`
fn point_at(text: &str, offset: usize) -> Point {
    let before = &text[..offset];
    let row = before.matches('\n').count();
    let column = offset - before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    Point::new(row, column)
}

/// Point reached after writing `inserted` starting at `start`
fn advance(start: Point, inserted: &str) -> Point {
    match inserted.rfind('\n') {
        Some(last) => Point::new(
            start.row + inserted.matches('\n').count(),
            inserted.len() - last - 1,
        ),
        None => Point::new(start.row, start.column + inserted.len()),
    }
}

/// Tree edit for `edit`, expressed against `old_text`
fn input_edit(old_text: &str, edit: &TextEdit) -> InputEdit {
    let start_position = point_at(old_text, edit.offset);
    InputEdit {
        start_byte: edit.offset,
        old_end_byte: edit.end(),
        new_end_byte: edit.offset + edit.text.len(),
        start_position,
        old_end_position: point_at(old_text, edit.end()),
        new_end_position: advance(start_position, &edit.text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MemberPath;
    use crate::language::Go;

    const SOURCE: &str = "package forms\n\ntype PersonForm struct {\n\tforms.Form\n}\n";

    #[test]
    fn test_apply_updates_outline() {
        let mut document =
            SourceDocument::open("mem://person.go", SOURCE, None, Arc::new(Go::new())).unwrap();
        assert_eq!(document.outline().children(&MemberPath::root("PersonForm")).len(), 0);

        let insert_at = SOURCE.rfind('}').unwrap();
        let member = "\t// trellis:order:10.0\n\tMainBox struct {\n\t\tfields.GroupBox\n\t}\n";
        document
            .apply(document.version(), &[TextEdit::insert(insert_at, member)])
            .unwrap();

        let children = document.outline().children(&MemberPath::root("PersonForm"));
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "MainBox");
        assert!(!document.has_syntax_errors());
    }

    #[test]
    fn test_input_edit_points() {
        let text = "ab\ncd\nef";
        let edit = TextEdit::replace(4..7, "X\nYZ");
        let input = input_edit(text, &edit);
        assert_eq!(input.start_position, Point::new(1, 1));
        assert_eq!(input.old_end_position, Point::new(2, 1));
        assert_eq!(input.new_end_position, Point::new(2, 2));
    }
}
