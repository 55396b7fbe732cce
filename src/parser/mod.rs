pub mod error;
pub mod outline;

use error::{ParseError, Result};
use std::path::Path;
use tree_sitter::{Node, Parser, Tree};

pub use outline::{
    BodyInfo, ImportDecl, ImportDirective, MemberNode, MethodDecl, Outline, PackageClause,
    TypeDecl,
};

/// Go language parser using tree-sitter
pub struct GoParser {
    parser: Parser,
}

impl GoParser {
    /// Create a new Go parser
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| ParseError::LanguageSetupFailed(e.to_string()))?;
        Ok(Self { parser })
    }

    /// Parse Go source code
    pub fn parse(&mut self, source: &str) -> Result<Tree> {
        self.parser.parse(source, None).ok_or(ParseError::ParseFailed)
    }

    /// Parse Go source code reusing an edited old tree
    pub fn parse_incremental(&mut self, source: &str, old_tree: Option<&Tree>) -> Result<Tree> {
        self.parser
            .parse(source, old_tree)
            .ok_or(ParseError::ParseFailed)
    }

    /// Parse Go source code and reject trees containing syntax errors
    pub fn parse_strict(&mut self, source: &str) -> Result<Tree> {
        let tree = self.parse(source)?;
        if let Some(error) = first_syntax_error(&tree, source) {
            return Err(error);
        }
        Ok(tree)
    }

    /// Parse a Go file from disk
    pub fn parse_file(&mut self, path: &Path) -> Result<(String, Tree)> {
        let source = std::fs::read_to_string(path)?;
        let tree = self.parse(&source)?;
        Ok((source, tree))
    }
}

/// First ERROR or MISSING node in document order
pub fn first_syntax_error(tree: &Tree, source: &str) -> Option<ParseError> {
    let root = tree.root_node();
    if !root.has_error() {
        return None;
    }
    find_error(root, source)
}

fn find_error(node: Node, source: &str) -> Option<ParseError> {
    if node.is_error() || node.is_missing() {
        let snippet = node
            .utf8_text(source.as_bytes())
            .unwrap_or_default()
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();
        let message = if node.is_missing() {
            format!("missing {}", node.kind())
        } else {
            format!("unexpected {:?}", snippet)
        };
        return Some(ParseError::SyntaxError {
            line: node.start_position().row + 1,
            column: node.start_position().column + 1,
            message,
        });
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() || child.is_missing() {
            if let Some(error) = find_error(child, source) {
                return Some(error);
            }
        }
    }
    None
}
