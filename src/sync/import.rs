use hashbrown::HashSet;
use std::ops::Range;
use tracing::debug;

use crate::editor::text::with_blank_line_above;
use crate::editor::TextEdit;
use crate::operation::{EditContext, OperationError, Result};
use crate::symbols::split_qualified;

/// How a fully qualified type is referenced from the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportPlan {
    pub qualified: String,
    /// Text to write in source, e.g. `fields.StringField`
    pub reference: String,
    /// Import to add as `(path, alias)`
    pub import: Option<(String, Option<String>)>,
}

/// Adds and removes import directives for types used by members
pub struct ImportSynchronizer;

impl ImportSynchronizer {
    /// Decide how to reference each type, choosing aliases for clashing qualifiers
    pub fn plan(ctx: &EditContext<'_>, qualified: &[String]) -> Vec<ImportPlan> {
        let outline = ctx.outline();
        let package = ctx.document().package();
        let mut taken: HashSet<String> = outline
            .imports()
            .iter()
            .map(|import| import.qualifier().to_string())
            .collect();
        let mut planned: Vec<(String, String)> = Vec::new();

        qualified
            .iter()
            .map(|qualified| {
                let (path, simple) = split_qualified(qualified);
                let local = path.is_empty()
                    || package == Some(path)
                    || (package.is_none()
                        && outline.type_decls().iter().any(|decl| decl.name == simple));

                if local {
                    return ImportPlan {
                        qualified: qualified.clone(),
                        reference: simple.to_string(),
                        import: None,
                    };
                }

                if let Some(existing) = outline.import_by_path(path) {
                    let reference = match existing.qualifier() {
                        "." => simple.to_string(),
                        qualifier => format!("{}.{}", qualifier, simple),
                    };
                    return ImportPlan {
                        qualified: qualified.clone(),
                        reference,
                        import: None,
                    };
                }

                if let Some((_, qualifier)) = planned.iter().find(|(p, _)| p == path) {
                    return ImportPlan {
                        qualified: qualified.clone(),
                        reference: format!("{}.{}", qualifier, simple),
                        import: None,
                    };
                }

                let desired = path.rsplit('/').next().unwrap_or(path).to_string();
                let (qualifier, alias) = if taken.contains(&desired) {
                    let alias = (2..)
                        .map(|n| format!("{}{}", desired, n))
                        .find(|candidate| !taken.contains(candidate))
                        .unwrap_or_else(|| format!("{}_", desired));
                    (alias.clone(), Some(alias))
                } else {
                    (desired, None)
                };
                taken.insert(qualifier.clone());
                planned.push((path.to_string(), qualifier.clone()));

                ImportPlan {
                    qualified: qualified.clone(),
                    reference: format!("{}.{}", qualifier, simple),
                    import: Some((path.to_string(), alias)),
                }
            })
            .collect()
    }

    /// Add the imports a plan calls for, one step each
    pub fn apply(ctx: &mut EditContext<'_>, plans: &[ImportPlan]) -> Result<usize> {
        let mut added = 0;
        for plan in plans {
            if let Some((path, alias)) = &plan.import {
                if ctx.outline().import_by_path(path).is_some() {
                    continue;
                }
                Self::add_import(ctx, path, alias.as_deref())?;
                added += 1;
            }
        }
        Ok(added)
    }

    /// Reference a relocated type from the document, importing its package if needed.
    ///
    /// A bare simple name is first resolved through the symbol environment.
    pub fn add_import_for_relocated_type(ctx: &mut EditContext<'_>, type_name: &str) -> Result<String> {
        let qualified = match split_qualified(type_name) {
            ("", simple) => ctx
                .environment
                .resolve_type(simple, ctx.document().package())
                .unwrap_or_else(|| simple.to_string()),
            _ => type_name.to_string(),
        };
        let plan = Self::plan(ctx, &[qualified]);
        Self::apply(ctx, &plan)?;
        Ok(plan
            .into_iter()
            .next()
            .map(|plan| plan.reference)
            .unwrap_or_default())
    }

    fn add_import(ctx: &mut EditContext<'_>, path: &str, alias: Option<&str>) -> Result<()> {
        let outline = ctx.outline();
        let spec = ctx.language().render_import_spec(path, alias);

        let grouped = outline
            .import_decls()
            .iter()
            .find(|decl| decl.grouped && decl.close_line_start.is_some());
        let edit = if let Some(decl) = grouped {
            let offset = decl
                .specs
                .iter()
                .map(|&i| &outline.imports()[i])
                .find(|import| import.path.as_str() > path)
                .map(|import| import.line.start)
                .or(decl.close_line_start)
                .unwrap_or(decl.span.end);
            TextEdit::insert(offset, format!("\t{}\n", spec))
        } else if let Some(last) = outline.import_decls().last() {
            TextEdit::insert(last.span.end, format!("import {}\n", spec))
        } else if let Some(package) = outline.package() {
            TextEdit::insert(package.line_end, format!("\nimport {}\n", spec))
        } else {
            return Err(OperationError::precondition(
                "document has no package clause to import after",
            ));
        };

        debug!("Importing {}", path);
        ctx.apply(&format!("import {}", path), vec![edit])
    }

    /// Remove imports at or below package `path_prefix` that nothing outside `ignored` uses
    pub fn remove_imports_referencing(
        ctx: &mut EditContext<'_>,
        path_prefix: &str,
        ignored: Option<Range<usize>>,
    ) -> Result<usize> {
        let mut ignored = ignored;
        let mut removed = 0;
        loop {
            let text = ctx.text();
            let used = Self::qualifiers_in_use(ctx, &text, ignored.clone());
            let outline = ctx.outline();
            let Some(import) = outline.imports().iter().find(|import| {
                is_within(&import.path, path_prefix)
                    && import.qualifier() != "_"
                    && import.qualifier() != "."
                    && !used.contains(import.qualifier())
            }) else {
                break;
            };

            let decl = &outline.import_decls()[import.decl];
            let range = if decl.grouped && decl.specs.len() > 1 {
                import.line.clone()
            } else if outline.import_decls().len() == 1 {
                with_blank_line_above(&text, decl.span.clone())
            } else {
                decl.span.clone()
            };
            let step = format!("remove import {}", import.path);
            ctx.apply(&step, vec![TextEdit::delete(range.clone())])?;
            removed += 1;

            // Imports sit above members, so the ignored range moves up
            if let Some(ignored) = ignored.as_mut() {
                if range.end <= ignored.start {
                    let len = range.end - range.start;
                    ignored.start -= len;
                    ignored.end -= len;
                }
            }
        }
        Ok(removed)
    }

    /// Qualifiers referenced outside import declarations and `ignored`
    fn qualifiers_in_use(
        ctx: &EditContext<'_>,
        text: &str,
        ignored: Option<Range<usize>>,
    ) -> HashSet<String> {
        let mut masked: Vec<Range<usize>> = ctx
            .outline()
            .import_decls()
            .iter()
            .map(|decl| decl.span.clone())
            .collect();
        masked.extend(ignored);
        masked.sort_by_key(|range| range.start);

        let mut visible = String::with_capacity(text.len());
        let mut cursor = 0;
        for range in masked {
            if range.start > cursor {
                visible.push_str(&text[cursor..range.start]);
                visible.push('\n');
            }
            cursor = cursor.max(range.end);
        }
        if cursor < text.len() {
            visible.push_str(&text[cursor..]);
        }

        ctx.language().qualifiers_in(&visible).into_iter().collect()
    }
}

/// `path` is `prefix` itself or a package below it
fn is_within(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_matches_whole_segments() {
        assert!(is_within("github.com/acme/ui/form", "github.com/acme/ui/form"));
        assert!(is_within("github.com/acme/ui/form/layout", "github.com/acme/ui/form"));
        assert!(!is_within("github.com/acme/ui/forms", "github.com/acme/ui/form"));
    }
}
