//! Structural edits of members: insert, copy, move and delete.
//!
//! Every operation validates before touching text, then runs as a sequence of
//! journaled steps against one document. The outline is re-read after each
//! step, so later steps always work on fresh offsets. Any failure after the
//! first step replays the journal backwards.

pub mod copy;
pub mod delete;
pub mod error;
pub mod insert;
pub mod moving;

use std::fmt;
use std::ops::Range;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::core::{MemberPath, OrderKey};
use crate::document::SourceDocument;
use crate::editor::{Journal, TextEdit};
use crate::language::LanguageSupport;
use crate::ordering::{OrderKeyAssigner, Sibling};
use crate::parser::{MemberNode, Outline};
use crate::proposal::ProposalCatalog;
use crate::recipe::Slot;
use crate::symbols::SymbolEnvironment;

pub use copy::CopyOperation;
pub use delete::DeleteOperation;
pub use error::OperationError;
pub use insert::InsertOperation;
pub use moving::MoveOperation;

pub type Result<T> = std::result::Result<T, OperationError>;

/// Everything an operation may read or edit
pub struct EditContext<'a> {
    document: &'a mut SourceDocument,
    pub environment: &'a dyn SymbolEnvironment,
    pub catalog: &'a ProposalCatalog,
    pub config: &'a Config,
    journal: Journal,
}

impl<'a> EditContext<'a> {
    pub fn new(
        document: &'a mut SourceDocument,
        environment: &'a dyn SymbolEnvironment,
        catalog: &'a ProposalCatalog,
        config: &'a Config,
    ) -> Self {
        Self {
            document,
            environment,
            catalog,
            config,
            journal: Journal::default(),
        }
    }

    pub fn document(&self) -> &SourceDocument {
        &*self.document
    }

    pub fn outline(&self) -> &Outline {
        self.document.outline()
    }

    pub fn language(&self) -> &dyn LanguageSupport {
        self.document.language()
    }

    pub fn text(&self) -> String {
        self.document.text()
    }

    pub fn assigner(&self) -> OrderKeyAssigner {
        OrderKeyAssigner::new(self.config.order_step)
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Member at `path`, cloned out of the current outline
    pub fn member(&self, path: &MemberPath) -> Result<MemberNode> {
        self.outline()
            .member(path)
            .cloned()
            .ok_or_else(|| OperationError::member_not_found(path))
    }

    /// Apply one step against the current version
    pub fn apply(&mut self, step: &str, edits: Vec<TextEdit>) -> Result<()> {
        let version = self.document.version();
        self.apply_at(step, version, edits)
    }

    /// Apply one step computed against `snapshot_version`
    pub fn apply_at(&mut self, step: &str, snapshot_version: u64, edits: Vec<TextEdit>) -> Result<()> {
        let receipt = self
            .document
            .apply(snapshot_version, &edits)
            .map_err(|e| OperationError::apply(step, e))?;
        debug!("{}: {} edit(s), now at version {}", step, edits.len(), receipt.version_after);
        let uri = self.document.uri().to_string();
        self.journal.record(&uri, step, receipt);
        Ok(())
    }

    /// Undo every recorded step, newest first
    pub fn rollback(&mut self, cause: &OperationError) -> Result<usize> {
        let journal = std::mem::take(&mut self.journal);
        let mut undone = 0;
        for step in journal.into_undo_order() {
            self.document
                .apply(step.version_after, &step.inverse)
                .map_err(|source| OperationError::RollbackFailed {
                    cause: cause.to_string(),
                    source,
                })?;
            debug!("Undid \"{}\"", step.description);
            undone += 1;
        }
        Ok(undone)
    }
}

/// What a completed operation produced
#[derive(Debug, Clone, Default)]
pub struct OperationOutcome {
    /// Path of the member the operation created or relocated
    pub member: Option<MemberPath>,
    /// Linked slots in document coordinates; a group may have several
    pub slots: Vec<Slot>,
    /// Fully qualified supertype of an inserted member
    pub super_type: Option<String>,
    /// Where the cursor goes after linked editing
    pub exit_position: Option<usize>,
    /// Number of journaled steps
    pub steps: usize,
}

/// A validated, reversible structural change
pub trait StructuralEdit: Send + fmt::Debug {
    fn label(&self) -> String;

    /// Check preconditions without touching the document
    fn validate(&self, ctx: &EditContext<'_>) -> Result<()>;

    fn run(&self, ctx: &mut EditContext<'_>) -> Result<OperationOutcome>;
}

/// Validate and run `edit`, rolling back every applied step on failure
pub fn execute(edit: &dyn StructuralEdit, ctx: &mut EditContext<'_>) -> Result<OperationOutcome> {
    let label = edit.label();
    edit.validate(ctx)?;

    let was_clean = !ctx.document().has_syntax_errors();
    let result = edit.run(ctx).and_then(|mut outcome| {
        if was_clean {
            if let Some(message) = ctx.document().syntax_error() {
                return Err(OperationError::InvalidResult(message));
            }
        }
        outcome.steps = ctx.journal().len();
        Ok(outcome)
    });

    match result {
        Ok(outcome) => {
            info!("{} completed in {} step(s)", label, outcome.steps);
            Ok(outcome)
        }
        Err(e) if ctx.journal().is_empty() => Err(e),
        Err(e) => {
            error!(
                "{} failed: {}; rolling back {} step(s)",
                label,
                e,
                ctx.journal().len()
            );
            ctx.rollback(&e)?;
            Err(e)
        }
    }
}

/// Validate a member name for `root`
pub(crate) fn check_new_name(ctx: &EditContext<'_>, root: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(OperationError::precondition("member name is blank"));
    }
    if !ctx.language().is_identifier(name) {
        return Err(OperationError::precondition(format!(
            "{:?} is not a valid identifier",
            name
        )));
    }
    if ctx.outline().name_taken(root, name) {
        return Err(OperationError::precondition(format!(
            "{} already has a member named {}",
            root, name
        )));
    }
    Ok(())
}

/// The container must exist and have a struct body
pub(crate) fn check_container(ctx: &EditContext<'_>, container: &MemberPath) -> Result<()> {
    match ctx.outline().member(container) {
        Some(member) if member.body.is_some() => Ok(()),
        Some(_) => Err(OperationError::precondition(format!(
            "{} has no struct body",
            container
        ))),
        None => Err(OperationError::precondition(format!(
            "container {} not found",
            container
        ))),
    }
}

/// Ordered siblings in `container`, optionally leaving one member out
pub(crate) fn siblings_of(
    outline: &Outline,
    container: &MemberPath,
    exclude: Option<&MemberPath>,
) -> Vec<Sibling> {
    outline
        .children(container)
        .into_iter()
        .filter(|member| Some(&member.path) != exclude)
        .map(|member| Sibling::new(member.name.clone(), member.order))
        .collect()
}

/// Rewrite the order keys of existing siblings
pub(crate) fn rewrite_order_keys(
    ctx: &mut EditContext<'_>,
    container: &MemberPath,
    reassignments: &[(String, OrderKey)],
) -> Result<()> {
    if reassignments.is_empty() {
        return Ok(());
    }

    let mut edits = Vec::with_capacity(reassignments.len());
    for (name, key) in reassignments {
        let member = ctx.member(&container.child(name.as_str()))?;
        let edit = match member.order_literal {
            Some(literal) => TextEdit::replace(literal, key.to_string()),
            None => TextEdit::insert(
                member.span.start,
                format!(
                    "{}{}\n",
                    "\t".repeat(member.depth()),
                    ctx.language().order_comment(*key)
                ),
            ),
        };
        edits.push(edit);
    }
    ctx.apply("rewrite sibling order keys", edits)
}

/// Close the gap a removed member left in `container`'s order keys
pub(crate) fn compact_order_keys(ctx: &mut EditContext<'_>, container: &MemberPath) -> Result<()> {
    let reassignments = ctx
        .assigner()
        .compact(&siblings_of(ctx.outline(), container, None));
    rewrite_order_keys(ctx, container, &reassignments)
}

/// Insert placed member text into `container`, before `anchor` or at the end.
///
/// Returns the offset where the member's first line begins.
pub(crate) fn insert_member_text(
    ctx: &mut EditContext<'_>,
    container: &MemberPath,
    anchor: Option<&str>,
    placed: &str,
) -> Result<usize> {
    let (offset, text, start) = match anchor {
        Some(anchor) => {
            let sibling = ctx.member(&container.child(anchor))?;
            (sibling.span.start, placed.to_string(), sibling.span.start)
        }
        None => {
            let parent = ctx.member(container)?;
            let body = parent
                .body
                .ok_or_else(|| OperationError::precondition(format!("{} has no struct body", container)))?;
            if body.inline {
                let text = format!("\n{}{}", placed, "\t".repeat(parent.depth()));
                (body.insert_at, text, body.insert_at + 1)
            } else {
                (body.insert_at, placed.to_string(), body.insert_at)
            }
        }
    };
    ctx.apply("insert member", vec![TextEdit::insert(offset, text)])?;
    Ok(start)
}

/// Delete the whole-line span of the member at `path`
pub(crate) fn remove_member_text(ctx: &mut EditContext<'_>, path: &MemberPath) -> Result<()> {
    let member = ctx.member(path)?;
    ctx.apply("remove member", vec![TextEdit::delete(member.span)])
}

/// Shift slots of placed text to document coordinates
pub(crate) fn offset_slots(slots: &[Slot], base: usize) -> Vec<Slot> {
    slots
        .iter()
        .map(|slot| slot.moved_to(shift(&slot.range, base)))
        .collect()
}

fn shift(range: &Range<usize>, base: usize) -> Range<usize> {
    range.start + base..range.end + base
}
