use hashbrown::HashSet;

use super::{
    compact_order_keys, remove_member_text, EditContext, OperationError, OperationOutcome, Result,
    StructuralEdit,
};
use crate::core::MemberPath;
use crate::sync::{AccessorSynchronizer, ImportSynchronizer};

/// Removes a member, its descendants, their accessors and imports only they used
#[derive(Debug, Clone)]
pub struct DeleteOperation {
    pub member: MemberPath,
}

impl DeleteOperation {
    pub fn new(member: MemberPath) -> Self {
        Self { member }
    }
}

impl StructuralEdit for DeleteOperation {
    fn label(&self) -> String {
        format!("Delete {}", self.member)
    }

    fn validate(&self, ctx: &EditContext<'_>) -> Result<()> {
        if ctx.member(&self.member)?.is_root() {
            return Err(OperationError::precondition("cannot delete a top-level type"));
        }
        Ok(())
    }

    fn run(&self, ctx: &mut EditContext<'_>) -> Result<OperationOutcome> {
        AccessorSynchronizer::delete_subtree(ctx, &self.member)?;

        // Packages referenced from inside the member
        let member = ctx.member(&self.member)?;
        let body = ctx.document().buffer().slice(member.span.clone());
        let qualifiers: HashSet<String> = ctx.language().qualifiers_in(&body).into_iter().collect();
        let mut paths: Vec<String> = ctx
            .outline()
            .imports()
            .iter()
            .filter(|import| qualifiers.contains(import.qualifier()))
            .map(|import| import.path.clone())
            .collect();
        paths.sort();
        paths.dedup();

        for path in &paths {
            let span = ctx.member(&self.member)?.span;
            ImportSynchronizer::remove_imports_referencing(ctx, path, Some(span))?;
        }

        let start = ctx.member(&self.member)?.span.start;
        remove_member_text(ctx, &self.member)?;
        if let Some(container) = self.member.parent() {
            compact_order_keys(ctx, &container)?;
        }

        Ok(OperationOutcome {
            member: None,
            slots: Vec::new(),
            exit_position: Some(start),
            ..OperationOutcome::default()
        })
    }
}
