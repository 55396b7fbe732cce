use super::{
    check_container, check_new_name, compact_order_keys, insert_member_text, remove_member_text,
    rewrite_order_keys, siblings_of, EditContext, OperationError, OperationOutcome, Result,
    StructuralEdit,
};
use super::copy::set_order_literal;
use crate::core::MemberPath;
use crate::editor::text::reindent;
use crate::ordering::InsertPosition;
use crate::recipe::{Slot, NAME_GROUP};
use crate::symbols::qualify_reference;
use crate::sync::{AccessorSynchronizer, ImportSynchronizer};

/// Relocates a member, with its descendants, to another container or position
#[derive(Debug, Clone)]
pub struct MoveOperation {
    pub member: MemberPath,
    pub target: MemberPath,
    pub position: InsertPosition,
}

impl MoveOperation {
    pub fn new(member: MemberPath, target: MemberPath, position: InsertPosition) -> Self {
        Self {
            member,
            target,
            position,
        }
    }
}

impl StructuralEdit for MoveOperation {
    fn label(&self) -> String {
        format!("Move {} to {}", self.member, self.target)
    }

    fn validate(&self, ctx: &EditContext<'_>) -> Result<()> {
        let member = ctx.member(&self.member)?;
        if member.is_root() {
            return Err(OperationError::precondition("cannot move a top-level type"));
        }
        if self.target.starts_with(&self.member) {
            return Err(OperationError::precondition(format!(
                "cannot move {} into its own subtree",
                self.member
            )));
        }
        check_container(ctx, &self.target)?;
        if self.target.root_name() != self.member.root_name() {
            check_new_name(ctx, self.target.root_name(), &member.name)?;
        }
        ctx.assigner().assign(
            &siblings_of(ctx.outline(), &self.target, Some(&self.member)),
            &self.position,
        )?;
        Ok(())
    }

    fn run(&self, ctx: &mut EditContext<'_>) -> Result<OperationOutcome> {
        let member = ctx.member(&self.member)?;
        let assignment = ctx.assigner().assign(
            &siblings_of(ctx.outline(), &self.target, Some(&self.member)),
            &self.position,
        )?;
        let text = ctx.document().buffer().slice(member.span.clone());
        let keyed = set_order_literal(&text, assignment.key, member.depth(), ctx.language());
        let placed = reindent(&keyed, member.depth(), self.target.depth() + 1);

        AccessorSynchronizer::delete_subtree(ctx, &self.member)?;
        remove_member_text(ctx, &self.member)?;
        if let Some(source) = self.member.parent().filter(|source| *source != self.target) {
            compact_order_keys(ctx, &source)?;
        }
        rewrite_order_keys(ctx, &self.target, &assignment.reassignments)?;
        insert_member_text(ctx, &self.target, assignment.anchor.as_deref(), &placed)?;

        let path = self.target.child(member.name.as_str());
        AccessorSynchronizer::create_subtree(ctx, &path)?;

        if let Some(super_type) = member.super_type.as_deref() {
            let qualified = qualify_reference(
                ctx.outline(),
                ctx.language(),
                ctx.document().package(),
                super_type,
            );
            if let Some(qualified) = qualified {
                ImportSynchronizer::add_import_for_relocated_type(ctx, &qualified)?;
            }
        }

        let moved = ctx.member(&path)?;
        let mut slots = vec![Slot::new(NAME_GROUP, moved.name_range.clone())];
        slots.extend(
            AccessorSynchronizer::name_ranges(ctx, &path)
                .into_iter()
                .map(|range| Slot::new(NAME_GROUP, range)),
        );

        Ok(OperationOutcome {
            member: Some(path),
            slots,
            exit_position: Some(moved.span.end),
            ..OperationOutcome::default()
        })
    }
}
