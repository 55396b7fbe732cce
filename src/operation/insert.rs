use tracing::debug;

use super::{
    check_container, check_new_name, insert_member_text, offset_slots, rewrite_order_keys,
    siblings_of, EditContext, OperationError, OperationOutcome, Result, StructuralEdit,
};
use crate::core::MemberPath;
use crate::ordering::InsertPosition;
use crate::proposal::{ProposalContext, ProposalDescriptor};
use crate::recipe::{Recipe, RecipeRequest, Slot, NAME_GROUP, SUPER_TYPE_GROUP};
use crate::symbols::split_qualified;
use crate::sync::{AccessorSynchronizer, ImportSynchronizer};

/// Creates a new member from a recipe
#[derive(Debug)]
pub struct InsertOperation {
    context: ProposalContext,
    recipe: Box<dyn Recipe>,
}

impl InsertOperation {
    pub fn from_proposal(
        descriptor: &ProposalDescriptor,
        context: ProposalContext,
        recipe: Box<dyn Recipe>,
    ) -> Self {
        debug!("Creating insert for {} into {}", descriptor.id, context.container);
        Self { context, recipe }
    }

    pub fn new(
        container: MemberPath,
        name: impl Into<String>,
        super_types: Vec<String>,
        position: InsertPosition,
        recipe: Box<dyn Recipe>,
    ) -> Self {
        Self {
            context: ProposalContext {
                container,
                offset: 0,
                position,
                default_name: String::new(),
                name_suffix: String::new(),
                super_type_chain: super_types,
                search_prefix: None,
                name: Some(name.into()),
            },
            recipe,
        }
    }

    pub fn context(&self) -> &ProposalContext {
        &self.context
    }

    /// First supertype of the chain the environment knows, else the first one listed
    fn pick_super_type(&self, ctx: &EditContext<'_>) -> Result<String> {
        let chain = &self.context.super_type_chain;
        chain
            .iter()
            .find(|qualified| {
                ctx.environment.type_exists(qualified)
                    || ctx.environment.type_exists(split_qualified(qualified).1)
            })
            .or_else(|| chain.first())
            .cloned()
            .ok_or_else(|| OperationError::precondition("no supertype to extend"))
    }
}

impl StructuralEdit for InsertOperation {
    fn label(&self) -> String {
        format!("Insert into {}", self.context.container)
    }

    fn validate(&self, ctx: &EditContext<'_>) -> Result<()> {
        let container = &self.context.container;
        check_container(ctx, container)?;
        let name = self.context.unique_name(ctx.outline());
        check_new_name(ctx, container.root_name(), &name)?;
        self.pick_super_type(ctx)?;
        ctx.assigner()
            .assign(&siblings_of(ctx.outline(), container, None), &self.context.position)?;
        Ok(())
    }

    fn run(&self, ctx: &mut EditContext<'_>) -> Result<OperationOutcome> {
        let container = self.context.container.clone();
        let name = self.context.unique_name(ctx.outline());
        let super_type = self.pick_super_type(ctx)?;
        let assignment = ctx
            .assigner()
            .assign(&siblings_of(ctx.outline(), &container, None), &self.context.position)?;

        let mut required = vec![super_type.clone()];
        required.extend(self.recipe.required_types());
        let plans = ImportSynchronizer::plan(ctx, &required);
        let references: Vec<String> = plans[1..].iter().map(|plan| plan.reference.clone()).collect();

        let source = self.recipe.render(&RecipeRequest {
            name: &name,
            super_type: &plans[0].reference,
            references: &references,
            order_step: ctx.config.order_step,
            language: ctx.language(),
        });
        let placed = source.place(
            container.depth() + 1,
            &ctx.language().order_comment(assignment.key),
        );

        rewrite_order_keys(ctx, &container, &assignment.reassignments)?;
        insert_member_text(ctx, &container, assignment.anchor.as_deref(), &placed.text)?;

        let path = container.child(name.as_str());
        AccessorSynchronizer::create_subtree(ctx, &path)?;
        ImportSynchronizer::apply(ctx, &plans)?;

        let member = ctx.member(&path)?;
        let mut slots = offset_slots(&placed.slots, member.span.start);
        slots.extend(
            AccessorSynchronizer::name_ranges(ctx, &path)
                .into_iter()
                .map(|range| Slot::new(NAME_GROUP, range)),
        );
        if slots.iter().any(|slot| slot.group == SUPER_TYPE_GROUP) {
            slots.extend(AccessorSynchronizer::super_type_slots(ctx, &path));
        }

        Ok(OperationOutcome {
            member: Some(path),
            slots,
            super_type: Some(super_type),
            exit_position: Some(member.span.end),
            steps: 0,
        })
    }
}
