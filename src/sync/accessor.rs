use std::ops::Range;
use tracing::debug;

use crate::core::MemberPath;
use crate::editor::text::with_adjacent_blank_line;
use crate::editor::TextEdit;
use crate::language::{AccessorSpec, RenderedAccessor};
use crate::operation::{EditContext, Result};
use crate::recipe::{Slot, SlotText, SUPER_TYPE_GROUP};
use crate::symbols::qualify_reference;

/// Keeps one accessor method per member on the member's root type
pub struct AccessorSynchronizer;

impl AccessorSynchronizer {
    /// Accessor method name for a member
    pub fn accessor_name(prefix: &str, member_name: &str) -> String {
        format!("{}{}", prefix, member_name)
    }

    /// Root type that hosts accessors for `path`, if its capability is a root capability
    pub fn owner_for(ctx: &EditContext<'_>, path: &MemberPath) -> Option<String> {
        let root = ctx.outline().member(&MemberPath::root(path.root_name()))?;
        let super_type = root.super_type.as_deref()?;
        let qualified = qualify_reference(
            ctx.outline(),
            ctx.language(),
            ctx.document().package(),
            super_type,
        );
        let capability =
            ctx.catalog
                .resolve_capability(super_type, ctx.environment, qualified.as_deref())?;
        ctx.config
            .root_capabilities()
            .iter()
            .any(|root_capability| capability.is_a(*root_capability))
            .then(|| root.name.clone())
    }

    fn render(ctx: &EditContext<'_>, owner: &str, path: &MemberPath) -> Option<RenderedAccessor> {
        let member = ctx.outline().member(path)?;
        let name = Self::accessor_name(&ctx.config.accessor_prefix, &member.name);
        Some(ctx.language().render_accessor(&AccessorSpec {
            owner,
            name: &name,
            field_path: &path.segments()[1..],
            super_type: member.super_type.as_deref(),
        }))
    }

    /// Add the accessor for the member at `path`; returns false when none applies
    pub fn create(ctx: &mut EditContext<'_>, path: &MemberPath) -> Result<bool> {
        if path.is_root() {
            return Ok(false);
        }
        let Some(owner) = Self::owner_for(ctx, path) else {
            debug!("No accessor root for {}", path);
            return Ok(false);
        };
        let name = Self::accessor_name(&ctx.config.accessor_prefix, path.name());
        if ctx.outline().method(&owner, &name).is_some() {
            return Ok(false);
        }
        let Some(rendered) = Self::render(ctx, &owner, path) else {
            return Ok(false);
        };

        let outline = ctx.outline();
        let accessors: Vec<_> = outline
            .methods()
            .iter()
            .filter(|method| {
                method.owner == owner && method.name.starts_with(&ctx.config.accessor_prefix)
            })
            .collect();

        let edit = match accessors.iter().find(|method| method.name > name) {
            Some(next) => TextEdit::insert(next.span.start, format!("{}\n", rendered.text)),
            None => {
                let after = match accessors.last() {
                    Some(last) => last.span.end,
                    None => match outline.member(&MemberPath::root(owner.as_str())) {
                        Some(root) => root.span.end,
                        None => return Ok(false),
                    },
                };
                TextEdit::insert(after, format!("\n{}", rendered.text))
            }
        };

        ctx.apply(&format!("add accessor {}", name), vec![edit])?;
        Ok(true)
    }

    /// Add accessors for `path` and every member below it
    pub fn create_subtree(ctx: &mut EditContext<'_>, path: &MemberPath) -> Result<usize> {
        let paths: Vec<MemberPath> = ctx
            .outline()
            .subtree(path)
            .into_iter()
            .map(|member| member.path.clone())
            .collect();
        let mut created = 0;
        for path in &paths {
            if Self::create(ctx, path)? {
                created += 1;
            }
        }
        Ok(created)
    }

    /// Remove the accessor of `path` from its root.
    ///
    /// A method with the accessor's name that does not return this member is left alone.
    pub fn delete(ctx: &mut EditContext<'_>, path: &MemberPath) -> Result<bool> {
        let name = Self::accessor_name(&ctx.config.accessor_prefix, path.name());
        let Some(method) = ctx.outline().method(path.root_name(), &name) else {
            return Ok(false);
        };
        let owns_method = Self::render(ctx, path.root_name(), path).is_some_and(|rendered| {
            ctx.document().buffer().slice(method.span.clone()) == rendered.text
        });
        if !owns_method {
            debug!("{} does not belong to {}, keeping it", name, path);
            return Ok(false);
        }
        let range = with_adjacent_blank_line(&ctx.text(), method.span.clone());
        ctx.apply(&format!("remove accessor {}", name), vec![TextEdit::delete(range)])?;
        Ok(true)
    }

    /// Remove the accessors of every member below and including `path`, deepest first
    pub fn delete_subtree(ctx: &mut EditContext<'_>, path: &MemberPath) -> Result<usize> {
        let paths: Vec<MemberPath> = ctx
            .outline()
            .subtree(path)
            .into_iter()
            .map(|member| member.path.clone())
            .collect();
        let mut deleted = 0;
        for path in paths.iter().rev() {
            if Self::delete(ctx, path)? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    /// The accessor of `path` with its document offset, if it reads as rendered
    fn rendered_in_place(ctx: &EditContext<'_>, path: &MemberPath) -> Option<(usize, RenderedAccessor)> {
        let owner = Self::owner_for(ctx, path)?;
        let name = Self::accessor_name(&ctx.config.accessor_prefix, path.name());
        let method = ctx.outline().method(&owner, &name)?;
        let rendered = Self::render(ctx, &owner, path)?;
        let text = ctx.document().buffer().slice(method.span.clone());
        (text == rendered.text).then_some((method.span.start, rendered))
    }

    /// Document ranges of the member name inside its accessor
    pub fn name_ranges(ctx: &EditContext<'_>, path: &MemberPath) -> Vec<Range<usize>> {
        let Some((start, rendered)) = Self::rendered_in_place(ctx, path) else {
            return Vec::new();
        };
        rendered
            .name_ranges
            .iter()
            .map(|range| start + range.start..start + range.end)
            .collect()
    }

    /// Supertype slots inside the accessor: the return type as written and the
    /// embedded field of the selector by simple name
    pub fn super_type_slots(ctx: &EditContext<'_>, path: &MemberPath) -> Vec<Slot> {
        let Some((start, rendered)) = Self::rendered_in_place(ctx, path) else {
            return Vec::new();
        };
        let shift = |range: Range<usize>| start + range.start..start + range.end;
        let mut slots = Vec::new();
        if let Some(range) = rendered.type_range {
            slots.push(Slot::new(SUPER_TYPE_GROUP, shift(range)));
        }
        if let Some(range) = rendered.embedded_range {
            slots.push(Slot::new(SUPER_TYPE_GROUP, shift(range)).with_text(SlotText::SimpleName));
        }
        slots
    }
}
