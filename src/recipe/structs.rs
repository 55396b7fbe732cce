use super::{MemberSource, Recipe, RecipeRequest, Slot, NAME_GROUP, SUPER_TYPE_GROUP};

/// A member that only embeds its supertype
#[derive(Debug, Clone, Copy, Default)]
pub struct StructRecipe;

impl Recipe for StructRecipe {
    fn render(&self, request: &RecipeRequest<'_>) -> MemberSource {
        let mut text = String::new();
        text.push_str(request.name);
        text.push_str(" struct {\n\t");
        let super_start = text.len();
        text.push_str(request.super_type);
        let super_end = text.len();
        text.push_str("\n}\n");

        MemberSource {
            text,
            slots: vec![
                Slot::new(NAME_GROUP, 0..request.name.len()),
                Slot::new(SUPER_TYPE_GROUP, super_start..super_end),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Go;

    #[test]
    fn test_struct_recipe() {
        let language = Go::new();
        let source = StructRecipe.render(&RecipeRequest {
            name: "NameField",
            super_type: "fields.StringField",
            references: &[],
            order_step: 10.0,
            language: &language,
        });
        assert_eq!(source.text, "NameField struct {\n\tfields.StringField\n}\n");
        assert_eq!(&source.text[source.slots[1].range.clone()], "fields.StringField");
    }
}
