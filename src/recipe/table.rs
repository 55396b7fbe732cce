use super::{MemberSource, Recipe, RecipeRequest, Slot, NAME_GROUP, SUPER_TYPE_GROUP};
use crate::core::OrderKey;

/// A table field holding a nested `Table` member with one starter column
#[derive(Debug, Clone)]
pub struct TableRecipe {
    pub table_type: String,
    pub column_type: String,
    pub column_name: String,
}

impl TableRecipe {
    pub fn new(table_type: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            table_type: table_type.into(),
            column_type: column_type.into(),
            column_name: "NameColumn".to_string(),
        }
    }
}

impl Recipe for TableRecipe {
    fn required_types(&self) -> Vec<String> {
        vec![self.table_type.clone(), self.column_type.clone()]
    }

    fn render(&self, request: &RecipeRequest<'_>) -> MemberSource {
        let first = request
            .language
            .order_comment(OrderKey::nth(1, request.order_step));
        let table_ref = request
            .references
            .first()
            .map(String::as_str)
            .unwrap_or(&self.table_type);
        let column_ref = request
            .references
            .get(1)
            .map(String::as_str)
            .unwrap_or(&self.column_type);

        let mut text = format!("{} struct {{\n\t", request.name);
        let super_start = text.len();
        text.push_str(request.super_type);
        let super_end = text.len();
        text.push_str(&format!(
            "\n\t{first}\n\tTable struct {{\n\t\t{table_ref}\n\t\t{first}\n\t\t{column} struct {{\n\t\t\t{column_ref}\n\t\t}}\n\t}}\n}}\n",
            column = self.column_name,
        ));

        MemberSource {
            text,
            slots: vec![
                Slot::new(NAME_GROUP, 0..request.name.len()),
                Slot::new(SUPER_TYPE_GROUP, super_start..super_end),
            ],
        }
    }
}
