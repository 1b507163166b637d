use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use super::FieldErrors;

/// A recipe with the fields joined in from other tables.
///
/// Request bodies may omit any field; missing ones take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recipe {
    pub id: i32,
    pub revision: i32,
    pub amount: String,
    pub author_id: i32,
    pub directions: Vec<String>,
    pub ingredients: Vec<String>,
    pub notes: String,
    pub oven: String,
    pub source: String,
    pub summary: String,
    pub time: String,
    pub title: String,
    // Fields from other tables.
    pub tags: Vec<String>,
    pub author_name: Option<String>,
    pub linked_recipes: Vec<LinkedRecipe>,
}

/// A reference from one recipe to another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LinkedRecipe {
    pub id: i32,
    #[serde(default)]
    pub title: String,
}

impl Recipe {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.title.trim().is_empty() {
            errors.insert("title".to_string(), "This field is required".to_string());
        }
        if self.id != 0 && self.linked_recipes.iter().any(|lr| lr.id == self.id) {
            errors.insert(
                "linked_recipes".to_string(),
                "A recipe cannot link to itself".to_string(),
            );
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Distinct tags in first-seen order.
    pub fn distinct_tags(&self) -> Vec<&str> {
        let mut seen = Vec::with_capacity(self.tags.len());
        for tag in &self.tags {
            if !seen.contains(&tag.as_str()) {
                seen.push(tag.as_str());
            }
        }
        seen
    }

    /// Distinct link destinations in first-seen order.
    pub fn distinct_links(&self) -> Vec<i32> {
        let mut seen = Vec::with_capacity(self.linked_recipes.len());
        for lr in &self.linked_recipes {
            if !seen.contains(&lr.id) {
                seen.push(lr.id);
            }
        }
        seen
    }
}

/// Row shape of the joined recipe query. JSON columns are decoded here and
/// nowhere else.
#[derive(Debug, FromRow)]
pub(crate) struct RecipeRow {
    pub id: i32,
    pub revision: i32,
    pub amount: String,
    pub author_id: i32,
    pub directions: Json<Vec<String>>,
    pub ingredients: Json<Vec<String>>,
    pub notes: String,
    pub oven: String,
    pub source: String,
    pub summary: String,
    pub time: String,
    pub title: String,
    pub tags: Json<Vec<String>>,
    pub author_name: Option<String>,
    pub linked_recipes: Json<Vec<LinkedRecipe>>,
}

impl From<RecipeRow> for Recipe {
    fn from(row: RecipeRow) -> Self {
        Self {
            id: row.id,
            revision: row.revision,
            amount: row.amount,
            author_id: row.author_id,
            directions: row.directions.0,
            ingredients: row.ingredients.0,
            notes: row.notes,
            oven: row.oven,
            source: row.source,
            summary: row.summary,
            time: row.time,
            title: row.title,
            tags: row.tags.0,
            author_name: row.author_name,
            linked_recipes: row.linked_recipes.0,
        }
    }
}
