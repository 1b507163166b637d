use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::debug;

use super::manager::DatabaseError;
use super::models::{LinkedRecipe, Recipe, RecipeRow};
use super::query_builder;
use super::RecipeStore;
use crate::filter::{Filter, FilterTarget, ItemFilter, SqlBuilder, SqlParam};

/// Recipe columns plus author name, aggregated tags and linked recipes.
/// Callers append `GROUP BY recipes.id, users.name`.
const RECIPE_SELECT: &str = r#"SELECT recipes.id, recipes.revision,
        recipes.amount, recipes.author_id, recipes.directions,
        recipes.ingredients, recipes.notes, recipes.oven,
        recipes.source, recipes.summary, recipes.time, recipes.title,
        COALESCE(json_agg(tags.tag ORDER BY tags.tag)
                FILTER (WHERE tags.tag IS NOT NULL), '[]'::json)
            AS tags,
        users.name AS author_name,
        COALESCE((SELECT json_agg(json_build_object(
                    'id', linked_recipes.dest,
                    'title', lr.title) ORDER BY lr.title)
                FROM linked_recipes
                JOIN recipes lr ON linked_recipes.dest = lr.id
                WHERE linked_recipes.src = recipes.id),
            '[]'::json)
            AS linked_recipes
    FROM recipes
    JOIN users
        ON recipes.author_id = users.id
    LEFT JOIN tags
        ON recipes.id = tags.recipe_id"#;

/// Postgres-backed [`RecipeStore`].
#[derive(Clone)]
pub struct RecipeRepository {
    pool: PgPool,
}

impl RecipeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete every tag of `recipe_id`, then insert `tags`. Only safe inside
    /// a transaction; the empty set in between must never be visible.
    async fn replace_tags(conn: &mut PgConnection, recipe_id: i32, tags: &[&str]) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM tags WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *conn)
            .await?;
        for tag in tags {
            sqlx::query("INSERT INTO tags (recipe_id, tag) VALUES ($1, $2)")
                .bind(recipe_id)
                .bind(*tag)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    /// Same contract as [`Self::replace_tags`], for outgoing links.
    async fn replace_links(conn: &mut PgConnection, src: i32, dests: &[i32]) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM linked_recipes WHERE src = $1")
            .bind(src)
            .execute(&mut *conn)
            .await?;
        for dest in dests {
            sqlx::query("INSERT INTO linked_recipes (src, dest) VALUES ($1, $2)")
                .bind(src)
                .bind(*dest)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    /// Lock the recipe row for the rest of the transaction, failing with
    /// `NotFound` when it does not exist.
    async fn lock_existing(conn: &mut PgConnection, id: i32) -> Result<(), DatabaseError> {
        let found: Option<i32> = sqlx::query_scalar("SELECT author_id FROM recipes WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        found
            .map(|_| ())
            .ok_or_else(|| DatabaseError::NotFound(format!("recipe {}", id)))
    }

    /// The guarded scalar update. The author predicate is left out only when
    /// `force` is set.
    fn update_sql(recipe: &Recipe, directions: serde_json::Value, ingredients: serde_json::Value, user_id: i32, force: bool) -> SqlBuilder {
        let mut b = SqlBuilder::new(
            "UPDATE recipes SET (revision, amount, directions, ingredients, \
             notes, oven, source, summary, \"time\", title) = (revision + 1",
        );
        let values: [SqlParam; 9] = [
            recipe.amount.as_str().into(),
            directions.into(),
            ingredients.into(),
            recipe.notes.as_str().into(),
            recipe.oven.as_str().into(),
            recipe.source.as_str().into(),
            recipe.summary.as_str().into(),
            recipe.time.as_str().into(),
            recipe.title.as_str().into(),
        ];
        for value in values {
            b.push_with(", ", value);
        }
        b.push_with(") WHERE id = ", recipe.id);
        if !force {
            b.push_with(" AND author_id = ", user_id);
        }
        b.push(" RETURNING id");
        b
    }

    fn delete_sql(id: i32, user_id: i32, force: bool) -> SqlBuilder {
        let mut b = SqlBuilder::new("DELETE FROM recipes WHERE id = ");
        b.push_bind(id);
        if !force {
            b.push_with(" AND author_id = ", user_id);
        }
        b.push(" RETURNING id");
        b
    }
}

#[async_trait]
impl RecipeStore for RecipeRepository {
    async fn list(&self, filter: &ItemFilter) -> Result<Vec<Recipe>, DatabaseError> {
        let sql = Filter::from_item_filter(FilterTarget::Recipes, filter).to_sql(RECIPE_SELECT);
        let rows: Vec<RecipeRow> = query_builder::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    async fn get(&self, id: i32) -> Result<Recipe, DatabaseError> {
        let mut b = SqlBuilder::new(RECIPE_SELECT);
        b.push_with(" WHERE recipes.id = ", id)
            .push(" GROUP BY recipes.id, users.name");
        let sql = b.finish();

        let row: Option<RecipeRow> = query_builder::query_as(&sql).fetch_optional(&self.pool).await?;
        row.map(Recipe::from)
            .ok_or_else(|| DatabaseError::NotFound(format!("recipe {}", id)))
    }

    async fn create(&self, recipe: &Recipe) -> Result<Recipe, DatabaseError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO recipes (title, summary, author_id) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&recipe.title)
        .bind(&recipe.summary)
        .bind(recipe.author_id)
        .fetch_one(&self.pool)
        .await?;

        debug!("Created recipe {} for author {}", id, recipe.author_id);
        self.get(id).await
    }

    async fn save(&self, recipe: &Recipe, user_id: i32, force: bool) -> Result<Recipe, DatabaseError> {
        let directions = serde_json::to_value(&recipe.directions)?;
        let ingredients = serde_json::to_value(&recipe.ingredients)?;
        let sql = Self::update_sql(recipe, directions, ingredients, user_id, force).finish();

        // Dropping the transaction on any early return rolls everything back.
        let mut tx = self.pool.begin().await?;
        Self::lock_existing(&mut tx, recipe.id).await?;
        Self::replace_tags(&mut tx, recipe.id, &recipe.distinct_tags()).await?;
        Self::replace_links(&mut tx, recipe.id, &recipe.distinct_links()).await?;

        let updated: Option<(i32,)> = query_builder::query_as(&sql).fetch_optional(&mut *tx).await?;
        let (id,) = updated.ok_or(DatabaseError::NoRowsAffected)?;
        tx.commit().await?;

        debug!("Saved recipe {} (user {}, force {})", id, user_id, force);
        self.get(id).await
    }

    async fn delete(&self, id: i32, user_id: i32, force: bool) -> Result<(), DatabaseError> {
        let sql = Self::delete_sql(id, user_id, force).finish();

        let mut tx = self.pool.begin().await?;
        Self::lock_existing(&mut tx, id).await?;
        let deleted = query_builder::query(&sql).execute(&mut *tx).await?;
        if deleted.rows_affected() == 0 {
            return Err(DatabaseError::NoRowsAffected);
        }
        tx.commit().await?;

        debug!("Deleted recipe {} (user {}, force {})", id, user_id, force);
        Ok(())
    }

    async fn tags(&self) -> Result<Vec<String>, DatabaseError> {
        let tags: Vec<String> = sqlx::query_scalar("SELECT DISTINCT tag FROM tags ORDER BY tag")
            .fetch_all(&self.pool)
            .await?;
        Ok(tags)
    }

    async fn titles(&self) -> Result<Vec<LinkedRecipe>, DatabaseError> {
        let titles = sqlx::query_as::<_, LinkedRecipe>("SELECT id, title FROM recipes ORDER BY title")
            .fetch_all(&self.pool)
            .await?;
        Ok(titles)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        super::DatabaseManager::health_check(&self.pool).await
    }
}
