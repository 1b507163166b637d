pub mod manager;
pub mod models;
pub mod query_builder;
pub mod recipes;
pub mod users;

use async_trait::async_trait;

pub use manager::{DatabaseError, DatabaseManager};
pub use models::{LinkedRecipe, Recipe, User};
pub use recipes::RecipeRepository;
pub use users::UserRepository;

use crate::filter::ItemFilter;

/// Storage for the recipe aggregate: recipes with their tags and links.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn list(&self, filter: &ItemFilter) -> Result<Vec<Recipe>, DatabaseError>;

    async fn get(&self, id: i32) -> Result<Recipe, DatabaseError>;

    /// Insert a recipe from its title, summary and author only.
    async fn create(&self, recipe: &Recipe) -> Result<Recipe, DatabaseError>;

    /// Replace tags, links and scalar fields in one transaction. Unless
    /// `force` is set, only the author may save; anyone else gets
    /// [`DatabaseError::NoRowsAffected`].
    async fn save(&self, recipe: &Recipe, user_id: i32, force: bool) -> Result<Recipe, DatabaseError>;

    /// Same ownership rule as [`RecipeStore::save`].
    async fn delete(&self, id: i32, user_id: i32, force: bool) -> Result<(), DatabaseError>;

    /// Every distinct tag, sorted.
    async fn tags(&self) -> Result<Vec<String>, DatabaseError>;

    /// Id and title of every recipe, sorted by title.
    async fn titles(&self) -> Result<Vec<LinkedRecipe>, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list(&self, filter: &ItemFilter) -> Result<Vec<User>, DatabaseError>;

    async fn get(&self, id: i32) -> Result<User, DatabaseError>;

    /// Insert a user from its email and role only.
    async fn create(&self, user: &User) -> Result<User, DatabaseError>;

    /// Update email and role of user `id`.
    async fn update(&self, id: i32, user: &User) -> Result<User, DatabaseError>;

    async fn delete(&self, id: i32) -> Result<(), DatabaseError>;

    async fn get_by_token(&self, token: &str) -> Result<User, DatabaseError>;

    /// Record a login for a pre-provisioned account. Unknown emails are
    /// [`DatabaseError::NotFound`]; accounts are never created here.
    async fn record_login(&self, email: &str, name: &str, token: &str) -> Result<User, DatabaseError>;

    /// Invalidate a session token. Unknown tokens are not an error.
    async fn logout(&self, token: &str) -> Result<(), DatabaseError>;
}
