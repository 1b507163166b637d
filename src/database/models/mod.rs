pub mod recipe;
pub mod user;

pub use recipe::{LinkedRecipe, Recipe};
pub(crate) use recipe::RecipeRow;
pub use user::User;

/// Field name to message, reported back to the client on validation failure.
pub type FieldErrors = std::collections::HashMap<String, String>;
