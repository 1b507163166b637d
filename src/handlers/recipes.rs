// handlers/recipes.rs - Recipe listing, reads and author-guarded writes
use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, Query, State},
    Json,
};
use tracing::{info, warn};

use super::{json_body, list_query, path_id, ListQuery};
use crate::app::AppState;
use crate::auth::Permission;
use crate::database::{DatabaseError, LinkedRecipe, Recipe};
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// GET /api/recipes?query=&count=&skip=
pub async fn list(
    State(state): State<AppState>,
    query: Option<Query<ListQuery>>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    let filter = list_query(query).into_filter(&state.config);
    let recipes = state.recipes.list(&filter).await?;
    Ok(Json(recipes))
}

/// GET /api/recipes/titles
pub async fn titles(State(state): State<AppState>) -> Result<Json<Vec<LinkedRecipe>>, ApiError> {
    Ok(Json(state.recipes.titles().await?))
}

/// GET /api/recipes/:id
pub async fn get(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Recipe>, ApiError> {
    let id = path_id(path)?;
    Ok(Json(state.recipes.get(id).await?))
}

/// POST /api/recipes
///
/// Only the title and summary are stored; the signed-in user becomes the
/// author. Everything else is filled in with a follow-up PUT.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<Recipe>, JsonRejection>,
) -> Result<Json<Recipe>, ApiError> {
    user.require(Permission::EditRecipes)?;
    let mut recipe = json_body(body)?;
    recipe.id = 0;
    validate(&recipe)?;

    recipe.author_id = user.0.id;
    let created = state.recipes.create(&recipe).await?;
    info!("User {} created recipe {}", user.0.id, created.id);
    Ok(Json(created))
}

/// PUT /api/recipes/:id
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<Recipe>, JsonRejection>,
) -> Result<Json<Recipe>, ApiError> {
    user.require(Permission::EditRecipes)?;
    let id = path_id(path)?;
    let mut recipe = json_body(body)?;
    recipe.id = id;
    validate(&recipe)?;

    let force = user.can(Permission::ForceRecipes);
    let saved = state
        .recipes
        .save(&recipe, user.0.id, force)
        .await
        .map_err(|e| ownership_error(e, &user, id))?;
    Ok(Json(saved))
}

/// DELETE /api/recipes/:id
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    path: Result<Path<i32>, PathRejection>,
) -> Result<(), ApiError> {
    user.require(Permission::EditRecipes)?;
    let id = path_id(path)?;

    let force = user.can(Permission::ForceRecipes);
    state
        .recipes
        .delete(id, user.0.id, force)
        .await
        .map_err(|e| ownership_error(e, &user, id))?;
    info!("User {} deleted recipe {}", user.0.id, id);
    Ok(())
}

fn validate(recipe: &Recipe) -> Result<(), ApiError> {
    recipe
        .validate()
        .map_err(|fields| ApiError::validation_error("Invalid recipe", Some(fields)))
}

fn ownership_error(err: DatabaseError, user: &AuthUser, id: i32) -> ApiError {
    if matches!(err, DatabaseError::NoRowsAffected) {
        warn!("User {} is not the author of recipe {}", user.0.id, id);
    }
    err.into()
}
