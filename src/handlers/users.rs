// handlers/users.rs - Account administration (Admin only)
use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, Query, State},
    Json,
};
use tracing::info;

use super::{json_body, list_query, path_id, ListQuery};
use crate::app::AppState;
use crate::auth::Permission;
use crate::database::User;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// GET /api/users?query=&count=&skip=
pub async fn list(
    State(state): State<AppState>,
    admin: AuthUser,
    query: Option<Query<ListQuery>>,
) -> Result<Json<Vec<User>>, ApiError> {
    admin.require(Permission::ManageUsers)?;
    let filter = list_query(query).into_filter(&state.config);
    Ok(Json(state.users.list(&filter).await?))
}

/// POST /api/users
///
/// Provisions an account from email and role. The person can log in once
/// the identity provider confirms that email.
pub async fn create(
    State(state): State<AppState>,
    admin: AuthUser,
    body: Result<Json<User>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    admin.require(Permission::ManageUsers)?;
    let user = json_body(body)?;
    validate(&user)?;

    let created = state.users.create(&user).await?;
    info!("Admin {} provisioned user {} ({})", admin.0.id, created.id, created.role);
    Ok(Json(created))
}

/// PUT /api/users/:id
pub async fn update(
    State(state): State<AppState>,
    admin: AuthUser,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<User>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    admin.require(Permission::ManageUsers)?;
    let id = path_id(path)?;
    let user = json_body(body)?;
    validate(&user)?;

    Ok(Json(state.users.update(id, &user).await?))
}

/// DELETE /api/users/:id
pub async fn delete(
    State(state): State<AppState>,
    admin: AuthUser,
    path: Result<Path<i32>, PathRejection>,
) -> Result<(), ApiError> {
    admin.require(Permission::ManageUsers)?;
    let id = path_id(path)?;
    state.users.delete(id).await?;
    info!("Admin {} deleted user {}", admin.0.id, id);
    Ok(())
}

fn validate(user: &User) -> Result<(), ApiError> {
    user.validate()
        .map_err(|fields| ApiError::validation_error("Invalid user", Some(fields)))
}
