// handlers/tags.rs - Tag vocabulary for autocomplete
use axum::{extract::State, Json};

use crate::app::AppState;
use crate::error::ApiError;

/// GET /api/tags
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.recipes.tags().await?))
}
