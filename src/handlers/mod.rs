// handlers/mod.rs - HTTP handlers grouped by resource
//
// Reads are public. Writes take an `AuthUser`, which answers 401 on its own,
// then check the role with `AuthUser::require`.
pub mod auth;
pub mod health;
pub mod recipes;
pub mod tags;
pub mod users;


use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query};
use axum::Json;
use serde::Deserialize;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::filter::ItemFilter;

/// Raw list parameters. Numbers stay strings so bad input means 0 instead
/// of a rejected request.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub query: Option<String>,
    pub count: Option<String>,
    pub skip: Option<String>,
}

impl ListQuery {
    pub fn into_filter(self, config: &AppConfig) -> ItemFilter {
        ItemFilter::from_params(self.query.as_deref(), self.count.as_deref(), self.skip.as_deref())
            .capped(config.filter.max_count)
    }
}

/// Unwrap a list query, treating an unparsable query string as empty.
pub(crate) fn list_query(query: Option<Query<ListQuery>>) -> ListQuery {
    query.map(|Query(q)| q).unwrap_or_default()
}

pub(crate) fn path_id(path: Result<Path<i32>, PathRejection>) -> Result<i32, ApiError> {
    let Path(id) = path?;
    Ok(id)
}

pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    let Json(value) = body?;
    Ok(value)
}
