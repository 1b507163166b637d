use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::FieldErrors;

/// A user account. The session token is never part of this type; it is only
/// ever written or matched in SQL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
    pub lastlog: Option<DateTime<Utc>>,
    pub creation_date: DateTime<Utc>,
    // Fields from other tables.
    pub recipes_authored: i64,
}

impl User {
    /// Name to show for this user, falling back to the email address.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.email,
        }
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.email.trim().is_empty() {
            errors.insert("email".to_string(), "This field is required".to_string());
        }
        if self.role.trim().is_empty() {
            errors.insert("role".to_string(), "This field is required".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
