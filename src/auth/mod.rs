pub mod oauth;

use tracing::warn;

use crate::database::{DatabaseError, User, UserStore};

pub const ROLE_ADMIN: &str = "Admin";
pub const ROLE_MODERATOR: &str = "Moderator";
pub const ROLE_USER: &str = "User";

/// Actions gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// List, create, update and delete user accounts.
    ManageUsers,
    /// Create, update and delete recipes.
    EditRecipes,
    /// Update or delete recipes authored by someone else.
    ForceRecipes,
}

/// Whether `role` grants `permission`. Role names are matched exactly.
pub fn allowed(role: &str, permission: Permission) -> bool {
    match permission {
        Permission::ManageUsers => role == ROLE_ADMIN,
        Permission::EditRecipes => matches!(role, ROLE_ADMIN | ROLE_MODERATOR | ROLE_USER),
        Permission::ForceRecipes => matches!(role, ROLE_ADMIN | ROLE_MODERATOR),
    }
}

/// Who is making a request, as far as the session cookie tells.
#[derive(Debug, Clone)]
pub enum Session {
    /// No session cookie was sent.
    Anonymous,
    /// A session cookie was sent but matches no user. The client's cookies
    /// are out of date and must be cleared.
    Stale,
    Authenticated(User),
}

/// Look up the user owning `token`.
pub async fn resolve_session(users: &dyn UserStore, token: Option<&str>) -> Result<Session, DatabaseError> {
    let token = match token {
        Some(t) if !t.is_empty() => t,
        _ => return Ok(Session::Anonymous),
    };

    match users.get_by_token(token).await {
        Ok(user) => Ok(Session::Authenticated(user)),
        Err(DatabaseError::NotFound(_)) => {
            warn!("Request with unknown session token");
            Ok(Session::Stale)
        }
        Err(e) => Err(e),
    }
}
