use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::warn;

use crate::app::AppState;
use crate::auth::{allowed, resolve_session, Permission, Session};
use crate::database::User;
use crate::error::ApiError;

/// HttpOnly cookie carrying the session token.
pub const AUTH_COOKIE: &str = "authentication";
/// Client-readable cookies the frontend uses for display and visibility.
pub const ROLE_COOKIE: &str = "role";
pub const USERNAME_COOKIE: &str = "username";
pub const USER_ID_COOKIE: &str = "user_id";
/// HttpOnly cookie carrying the OAuth `state` between login and callback.
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

const SESSION_COOKIES: [&str; 4] = [AUTH_COOKIE, ROLE_COOKIE, USERNAME_COOKIE, USER_ID_COOKIE];

/// The signed-in user. Extracting it rejects anonymous requests with 401,
/// and stale sessions with 401 plus removal of every session cookie.
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn can(&self, permission: Permission) -> bool {
        allowed(&self.0.role, permission)
    }

    /// 403 unless the user's role grants `permission`.
    pub fn require(&self, permission: Permission) -> Result<(), ApiError> {
        if self.can(permission) {
            return Ok(());
        }
        warn!(
            "User {} with role {:?} denied {:?}",
            self.0.id, self.0.role, permission
        );
        Err(ApiError::forbidden("Your role does not allow this action"))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(AUTH_COOKIE).map(|c| c.value().to_string());

        let session = resolve_session(state.users.as_ref(), token.as_deref())
            .await
            .map_err(|e| ApiError::from(e).into_response())?;

        match session {
            Session::Authenticated(user) => Ok(AuthUser(user)),
            Session::Anonymous => Err(ApiError::unauthorized("Login required").into_response()),
            Session::Stale => {
                let jar = clear_session_cookies(jar);
                Err((jar, ApiError::unauthorized("Session expired")).into_response())
            }
        }
    }
}

/// Add the four login cookies for `user`.
pub fn set_session_cookies(jar: CookieJar, user: &User, token: &str, secure: bool) -> CookieJar {
    let name = user.display_name().to_string();
    jar.add(session_cookie(AUTH_COOKIE, token.to_string(), secure, true))
        .add(session_cookie(ROLE_COOKIE, user.role.clone(), secure, false))
        .add(session_cookie(USERNAME_COOKIE, name, secure, false))
        .add(session_cookie(USER_ID_COOKIE, user.id.to_string(), secure, false))
}

/// Expire all four session cookies, whether or not the client sent them.
pub fn clear_session_cookies(mut jar: CookieJar) -> CookieJar {
    for name in SESSION_COOKIES {
        jar = jar.add(removal_cookie(name));
    }
    jar
}

pub fn oauth_state_cookie(state: String, secure: bool) -> Cookie<'static> {
    Cookie::build((OAUTH_STATE_COOKIE, state))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, "")).path("/").build();
    cookie.make_removal();
    cookie
}

fn session_cookie(name: &'static str, value: String, secure: bool, http_only: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .secure(secure)
        .http_only(http_only)
        .build()
}
