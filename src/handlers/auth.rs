// handlers/auth.rs - OAuth2 login, callback and logout
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::auth::{
    clear_session_cookies, oauth_state_cookie, removal_cookie, set_session_cookies, AUTH_COOKIE,
    OAUTH_STATE_COOKIE,
};

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// GET /api/auth/google/login - Redirect to the identity provider
pub async fn login(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let csrf = Uuid::new_v4().to_string();
    let location = state.identity.authorize_url(&csrf);
    let jar = jar.add(oauth_state_cookie(csrf, state.config.security.secure_cookies));
    (jar, found(&location))
}

/// GET /api/auth/oauth2callback - Finish the login and start a session
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    query: Option<Query<CallbackQuery>>,
) -> Result<Response, ApiError> {
    let params = query.map(|Query(q)| q).unwrap_or_default();

    let expected = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    // The state is single-use: every outcome from here on drops it.
    let jar = jar.add(removal_cookie(OAUTH_STATE_COOKIE));

    match (expected.as_deref(), params.state.as_deref()) {
        (Some(expected), Some(got)) if !expected.is_empty() && expected == got => {}
        _ => {
            warn!("OAuth callback with missing or mismatched state");
            return Ok((jar, ApiError::bad_request("Login state mismatch")).into_response());
        }
    }
    if let Some(error) = params.error {
        warn!("Identity provider refused login: {}", error);
        return Ok((jar, ApiError::bad_request("Login was cancelled or refused")).into_response());
    }
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return Ok((jar, ApiError::bad_request("Missing authorization code")).into_response());
    };

    let identity = match state.identity.exchange(&code).await {
        Ok(identity) => identity,
        Err(e) => return Ok((jar, ApiError::from(e)).into_response()),
    };
    let name = if identity.name.is_empty() {
        identity.email.clone()
    } else {
        identity.name
    };

    let token = Uuid::new_v4().to_string();
    let user = match state.users.record_login(&identity.email, &name, &token).await {
        Ok(user) => user,
        Err(DatabaseError::NotFound(_)) => {
            warn!("Unauthorized login attempt by {}", identity.email);
            return Ok((jar, ApiError::forbidden("This account is not authorized")).into_response());
        }
        Err(e) => return Ok((jar, ApiError::from(e)).into_response()),
    };
    info!("User {} <{}> logged in", user.id, user.email);

    let jar = set_session_cookies(jar, &user, &token, state.config.security.secure_cookies);
    Ok((jar, found("/")).into_response())
}

/// GET /api/auth/logout - End the session, if any
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Result<Response, ApiError> {
    if let Some(cookie) = jar.get(AUTH_COOKIE) {
        state.users.logout(cookie.value()).await?;
    }
    Ok((clear_session_cookies(jar), found("/")).into_response())
}

/// A plain 302, which is what browsers and the frontend expect here.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
