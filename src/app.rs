use std::sync::Arc;

use axum::{
    routing::{get, put},
    Router,
};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::oauth::{GoogleProvider, IdentityProvider};
use crate::config::AppConfig;
use crate::database::{RecipeRepository, RecipeStore, UserRepository, UserStore};
use crate::handlers;

/// Shared by every handler. Stores are trait objects so the router can run
/// against Postgres or an in-memory double.
#[derive(Clone)]
pub struct AppState {
    pub recipes: Arc<dyn RecipeStore>,
    pub users: Arc<dyn UserStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wire the Postgres repositories and the Google identity provider.
    pub fn new(pool: PgPool, config: AppConfig) -> Self {
        Self {
            recipes: Arc::new(RecipeRepository::new(pool.clone())),
            users: Arc::new(UserRepository::new(pool)),
            identity: Arc::new(GoogleProvider::new(config.oauth.clone())),
            config: Arc::new(config),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let enable_cors = state.config.security.enable_cors;

    let router = Router::new()
        .route("/health", get(handlers::health::health))
        .nest(
            "/api",
            Router::new()
                .merge(recipe_routes())
                .merge(user_routes())
                .merge(auth_routes())
                .route("/tags", get(handlers::tags::list)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

fn recipe_routes() -> Router<AppState> {
    use handlers::recipes;

    Router::new()
        .route("/recipes", get(recipes::list).post(recipes::create))
        .route("/recipes/titles", get(recipes::titles))
        .route(
            "/recipes/:id",
            get(recipes::get).put(recipes::update).delete(recipes::delete),
        )
}

fn user_routes() -> Router<AppState> {
    use handlers::users;

    Router::new()
        .route("/users", get(users::list).post(users::create))
        .route("/users/:id", put(users::update).delete(users::delete))
}

fn auth_routes() -> Router<AppState> {
    use handlers::auth;

    Router::new()
        .route("/auth/google/login", get(auth::login))
        .route("/auth/oauth2callback", get(auth::callback))
        .route("/auth/logout", get(auth::logout))
}
