use clap::Parser;
use tracing_subscriber::EnvFilter;

use recipes_api::cli::{self, Cli};
use recipes_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and the OAuth client
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env();

    let default_filter = if config.is_development() {
        "debug,tower_http=debug,sqlx=info"
    } else {
        "info,tower_http=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    cli::run(Cli::parse(), config).await
}
