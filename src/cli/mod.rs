use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::app::{app, AppState};
use crate::config::AppConfig;
use crate::database::DatabaseManager;

#[derive(Parser)]
#[command(name = "recipes")]
#[command(about = "Recipe collection server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Apply database migrations before listening")]
        migrate: bool,
    },

    #[command(about = "Apply database migrations and exit")]
    Migrate,
}

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve { migrate: false }) {
        Commands::Serve { migrate } => serve(config, migrate).await,
        Commands::Migrate => {
            let pool = DatabaseManager::connect(&config.database).await?;
            DatabaseManager::migrate(&pool).await?;
            Ok(())
        }
    }
}

async fn serve(config: AppConfig, migrate: bool) -> anyhow::Result<()> {
    info!("Starting recipes API in {:?} mode", config.environment);

    let pool = DatabaseManager::connect(&config.database).await?;
    if migrate || config.database.run_migrations {
        DatabaseManager::migrate(&pool).await?;
    }

    let bind_addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app(AppState::new(pool, config)))
        .await
        .context("server error")?;
    Ok(())
}
