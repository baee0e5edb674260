mod config;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use blogr_api::{AppState, AppStateInner, router, session::SessionKeys};
use blogr_db::ConnectionManager;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "blogr", version, about = "A small blog server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Clear the existing data and create new tables.
    InitDb,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blogr=debug,blogr_api=debug,blogr_db=debug,tower_http=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    config.ensure_instance_dir()?;

    let db = ConnectionManager::new(&config.database);

    match cli.command.unwrap_or(Command::Serve) {
        Command::InitDb => {
            db.init_schema()?;
            println!("Initialized the database.");
            Ok(())
        }
        Command::Serve => serve(config, db).await,
    }
}

async fn serve(config: Config, db: ConnectionManager) -> anyhow::Result<()> {
    if !db.schema_present()? {
        warn!(
            "Tables missing in {}; run `blogr init-db` first",
            config.database.display()
        );
    }

    let state: AppState = Arc::new(AppStateInner {
        db,
        sessions: SessionKeys::new(
            &config.secret_key,
            chrono::Duration::days(config.session_days),
        ),
    });

    let app = router(state);

    let addr = config.addr()?;
    info!("Blogr listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down...");
}
