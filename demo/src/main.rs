//! Demo server entry point

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use model_link::utils::logging::init_logging;
use model_link::{init_schema, ClientOptions, ConnectionConfig, LoggingConfig, SyncMode};
use model_link_demo::{create_router, db, AppState};

#[derive(Debug, Parser)]
#[command(name = "model_link_demo", about = "Serve two related models over HTTP")]
struct Args {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Schema sync mode run at startup: sync, force or alter
    #[arg(long = "sync", env = "DB_SYNC", default_value = "sync")]
    sync_mode: SyncMode,

    /// Log every statement sent to the database
    #[arg(long, env = "DB_LOGGING")]
    db_logging: bool,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// text or json
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    log_format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Variables from .env must be visible before the arguments are parsed
    dotenvy::dotenv().ok();
    let args = Args::parse();

    init_logging(&LoggingConfig {
        level: args.log_level.clone(),
        format: args.log_format.clone(),
        ..Default::default()
    })?;

    let options = ClientOptions {
        logging: args.db_logging,
        ..Default::default()
    };
    let client = db::build_client(&ConnectionConfig::from_env(), options)?;

    let mode = init_schema(&client, args.sync_mode)
        .await
        .context("Failed to initialize the database schema")?;
    info!(mode = %mode, "Database ready");

    let app = create_router(AppState {
        client: Arc::new(client),
    });

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
