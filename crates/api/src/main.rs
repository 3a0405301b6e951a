use anyhow::{Context, Result};
use tracing::info;

use foodlink_api::app::{create_app, Stores};
use foodlink_api::config::Config;
use foodlink_api::middleware::{init_metrics, logging::init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load().context("Failed to load configuration")?;

    init_logging(&config.logging).context("Failed to initialize logging")?;
    init_metrics().context("Failed to install metrics recorder")?;

    info!("Starting FoodLink API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&(&config.database).into())
        .await
        .context("Failed to connect to database")?;

    info!("Running database migrations...");
    persistence::db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;
    info!("Migrations completed");

    tokio::fs::create_dir_all(&config.storage.photo_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.storage.photo_dir))?;

    let addr = config.socket_addr().context("Invalid server address")?;
    let stores = Stores::postgres(pool, &config);
    let app = create_app(config, stores).context("Failed to build session signing keys")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
