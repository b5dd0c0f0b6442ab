use anyhow::Result;
use tracing::info;

use netinv_api::{app, config, middleware};
use persistence::db;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = config::Config::load()?;

    middleware::logging::init_logging(&config.logging)?;
    middleware::init_metrics()?;

    info!("Starting netinv API v{}", env!("CARGO_PKG_VERSION"));

    let pool = db::create_pool(&db::DatabaseConfig::from(&config.database)).await?;

    info!("Running database migrations...");
    db::run_migrations(&pool).await?;
    info!("Migrations completed");

    // Fails fast on a malformed entity declaration.
    let registry = persistence::default_registry()?;
    registry.install(&pool).await?;
    info!(
        entities = registry.entities().count(),
        audit_tables = registry.audit_tables().count(),
        "Entity registry installed"
    );

    let app = app::create_app(config.clone(), pool)?;

    let addr = config.socket_addr()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
