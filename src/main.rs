use anyhow::Context;
use tracing_subscriber::EnvFilter;

use budget_tracker_server::{
    build_router, config::Config, constants::DEFAULT_LOG_FILTER, database,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // load environment variables
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = Config::from_env().context("Invalid configuration")?;

    let db = database::init_db(&config.data_path)
        .await
        .context("Failed to initialize database")?;
    database::ensure_defaults(&db)
        .await
        .context("Failed to seed default data")?;

    let app = build_router(db, &config);

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    tracing::info!("Server running on http://{}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
