use anyhow::Context;
use tracing_subscriber::EnvFilter;

use plantops::{
    build_router,
    config::config,
    cors_layer,
    database::{DatabaseManager, Store},
    is_production,
    services::{ensure_super_admin, BootstrapOutcome},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, PLANTOPS_SESSION_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("plantops=info,tower_http=info")),
        )
        .init();

    let config = config();
    config.validate().context("invalid configuration")?;
    tracing::info!("Starting PlantOps in {:?} mode", config.environment);

    let store = match &config.database.url {
        Some(_) => {
            let pool = DatabaseManager::connect(&config.database)
                .await
                .context("failed to connect to database")?;
            Store::postgres(pool)
        }
        None => {
            if is_production!() {
                tracing::warn!("DATABASE_URL is not set in production; using the in-memory store");
            } else {
                tracing::warn!("DATABASE_URL is not set; using the in-memory store, data will not survive a restart");
            }
            Store::in_memory()
        }
    };

    match ensure_super_admin(&store, &config.bootstrap).await? {
        BootstrapOutcome::Created(id) => tracing::info!(user_id = %id, "bootstrap super admin ready"),
        BootstrapOutcome::AlreadyPresent(_) => {
            tracing::debug!("bootstrap super admin already present")
        }
        BootstrapOutcome::Skipped => {}
    }

    let state = AppState::from_config(config, store).context("invalid session settings")?;
    let app = build_router(state).layer(cors_layer(&config.security.cors_origins));

    let bind_addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("PlantOps listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
