use anyhow::Error as AnyhowError;
use server::{
    config::{ConfigError, ServiceConfig},
    routes,
    state::{AppState, StateError},
};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, prelude::*};

const LOGGED_CRATES: &[&str] = &[
    "server",
    "topology",
    "inventory_client",
    "cbs_client",
    "db",
    "tower_http",
];

#[derive(Debug, Error)]
pub enum NetworkServiceError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Other(#[from] AnyhowError),
}

#[tokio::main]
async fn main() -> Result<(), NetworkServiceError> {
    // Load environment variables from `.env` if present
    dotenv::dotenv().ok();

    let (config, ignored) = ServiceConfig::load()?;

    let default_level = if config.debug { "debug" } else { "info" };
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string());
    let filter_string = LOGGED_CRATES
        .iter()
        .fold("warn".to_string(), |acc, krate| format!("{acc},{krate}={log_level}"));
    let env_filter = EnvFilter::try_new(filter_string)
        .map_err(|e| AnyhowError::msg(format!("failed to create tracing filter: {e}")))?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();

    for warning in ignored {
        tracing::warn!("{}", warning);
    }
    tracing::debug!("config: {:?}", config);

    let state = AppState::from_config(&config).await?;
    if let Some(addr) = &config.solver_address {
        tracing::info!("solver location preset to {}", addr);
    }

    let app_router = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    let actual = listener.local_addr()?;
    tracing::info!("network service starting up on http://{}", actual);

    axum::serve(listener, app_router).await?;
    Ok(())
}
