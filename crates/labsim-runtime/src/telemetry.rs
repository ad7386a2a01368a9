//! Tracing subscriber setup for hosts embedding a lab session

use thiserror::Error;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::LoggingConfig;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Subscriber init failed: {0}")]
    Init(String),
}

/// Build the level filter: `RUST_LOG` wins over the configured level
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| TelemetryError::Filter(e.to_string()))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let registry = tracing_subscriber::registry().with(env_filter(config)?);

    let installed = if config.json {
        registry
            .with(fmt::layer().json().with_target(config.with_target))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(config.with_target))
            .try_init()
    };
    installed.map_err(|e| TelemetryError::Init(e.to_string()))?;

    info!(level = %config.level, json = config.json, "lab tracing initialized");
    Ok(())
}
