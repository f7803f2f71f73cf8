pub mod config;
pub mod error;

pub use config::{Config, StorageConfig, WeatherConfig};
pub use error::{AppError, ConfigError, DatabaseError, RusqliteErrorExt};

use anyhow::Result;

/// Initialize the core: logging subscriber driven by `RUST_LOG`.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Stratus core initialized");
    Ok(())
}
