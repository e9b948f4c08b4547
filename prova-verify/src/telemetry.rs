use tracing_subscriber::EnvFilter;

use crate::options::ConfigError;

/// Installs the global fmt subscriber. `RUST_LOG` wins over `default_filter`.
///
/// Fails if a subscriber is already installed or the filter does not parse.
pub fn init_logging(default_filter: &str) -> Result<(), ConfigError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .map_err(|e| ConfigError::msg(format!("Invalid log filter '{}': {}", default_filter, e)))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| ConfigError::msg(format!("Failed to install logger: {}", e)))
}
