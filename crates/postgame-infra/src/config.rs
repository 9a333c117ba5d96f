//! Gateway configuration loader for Postgame.
//!
//! Reads `postgame.toml` and deserializes it into [`GatewayConfig`]. Falls
//! back to sensible defaults when the file is missing or malformed.

use std::path::Path;

use postgame_types::config::GatewayConfig;
use postgame_types::error::ConfigError;

/// Load gateway configuration from `config_path`.
///
/// - If the file does not exist, returns [`GatewayConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_gateway_config(config_path: &Path) -> GatewayConfig {
    let content = match tokio::fs::read_to_string(config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config found at {}, using defaults", config_path.display());
            return GatewayConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GatewayConfig::default();
        }
    };

    match toml::from_str::<GatewayConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GatewayConfig::default()
        }
    }
}

/// Reject configurations the gateway cannot run with.
pub fn validate_config(config: &GatewayConfig) -> Result<(), ConfigError> {
    if config.history_window == 0 {
        return Err(ConfigError::Invalid(
            "history_window must be at least 1".to_string(),
        ));
    }
    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "request_timeout_secs must be at least 1".to_string(),
        ));
    }
    if let Some(cap) = config.max_history_turns {
        if cap < config.history_window {
            return Err(ConfigError::Invalid(format!(
                "max_history_turns ({cap}) is smaller than history_window ({})",
                config.history_window
            )));
        }
    }
    if config.model.trim().is_empty() {
        return Err(ConfigError::Invalid("model must not be empty".to_string()));
    }
    Ok(())
}
