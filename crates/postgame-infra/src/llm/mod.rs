//! LLM provider implementations.
//!
//! Contains the Gemini implementation of the [`LlmProvider`] trait defined
//! in `postgame-core`, and a factory ([`create_provider`]) that builds it
//! from the gateway configuration.
//!
//! [`LlmProvider`]: postgame_core::llm::provider::LlmProvider

pub mod gemini;

use std::time::Duration;

use secrecy::SecretString;

use postgame_core::llm::box_provider::BoxLlmProvider;
use postgame_types::config::GatewayConfig;
use postgame_types::llm::LlmError;

use self::gemini::GeminiProvider;

/// Create a [`BoxLlmProvider`] from the gateway configuration.
///
/// # Errors
///
/// Returns [`LlmError::AuthenticationFailed`] when no API key is provided,
/// or a provider error if the HTTP client cannot be built.
pub fn create_provider(config: &GatewayConfig, api_key: Option<&str>) -> Result<BoxLlmProvider, LlmError> {
    let key = api_key
        .filter(|k| !k.trim().is_empty())
        .ok_or(LlmError::AuthenticationFailed)?;
    let secret = SecretString::from(key.to_string());

    let provider = GeminiProvider::new(
        secret,
        config.model.clone(),
        Duration::from_secs(config.request_timeout_secs),
    )?
    .with_base_url(config.api_base_url.clone());

    tracing::info!(model = %config.model, base_url = %config.api_base_url, "Created Gemini provider");
    Ok(BoxLlmProvider::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_provider_requires_key() {
        let config = GatewayConfig::default();
        assert!(matches!(
            create_provider(&config, None),
            Err(LlmError::AuthenticationFailed)
        ));
        assert!(matches!(
            create_provider(&config, Some("  ")),
            Err(LlmError::AuthenticationFailed)
        ));
    }

    #[test]
    fn create_provider_uses_configured_model() {
        let config = GatewayConfig {
            model: "gemini-2.5-flash".to_string(),
            ..Default::default()
        };
        let provider = create_provider(&config, Some("test-key")).unwrap();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.model(), "gemini-2.5-flash");
    }
}
