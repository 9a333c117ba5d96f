//! Application state wiring the gateway together.
//!
//! AppState holds the single [`ConnectionHandler`] shared by every WebSocket
//! connection, plus the configuration it was built from.

use std::sync::Arc;

use anyhow::Context;

use postgame_core::chat::prompt::PromptAssembler;
use postgame_core::llm::box_provider::BoxLlmProvider;
use postgame_core::llm::client::GenerationClient;
use postgame_core::session::connection::ConnectionHandler;
use postgame_core::session::registry::SessionRegistry;
use postgame_infra::config::validate_config;
use postgame_infra::llm::create_provider;
use postgame_infra::persona::load_persona;
use postgame_types::config::GatewayConfig;
use postgame_types::persona::PersonaConfig;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub handler: ConnectionHandler,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    /// Wire the registry, persona, and provider into a connection handler.
    pub fn new(config: GatewayConfig, persona: PersonaConfig, provider: BoxLlmProvider) -> Self {
        let registry =
            SessionRegistry::new(config.duplicate_session_policy, config.max_history_turns);
        let assembler = PromptAssembler::new(Arc::new(persona));
        let client = Arc::new(GenerationClient::new(provider));
        let handler = ConnectionHandler::new(registry, assembler, client)
            .with_history_window(config.history_window)
            .with_max_pending(config.max_pending_messages);

        Self {
            handler,
            config: Arc::new(config),
        }
    }

    /// Validate the config, load the persona, and build the Gemini provider.
    pub async fn init(config: GatewayConfig, api_key: Option<&str>) -> anyhow::Result<Self> {
        validate_config(&config)?;

        let persona = load_persona(config.persona_path.as_deref())
            .await
            .context("failed to load persona")?;

        let provider = create_provider(&config, api_key)
            .context("failed to create Gemini provider (is GEMINI_API_KEY set?)")?;

        Ok(Self::new(config, persona, provider))
    }
}
