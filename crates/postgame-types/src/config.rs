//! Gateway configuration types for Postgame.
//!
//! `GatewayConfig` represents `postgame.toml`. Every field has a default, so
//! an empty or missing file yields a working configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// What to do when a client connects with a session id that is still active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateSessionPolicy {
    /// Supersede the active session: close it and start a fresh, empty history.
    #[default]
    Replace,
    /// Refuse the new connection and leave the active session untouched.
    Reject,
}

/// Top-level configuration for the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Generation model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the generation API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Number of most recent turns included in each prompt.
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Optional cap on turns retained per session. `None` keeps the full log.
    #[serde(default)]
    pub max_history_turns: Option<usize>,

    /// Frames a connection may queue while its reply is being generated.
    /// One more closes the connection.
    #[serde(default = "default_max_pending_messages")]
    pub max_pending_messages: usize,

    #[serde(default)]
    pub duplicate_session_policy: DuplicateSessionPolicy,

    /// Timeout applied to each backend request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// TOML file overriding the built-in persona.
    #[serde(default)]
    pub persona_path: Option<PathBuf>,

    /// Directory of static client files served at `/`.
    #[serde(default)]
    pub web_dir: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_model() -> String {
    "gemini-2.5-pro".to_string()
}

fn default_api_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_history_window() -> usize {
    10
}

fn default_max_pending_messages() -> usize {
    16
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            model: default_model(),
            api_base_url: default_api_base_url(),
            history_window: default_history_window(),
            max_history_turns: None,
            max_pending_messages: default_max_pending_messages(),
            duplicate_session_policy: DuplicateSessionPolicy::default(),
            request_timeout_secs: default_request_timeout_secs(),
            persona_path: None,
            web_dir: None,
        }
    }
}

impl GatewayConfig {
    /// `host:port` string suitable for binding a listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
