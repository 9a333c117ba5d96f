//! LLM request/response types for Postgame.
//!
//! The gateway sends one fully assembled prompt per request and receives one
//! complete reply; there is no message list and no streaming.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Request to an LLM provider for a single completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier; empty means the provider's configured default.
    pub model: String,
    /// The fully assembled prompt document.
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl CompletionRequest {
    /// A request for `prompt` using the provider's default model and sampling.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            model: String::new(),
            prompt: prompt.into(),
            max_output_tokens: None,
            temperature: None,
        }
    }
}

/// Response from an LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    pub usage: Usage,
}

/// Token usage for a completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Errors from LLM provider operations.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("request timed out")]
    Timeout,

    #[error("provider returned no text")]
    EmptyResponse,

    #[error("response blocked: {0}")]
    Blocked(String),

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Why a generation produced no usable reply.
///
/// This is the typed reason the gateway maps to an in-character fallback line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationFailure {
    /// Backend answered, but with no text (or only whitespace).
    Empty,
    /// Backend did not answer in time.
    Timeout,
    /// Backend refused to answer (safety filter, blocked prompt).
    Blocked,
    /// Backend is throttling us.
    RateLimited,
    /// Any other backend or protocol failure.
    Backend,
}

impl From<&LlmError> for GenerationFailure {
    fn from(err: &LlmError) -> Self {
        match err {
            LlmError::EmptyResponse => GenerationFailure::Empty,
            LlmError::Timeout => GenerationFailure::Timeout,
            LlmError::Blocked(_) => GenerationFailure::Blocked,
            LlmError::RateLimited { .. } => GenerationFailure::RateLimited,
            LlmError::Provider { .. }
            | LlmError::AuthenticationFailed
            | LlmError::Deserialization(_)
            | LlmError::InvalidRequest(_) => GenerationFailure::Backend,
        }
    }
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationFailure::Empty => write!(f, "empty"),
            GenerationFailure::Timeout => write!(f, "timeout"),
            GenerationFailure::Blocked => write!(f, "blocked"),
            GenerationFailure::RateLimited => write!(f, "rate_limited"),
            GenerationFailure::Backend => write!(f, "backend"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_reason_from_llm_error() {
        assert_eq!(
            GenerationFailure::from(&LlmError::EmptyResponse),
            GenerationFailure::Empty
        );
        assert_eq!(
            GenerationFailure::from(&LlmError::Timeout),
            GenerationFailure::Timeout
        );
        assert_eq!(
            GenerationFailure::from(&LlmError::Blocked("SAFETY".to_string())),
            GenerationFailure::Blocked
        );
        assert_eq!(
            GenerationFailure::from(&LlmError::RateLimited { retry_after_ms: None }),
            GenerationFailure::RateLimited
        );
        assert_eq!(
            GenerationFailure::from(&LlmError::AuthenticationFailed),
            GenerationFailure::Backend
        );
    }

    #[test]
    fn test_from_prompt_uses_provider_defaults() {
        let req = CompletionRequest::from_prompt("hello");
        assert!(req.model.is_empty());
        assert_eq!(req.prompt, "hello");
        assert!(req.temperature.is_none());

        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("temperature").is_none());
    }
}
