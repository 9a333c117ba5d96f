//! GeminiProvider -- concrete [`LlmProvider`] implementation for Google Gemini.
//!
//! Sends the assembled prompt as a single user turn to
//! `{base_url}/models/{model}:generateContent` and returns the concatenated
//! text of the first candidate.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is only exposed
//! when building the request header.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::Instrument;

use postgame_core::llm::provider::LlmProvider;
use postgame_observe::genai_attrs::{
    GEN_AI_RESPONSE_FINISH_REASONS, GEN_AI_USAGE_INPUT_TOKENS, GEN_AI_USAGE_OUTPUT_TOKENS,
};
use postgame_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};

use super::types::{
    GeminiContent, GeminiErrorResponse, GeminiPart, GeminiRequest, GeminiResponse,
    GenerationConfig,
};

/// Finish reasons that mean the candidate was withheld, not merely short.
const BLOCKING_FINISH_REASONS: &[&str] =
    &["SAFETY", "RECITATION", "BLOCKLIST", "PROHIBITED_CONTENT", "SPII"];

/// Google Gemini provider.
///
/// Does not derive Debug so the key can never end up in logs.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";

    /// Create a provider whose requests time out after `timeout`.
    pub fn new(api_key: SecretString, model: String, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model,
        })
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    fn to_gemini_request(request: &CompletionRequest) -> GeminiRequest {
        let generation_config = if request.temperature.is_some() || request.max_output_tokens.is_some() {
            Some(GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            })
        } else {
            None
        };

        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: Some(request.prompt.clone()),
                }],
            }],
            generation_config,
        }
    }

    async fn send(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let model = if request.model.is_empty() {
            self.model.as_str()
        } else {
            request.model.as_str()
        };

        let response = self
            .client
            .post(self.url(model))
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&Self::to_gemini_request(request))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_ms(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(map_status_error(status.as_u16(), &body, retry_after));
        }

        let body: GeminiResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else {
                LlmError::Deserialization(format!("failed to parse response: {e}"))
            }
        })?;

        parse_response(body, model)
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };
        let span = tracing::info_span!(
            "chat",
            "gen_ai.operation.name" = postgame_observe::genai_attrs::OP_CHAT,
            "gen_ai.provider.name" = postgame_observe::genai_attrs::PROVIDER_GEMINI,
            "gen_ai.request.model" = %model,
            "gen_ai.usage.input_tokens" = tracing::field::Empty,
            "gen_ai.usage.output_tokens" = tracing::field::Empty,
            "gen_ai.response.finish_reasons" = tracing::field::Empty,
        );

        let result = self.send(request).instrument(span.clone()).await;
        if let Ok(response) = &result {
            span.record(GEN_AI_USAGE_INPUT_TOKENS, response.usage.input_tokens);
            span.record(GEN_AI_USAGE_OUTPUT_TOKENS, response.usage.output_tokens);
            if let Some(reason) = &response.finish_reason {
                span.record(GEN_AI_RESPONSE_FINISH_REASONS, reason.as_str());
            }
        }
        result
    }
}

fn map_transport_error(err: reqwest::Error) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Provider {
            message: format!("HTTP request failed: {err}"),
        }
    }
}

/// `Retry-After` in milliseconds, when given as whole seconds.
pub(crate) fn retry_after_ms(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| secs.saturating_mul(1000))
}

/// Map a non-2xx status and its body to an [`LlmError`].
pub(crate) fn map_status_error(status: u16, body: &str, retry_after_ms: Option<u64>) -> LlmError {
    let message = serde_json::from_str::<GeminiErrorResponse>(body)
        .map(|e| match e.error.status {
            Some(s) => format!("{s}: {}", e.error.message),
            None => e.error.message,
        })
        .unwrap_or_else(|_| body.to_string());

    match status {
        401 | 403 => LlmError::AuthenticationFailed,
        408 | 504 => LlmError::Timeout,
        429 => LlmError::RateLimited { retry_after_ms },
        400 => LlmError::InvalidRequest(message),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {message}"),
        },
    }
}

/// Turn a successful Gemini response into a [`CompletionResponse`].
///
/// A blocked prompt, or a candidate withheld for a blocking finish reason,
/// becomes [`LlmError::Blocked`]. No candidate or no text becomes
/// [`LlmError::EmptyResponse`].
pub(crate) fn parse_response(body: GeminiResponse, model: &str) -> Result<CompletionResponse, LlmError> {
    if let Some(reason) = body.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(LlmError::Blocked(reason));
    }

    let candidate = body
        .candidates
        .into_iter()
        .next()
        .ok_or(LlmError::EmptyResponse)?;

    let content: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(match candidate.finish_reason {
            Some(reason) if BLOCKING_FINISH_REASONS.contains(&reason.as_str()) => {
                LlmError::Blocked(reason)
            }
            _ => LlmError::EmptyResponse,
        });
    }

    let usage = body.usage_metadata.unwrap_or_default();
    Ok(CompletionResponse {
        content,
        model: body.model_version.unwrap_or_else(|| model.to_string()),
        finish_reason: candidate.finish_reason,
        usage: Usage {
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
        },
    })
}
