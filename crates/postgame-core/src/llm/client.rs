//! Generation client: one prompt in, one reply out.
//!
//! [`GenerationClient::generate`] returns a typed outcome -- the generated
//! text, or the reason generation failed. [`GenerationClient::respond`]
//! applies the fallback policy on top, so callers always get text to send.

use std::time::Instant;

use tracing::{debug, warn};

use postgame_types::llm::{CompletionRequest, GenerationFailure};

use crate::chat::prompt::PromptDocument;

use super::box_provider::BoxLlmProvider;
use super::fallback::FallbackLines;

/// Result of one generation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Backend produced usable text (already trimmed).
    Generated(String),
    /// Backend failed or produced nothing usable.
    Failed {
        reason: GenerationFailure,
        detail: String,
    },
}

/// Where a reply's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Generated,
    Fallback(GenerationFailure),
}

/// Text to send back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

impl Reply {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, ReplySource::Fallback(_))
    }
}

/// Calls the configured provider and absorbs its failures.
#[derive(Debug)]
pub struct GenerationClient {
    provider: BoxLlmProvider,
    fallbacks: FallbackLines,
}

impl GenerationClient {
    pub fn new(provider: BoxLlmProvider) -> Self {
        Self {
            provider,
            fallbacks: FallbackLines::default(),
        }
    }

    /// Send `prompt` to the provider.
    ///
    /// Whitespace around successful text is trimmed; text that is empty after
    /// trimming counts as [`GenerationFailure::Empty`].
    pub async fn generate(&self, prompt: &PromptDocument) -> GenerationOutcome {
        let request = CompletionRequest::from_prompt(prompt.as_str());
        let start = Instant::now();

        match self.provider.complete(&request).await {
            Ok(response) => {
                let text = response.content.trim();
                debug!(
                    provider = %self.provider,
                    model = %response.model,
                    output_tokens = response.usage.output_tokens,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Generation complete"
                );
                if text.is_empty() {
                    GenerationOutcome::Failed {
                        reason: GenerationFailure::Empty,
                        detail: "provider returned blank text".to_string(),
                    }
                } else {
                    GenerationOutcome::Generated(text.to_string())
                }
            }
            Err(err) => GenerationOutcome::Failed {
                reason: GenerationFailure::from(&err),
                detail: err.to_string(),
            },
        }
    }

    /// Send `prompt` and map any failure to its fallback line.
    pub async fn respond(&self, prompt: &PromptDocument) -> Reply {
        match self.generate(prompt).await {
            GenerationOutcome::Generated(text) => Reply {
                text,
                source: ReplySource::Generated,
            },
            GenerationOutcome::Failed { reason, detail } => {
                warn!(
                    provider = %self.provider,
                    %reason,
                    error = %detail,
                    "Generation failed, substituting fallback line"
                );
                self.fallback(reason)
            }
        }
    }

    /// The fallback reply for `reason`.
    pub fn fallback(&self, reason: GenerationFailure) -> Reply {
        Reply {
            text: self.fallbacks.for_failure(reason).to_string(),
            source: ReplySource::Fallback(reason),
        }
    }
}
