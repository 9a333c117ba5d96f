//! LlmProvider trait definition.
//!
//! This is the core abstraction that every generation backend implements.
//! Uses RPITIT for `complete`, so implementations can be plain `async fn`.

use postgame_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for text-generation backends (Gemini, test doubles, ...).
///
/// Implementations live in postgame-infra (e.g., `GeminiProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Model used when a request does not name one.
    fn model(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
