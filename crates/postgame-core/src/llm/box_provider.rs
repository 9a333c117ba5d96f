//! Type-erased provider handle.
//!
//! [`LlmProvider`] returns `impl Future`, so it cannot be a trait object.
//! [`ErasedProvider`] is the object-safe mirror with a boxed future, blanket
//! implemented for every provider, and [`BoxLlmProvider`] owns one behind an
//! `Arc` so the gateway can pick the backend at startup.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use postgame_types::llm::{CompletionRequest, CompletionResponse, LlmError};

use super::provider::LlmProvider;

type CompletionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>>;

/// Object-safe view of an [`LlmProvider`].
pub trait ErasedProvider: Send + Sync {
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    fn complete_erased<'a>(&'a self, request: &'a CompletionRequest) -> CompletionFuture<'a>;
}

impl<T: LlmProvider> ErasedProvider for T {
    fn name(&self) -> &str {
        LlmProvider::name(self)
    }

    fn model(&self) -> &str {
        LlmProvider::model(self)
    }

    fn complete_erased<'a>(&'a self, request: &'a CompletionRequest) -> CompletionFuture<'a> {
        Box::pin(self.complete(request))
    }
}

/// Shared, type-erased provider. Clones point at the same backend.
#[derive(Clone)]
pub struct BoxLlmProvider {
    inner: Arc<dyn ErasedProvider>,
}

impl BoxLlmProvider {
    pub fn new<T: LlmProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Arc::new(provider),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn model(&self) -> &str {
        self.inner.model()
    }

    pub async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.inner.complete_erased(request).await
    }
}

/// Renders as `name/model`, e.g. `gemini/gemini-2.5-pro`.
impl fmt::Display for BoxLlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name(), self.model())
    }
}

impl fmt::Debug for BoxLlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxLlmProvider")
            .field("name", &self.name())
            .field("model", &self.model())
            .finish()
    }
}
