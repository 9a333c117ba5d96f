//! LLM provider abstractions for Postgame.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: Object-safe wrapper for dynamic dispatch
//! - `GenerationClient`: prompt in, reply out, with in-character fallbacks
//! - `FallbackLines`: failure reason to fallback text mapping

pub mod box_provider;
pub mod client;
pub mod fallback;
pub mod provider;
