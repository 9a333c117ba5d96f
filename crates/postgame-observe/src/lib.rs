//! Observability for Postgame: tracing subscriber setup and the GenAI
//! attribute names recorded on generation spans.

pub mod genai_attrs;
pub mod tracing_setup;
