//! Business logic for the Postgame chat gateway.
//!
//! Per-session history, prompt assembly, the session registry, the
//! per-connection message loop, and the LLM provider port. This crate depends
//! only on `postgame-types` -- never on `postgame-infra` or any HTTP crate.

pub mod chat;
pub mod llm;
pub mod session;
