//! Shared domain types for Postgame.
//!
//! This crate contains the core domain types used across the gateway:
//! sessions, turns, persona configuration, gateway configuration, LLM
//! request/response shapes, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod persona;
