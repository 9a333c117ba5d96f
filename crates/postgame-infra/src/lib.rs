//! Infrastructure layer for Postgame.
//!
//! Contains the concrete adapters the gateway runs on: the Gemini
//! implementation of the `LlmProvider` port defined in `postgame-core`, the
//! `postgame.toml` loader, and the persona loader with its built-in NFL
//! player persona.

pub mod config;
pub mod llm;
pub mod persona;
