//! Session lifecycle: the shared registry and the per-connection handler.

pub mod connection;
pub mod registry;
