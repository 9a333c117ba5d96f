//! HTTP layer: router, WebSocket adapter, and error mapping.

pub mod error;
pub mod handlers;
pub mod router;
