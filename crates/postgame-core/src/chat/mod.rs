//! Conversation primitives: the per-session turn log and the prompt builder.

pub mod history;
pub mod prompt;
