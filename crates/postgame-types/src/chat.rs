//! Session, turn, and connection-state types for Postgame.
//!
//! These types model one interview: the opaque session identifier a client
//! connects with, the turns exchanged on it, and the lifecycle state of the
//! connection carrying it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::error::SessionError;

/// Longest session identifier accepted from a client.
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Speaker of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Label used for this role inside a prompt document.
    pub fn speaker_label(self) -> &'static str {
        match self {
            Role::User => "Reporter",
            Role::Assistant => "Player",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(format!("invalid role: '{other}'")),
        }
    }
}

/// One immutable message in a session's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Opaque identifier of a session, supplied by the client or minted by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Validate a client-supplied identifier.
    ///
    /// Rejects empty or whitespace-only ids and ids longer than
    /// [`MAX_SESSION_ID_LEN`] characters.
    pub fn parse(raw: impl Into<String>) -> Result<Self, SessionError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(SessionError::InvalidId("session id is empty".to_string()));
        }
        if raw.chars().count() > MAX_SESSION_ID_LEN {
            return Err(SessionError::InvalidId(format!(
                "session id exceeds {MAX_SESSION_ID_LEN} characters"
            )));
        }
        Ok(Self(raw))
    }

    /// Mint a fresh server-side identifier (`session_<uuid v7>`).
    pub fn generate() -> Self {
        Self(format!("session_{}", Uuid::now_v7().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Lifecycle state of one client connection.
///
/// `Connecting -> Open -> Closing -> Closed`. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl ConnectionState {
    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// `Open -> Open` is the message cycle. A connection that never opened
    /// (e.g. rejected at registration) may go straight to `Closing`.
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Connecting, Open)
                | (Connecting, Closing)
                | (Open, Open)
                | (Open, Closing)
                | (Closing, Closed)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == ConnectionState::Closed
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Open => write!(f, "open"),
            ConnectionState::Closing => write!(f, "closing"),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}
