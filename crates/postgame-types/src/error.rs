use thiserror::Error;

/// Errors from session registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session '{0}' not found")]
    NotFound(String),

    #[error("session '{0}' is already active")]
    Duplicate(String),

    #[error("invalid session id: {0}")]
    InvalidId(String),
}

/// Errors from the transport carrying a session.
///
/// Any of these terminates the affected session only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection closed")]
    Closed,

    #[error("receive failed: {0}")]
    Receive(String),

    #[error("send failed: {0}")]
    Send(String),
}

/// Errors while loading startup configuration or persona data.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_display() {
        let err = SessionError::Duplicate("s1".to_string());
        assert_eq!(err.to_string(), "session 's1' is already active");
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Send("broken pipe".to_string());
        assert_eq!(err.to_string(), "send failed: broken pipe");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Parse {
            path: "postgame.toml".to_string(),
            message: "expected '='".to_string(),
        };
        assert!(err.to_string().contains("postgame.toml"));
    }
}
