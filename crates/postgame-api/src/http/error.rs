//! Application error type mapping to HTTP status codes.
//!
//! Only the handshake can fail over HTTP; once a socket is upgraded, errors
//! are reported through WebSocket close frames instead.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// The session id in the path was rejected before the upgrade.
    InvalidSessionId(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::InvalidSessionId(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_SESSION_ID", msg)
            }
        };

        let body = json!({
            "meta": {
                "timestamp": chrono::Utc::now().to_rfc3339(),
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn invalid_id_is_bad_request_with_error_code() {
        let resp = AppError::InvalidSessionId("invalid session id: blank".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["errors"][0]["code"], "INVALID_SESSION_ID");
    }
}
