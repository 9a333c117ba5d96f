//! WebSocket adapter for the interview endpoint.
//!
//! `/ws/{session_id}` upgrades to a WebSocket and hands the socket to the
//! shared [`ConnectionHandler`](postgame_core::session::connection::ConnectionHandler).
//! Bare `/ws` does the same under a freshly minted id, returned to the client
//! in the `x-session-id` header of the upgrade response.
//!
//! Text frames become inbound messages; every reply goes back as one text
//! frame. Binary and control frames are ignored.
//!
//! A connection refused by the registry (duplicate id under the `reject`
//! policy) is answered with a policy-violation close frame.

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code};
use axum::extract::{Path, State};
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};

use postgame_types::chat::SessionId;
use postgame_types::error::TransportError;

use crate::http::error::AppError;
use crate::state::AppState;

/// Response header carrying the id of a server-minted session.
pub const SESSION_ID_HEADER: &str = "x-session-id";

/// Upgrade an HTTP request to an interview WebSocket for `session_id`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let id = SessionId::parse(session_id).map_err(|e| AppError::InvalidSessionId(e.to_string()))?;
    Ok(ws
        .on_upgrade(move |socket| handle_ws_connection(socket, id, state))
        .into_response())
}

/// Upgrade to an interview WebSocket under a server-minted session id.
pub async fn ws_minted_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let id = SessionId::generate();
    let header = HeaderValue::from_str(id.as_str()).ok();
    tracing::debug!(session_id = %id, "Minted session id");

    let mut response = ws
        .on_upgrade(move |socket| handle_ws_connection(socket, id, state))
        .into_response();
    if let Some(value) = header {
        response.headers_mut().insert(SESSION_ID_HEADER, value);
    }
    response
}

async fn handle_ws_connection(mut socket: WebSocket, id: SessionId, state: AppState) {
    let conn = match state.handler.open(id.clone()) {
        Ok(conn) => conn,
        Err(err) => {
            tracing::warn!(session_id = %id, error = %err, "Refusing WebSocket connection");
            let frame = CloseFrame {
                code: close_code::POLICY,
                reason: err.to_string().into(),
            };
            if socket.send(Message::Close(Some(frame))).await.is_err() {
                tracing::debug!(session_id = %id, "Client gone before close frame");
            }
            return;
        }
    };

    let (ws_sender, ws_receiver) = socket.split();

    let inbound = Box::pin(ws_receiver.filter_map(|msg| async move {
        match msg {
            Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
            Ok(Message::Binary(_)) => {
                tracing::debug!("Ignoring binary frame");
                None
            }
            // Close ends the stream on the next poll; ping/pong are handled by axum.
            Ok(_) => None,
            Err(err) => Some(Err(TransportError::Receive(err.to_string()))),
        }
    }));

    let outbound = Box::pin(
        ws_sender
            .sink_map_err(|err| TransportError::Send(err.to_string()))
            .with(|text: String| async move { Ok::<_, TransportError>(Message::Text(text.into())) }),
    );

    let summary = state.handler.serve(conn, inbound, outbound).await;
    tracing::info!(
        session_id = %summary.session_id,
        answered = summary.messages_answered,
        reason = ?summary.reason,
        "WebSocket connection closed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::time::timeout;
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message as WsMessage;
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

    use postgame_core::llm::box_provider::BoxLlmProvider;
    use postgame_core::llm::provider::LlmProvider;
    use postgame_core::session::registry::SessionRegistry;
    use postgame_types::config::{DuplicateSessionPolicy, GatewayConfig};
    use postgame_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};
    use postgame_types::persona::PersonaConfig;

    use crate::http::router::build_router;

    const TIMEOUT: Duration = Duration::from_secs(5);

    type WsStream = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Replies `reply <n>` to the n-th request.
    #[derive(Default)]
    struct CountingProvider {
        calls: AtomicUsize,
    }

    impl LlmProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        fn model(&self) -> &str {
            "counting-1"
        }

        async fn complete(&self, _request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(CompletionResponse {
                content: format!("reply {n}"),
                model: "counting-1".to_string(),
                finish_reason: None,
                usage: Usage::default(),
            })
        }
    }

    /// Serve the full router on an ephemeral port.
    async fn boot(config: GatewayConfig) -> (SocketAddr, SessionRegistry) {
        let state = AppState::new(
            config,
            PersonaConfig::new("Be a player.", "Reporter: hi"),
            BoxLlmProvider::new(CountingProvider::default()),
        );
        let registry = state.handler.registry().clone();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });
        (addr, registry)
    }

    async fn next_frame(ws: &mut WsStream) -> WsMessage {
        timeout(TIMEOUT, ws.next())
            .await
            .expect("no frame in time")
            .expect("stream ended")
            .expect("receive failed")
    }

    async fn next_text(ws: &mut WsStream) -> String {
        match next_frame(ws).await {
            WsMessage::Text(text) => text.as_str().to_owned(),
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    async fn wait_for(mut condition: impl FnMut() -> bool) {
        timeout(TIMEOUT, async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition not met in time");
    }

    fn sid(s: &str) -> SessionId {
        SessionId::parse(s).unwrap()
    }

    #[tokio::test]
    async fn text_frame_gets_one_reply_and_binary_is_ignored() {
        let (addr, registry) = boot(GatewayConfig::default()).await;
        let (mut ws, _) = connect_async(format!("ws://{addr}/ws/reporter_1")).await.unwrap();

        ws.send(WsMessage::Binary(vec![1u8, 2, 3].into())).await.unwrap();
        ws.send(WsMessage::text("How was the game?")).await.unwrap();

        // The binary frame never reached the backend.
        assert_eq!(next_text(&mut ws).await, "reply 1");
        assert!(timeout(Duration::from_millis(200), ws.next()).await.is_err());
        assert!(registry.contains(&sid("reporter_1")));

        ws.send(WsMessage::text("And next week?")).await.unwrap();
        assert_eq!(next_text(&mut ws).await, "reply 2");
    }

    #[tokio::test]
    async fn close_frame_removes_session() {
        let (addr, registry) = boot(GatewayConfig::default()).await;
        let (mut ws, _) = connect_async(format!("ws://{addr}/ws/leaving")).await.unwrap();
        wait_for(|| registry.contains(&sid("leaving"))).await;

        ws.close(None).await.unwrap();
        wait_for(|| registry.is_empty()).await;
    }

    #[tokio::test]
    async fn reject_policy_duplicate_gets_policy_close() {
        let config = GatewayConfig {
            duplicate_session_policy: DuplicateSessionPolicy::Reject,
            ..Default::default()
        };
        let (addr, registry) = boot(config).await;

        let (mut first, _) = connect_async(format!("ws://{addr}/ws/dup")).await.unwrap();
        wait_for(|| registry.contains(&sid("dup"))).await;

        let (mut second, _) = connect_async(format!("ws://{addr}/ws/dup")).await.unwrap();
        match next_frame(&mut second).await {
            WsMessage::Close(Some(frame)) => {
                assert_eq!(frame.code, CloseCode::Policy);
                assert_eq!(u16::from(frame.code), 1008);
            }
            other => panic!("expected policy close, got {other:?}"),
        }

        // The original occupant is untouched.
        first.send(WsMessage::text("Still there?")).await.unwrap();
        assert_eq!(next_text(&mut first).await, "reply 1");
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn bare_ws_mints_session_id() {
        let (addr, registry) = boot(GatewayConfig::default()).await;
        let (mut ws, response) = connect_async(format!("ws://{addr}/ws")).await.unwrap();

        let minted = response
            .headers()
            .get(SESSION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .expect("session id header");
        assert!(minted.starts_with("session_"));
        wait_for(|| registry.contains(&sid(&minted))).await;

        ws.send(WsMessage::text("Who starts at QB?")).await.unwrap();
        assert_eq!(next_text(&mut ws).await, "reply 1");
    }

    #[tokio::test]
    async fn overlong_session_id_is_refused_before_upgrade() {
        let (addr, registry) = boot(GatewayConfig::default()).await;
        let long_id = "x".repeat(200);

        let err = connect_async(format!("ws://{addr}/ws/{long_id}"))
            .await
            .unwrap_err();
        match err {
            tokio_tungstenite::tungstenite::Error::Http(response) => {
                assert_eq!(response.status(), 400);
            }
            other => panic!("expected HTTP 400, got {other:?}"),
        }
        assert!(registry.is_empty());
    }
}
