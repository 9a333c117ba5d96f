//! Axum router configuration with middleware.
//!
//! Routes: `/ws/{session_id}` and `/ws` (interview socket, the latter under a
//! server-minted id) and `/health`.
//! Middleware: CORS, tracing.
//!
//! When `web_dir` is configured and exists, its files are served for every
//! other path, falling back to `index.html`. Otherwise only the API is served.

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let web_dir = state.config.web_dir.clone();

    let mut router = Router::new()
        .route("/ws", get(handlers::ws::ws_minted_handler))
        .route("/ws/{session_id}", get(handlers::ws::ws_handler))
        .route("/health", get(handlers::health::health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if let Some(web_dir) = web_dir.filter(|dir| dir.is_dir()) {
        let serve_dir = ServeDir::new(&web_dir).fallback(ServeFile::new(web_dir.join("index.html")));
        router = router.fallback_service(serve_dir);
        tracing::info!(path = %web_dir.display(), "Static file serving enabled");
    }

    router
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use postgame_core::llm::box_provider::BoxLlmProvider;
    use postgame_core::llm::provider::LlmProvider;
    use postgame_types::config::GatewayConfig;
    use postgame_types::llm::{CompletionRequest, CompletionResponse, LlmError};
    use postgame_types::persona::PersonaConfig;

    struct SilentProvider;

    impl LlmProvider for SilentProvider {
        fn name(&self) -> &str {
            "silent"
        }

        fn model(&self) -> &str {
            "silent-1"
        }

        async fn complete(&self, _request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
            Err(LlmError::EmptyResponse)
        }
    }

    fn state_with(config: GatewayConfig) -> AppState {
        AppState::new(
            config,
            PersonaConfig::new("Be a player.", "Reporter: hi"),
            BoxLlmProvider::new(SilentProvider),
        )
    }

    #[tokio::test]
    async fn health_returns_fixed_status() {
        let app = build_router(state_with(GatewayConfig::default()));

        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "healthy" }));
    }

    #[tokio::test]
    async fn ws_route_without_upgrade_is_rejected() {
        let app = build_router(state_with(GatewayConfig::default()));

        let req = Request::builder()
            .uri("/ws/session_abc")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert!(resp.status().is_client_error());
    }

    #[tokio::test]
    async fn static_dir_served_with_index_fallback() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("index.html"), "<h1>postgame</h1>").unwrap();
        let config = GatewayConfig {
            web_dir: Some(tmp.path().to_path_buf()),
            ..Default::default()
        };
        let app = build_router(state_with(config));

        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<h1>postgame</h1>");

        let req = Request::builder()
            .uri("/some/client/route")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_static_dir_serves_api_only() {
        let config = GatewayConfig {
            web_dir: Some("/definitely/not/here".into()),
            ..Default::default()
        };
        let app = build_router(state_with(config));

        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
