//! `postgame serve` -- run the WebSocket gateway until shutdown.

use postgame_types::config::GatewayConfig;

use crate::http;
use crate::state::AppState;

/// Bind, serve, and close every session on shutdown.
pub async fn serve(config: GatewayConfig, api_key: Option<&str>) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let state = AppState::init(config, api_key).await?;
    let registry = state.handler.registry().clone();

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} Postgame gateway listening on {}",
        console::style("🏈").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!(
        "  {}",
        console::style(format!("Interview socket: ws://{addr}/ws/{{session_id}}")).dim()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());
    tracing::info!(%addr, model = %state.config.model, "Gateway started");

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!(sessions = registry.len(), "Shutting down, closing sessions");
            registry.close_all();
        })
        .await?;

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
