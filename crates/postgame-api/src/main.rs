//! Postgame gateway entry point.
//!
//! Binary name: `postgame`
//!
//! Loads `.env`, parses CLI arguments, sets up tracing, resolves the gateway
//! configuration, then dispatches to the requested command.

mod cli;
mod http;
mod state;

use clap::Parser;

use cli::{Cli, Commands};
use postgame_infra::config::load_gateway_config;
use postgame_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Must run before clap reads `env = ...` fallbacks.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    init_tracing(&TracingOptions {
        enable_otel: cli.otel,
        json: cli.log_json,
        default_filter: cli.default_filter().to_string(),
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    match &dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!("Failed to load .env: {err}"),
    }

    let mut config = load_gateway_config(&cli.config).await;

    let result = match cli.command {
        Commands::Serve(args) => {
            args.apply(&mut config);
            cli::serve::serve(config, args.api_key.as_deref()).await
        }
        Commands::Prompt { message } => cli::prompt::preview_prompt(&config, &message).await,
    };

    shutdown_tracing();
    result
}
