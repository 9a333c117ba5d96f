//! CLI command definitions for the `postgame` binary.

pub mod prompt;
pub mod serve;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use postgame_types::config::GatewayConfig;

/// Postgame interview gateway: reporters ask, an NFL player deflects.
#[derive(Parser)]
#[command(name = "postgame", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the gateway config file.
    #[arg(long, global = true, env = "POSTGAME_CONFIG", default_value = "postgame.toml")]
    pub config: PathBuf,

    /// Detailed output (-v for debug, -vv for trace). `RUST_LOG` wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as newline-delimited JSON.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log filter used when `RUST_LOG` is unset.
    pub fn default_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info,tower_http=info",
            1 => "info,postgame=debug,postgame_core=debug,postgame_infra=debug,tower_http=debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the WebSocket gateway.
    Serve(ServeArgs),

    /// Print the prompt a fresh session would send for MESSAGE, without
    /// contacting the backend.
    Prompt {
        /// The reporter's question.
        message: String,
    },
}

/// Overrides applied on top of the config file.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to bind.
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Port to bind.
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Gemini model name.
    #[arg(long, env = "POSTGAME_MODEL")]
    pub model: Option<String>,

    /// Directory of static client files.
    #[arg(long)]
    pub web_dir: Option<PathBuf>,
}

impl ServeArgs {
    /// Layer flag and environment values over `config`.
    pub fn apply(&self, config: &mut GatewayConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(web_dir) = &self.web_dir {
            config.web_dir = Some(web_dir.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_args_override_config() {
        let mut config = GatewayConfig::default();
        let args = ServeArgs {
            port: Some(9001),
            model: Some("gemini-2.5-flash".to_string()),
            ..Default::default()
        };
        args.apply(&mut config);
        assert_eq!(config.port, 9001);
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn prompt_subcommand_parses_message() {
        let cli = Cli::try_parse_from(["postgame", "prompt", "How was the game?"]).unwrap();
        match cli.command {
            Commands::Prompt { message } => assert_eq!(message, "How was the game?"),
            Commands::Serve(_) => panic!("expected prompt"),
        }
    }
}
