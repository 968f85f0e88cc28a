// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Codepilot entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::Level;

use codepilot::collaborators::Collaborators;
use codepilot::config::{self, CliOptions, ServerConfig};
use codepilot::server::Server;
use codepilot::telemetry::{init_telemetry, TelemetryConfig};
use codepilot::VERSION;

/// Default socket when neither `--socket` nor the config names one.
const DEFAULT_SOCKET: &str = "/tmp/codepilot.sock";

/// Codepilot - human-in-the-loop multi-agent code assistance.
#[derive(Parser)]
#[command(name = "codepilot")]
#[command(author, version, about = "Human-in-the-loop multi-agent code assistance", long_about = None)]
struct Cli {
    /// Explicit config file (JSON or YAML)
    #[arg(short, long, env = "CODEPILOT_CONFIG")]
    config: Option<PathBuf>,

    /// Seconds to wait for a human reply (0 waits forever)
    #[arg(long, env = "CODEPILOT_REPLY_TIMEOUT")]
    reply_timeout: Option<u64>,

    /// Upper bound on discourse turns
    #[arg(long, env = "CODEPILOT_MAX_TURNS")]
    max_turns: Option<usize>,

    /// Show debug output
    #[arg(long)]
    debug: bool,

    /// Show trace output (full payloads)
    #[arg(long)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen on a Unix domain socket, one session per connection
    Serve {
        /// Socket path
        #[arg(short, long, env = "CODEPILOT_SOCKET")]
        socket: Option<PathBuf>,
    },

    /// Run a single session over stdin/stdout
    Stdio,

    /// Show or create configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the merged configuration
    Show,
    /// Create a workspace config file with defaults
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug, cli.trace)?;

    let socket_arg = match &cli.command {
        Commands::Serve { socket } => socket.clone(),
        _ => None,
    };
    let cli_options = CliOptions {
        reply_timeout_secs: cli.reply_timeout,
        max_turns: cli.max_turns,
        socket_path: socket_arg,
    };

    let workspace_root = std::env::current_dir()?;
    let config = config::load_config(&workspace_root, cli.config.as_deref(), &cli_options)?;

    match cli.command {
        Commands::Serve { .. } => serve(config).await,
        Commands::Stdio => {
            let outcome = Server::new(config, Collaborators::offline())
                .serve_stdio()
                .await?;
            tracing::info!(?outcome, "Session finished");
            Ok(())
        }
        Commands::Config { action } => handle_config(action, &config, &workspace_root),
    }
}

#[cfg(unix)]
async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let socket = config
        .socket_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SOCKET));
    eprintln!(
        "{} {} listening on {}",
        "codepilot".bright_blue().bold(),
        VERSION,
        socket.display().to_string().bright_white()
    );
    Server::new(config, Collaborators::offline())
        .serve(&socket)
        .await?;
    Ok(())
}

#[cfg(not(unix))]
async fn serve(_config: ServerConfig) -> anyhow::Result<()> {
    anyhow::bail!("Socket serving requires Unix domain sockets; use `codepilot stdio`")
}

fn handle_config(
    action: Option<ConfigAction>,
    config: &ServerConfig,
    workspace_root: &std::path::Path,
) -> anyhow::Result<()> {
    match action {
        Some(ConfigAction::Show) | None => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        Some(ConfigAction::Init) => {
            let path = config::init_config(workspace_root)?;
            println!("{} {}", "Created config file:".green(), path.display());
        }
    }
    Ok(())
}

fn init_tracing(debug: bool, trace: bool) -> std::io::Result<()> {
    let telemetry = if trace {
        TelemetryConfig::development()
            .with_level(Level::TRACE)
            .with_filter("codepilot=trace")
    } else if debug {
        TelemetryConfig::development().with_filter("codepilot=debug")
    } else {
        TelemetryConfig::production()
    };
    init_telemetry(&telemetry)
}
