//! Machina - stdio bridge to a hosted language model

use clap::{Parser, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use machina_agent::AgentError;

mod commands;

use commands::{daemon_command, load_config, single_command, Overrides};

/// Protocol spoken over stdin/stdout
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Read all of stdin, answer once, exit
    Single,
    /// Answer one JSON array per line until end of input
    Daemon,
}

/// Machina - answers JSON message lists with a language model
#[derive(Parser)]
#[command(name = "machina")]
#[command(about = "Answer JSON message lists read from stdin with a hosted language model")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Provider API key
    #[arg(long, env = "PROVIDER_API_KEY", hide_env_values = true)]
    provider_api_key: Option<String>,

    /// GitHub token for the prompt repository
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Protocol mode
    #[arg(long, value_enum, default_value_t = Mode::Single)]
    mode: Mode,

    /// Config file (default ~/.machina/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Local prompt document used when GitHub is unreachable
    #[arg(long, env = "MACHINA_PROMPT_FILE")]
    local_prompt: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Diagnostics go to stderr; stdout carries responses only
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

/// Exit status for a failed run
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<AgentError>() {
        Some(e) => e.exit_code() as u8,
        None => 2,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let overrides = Overrides {
        config: cli.config,
        provider_api_key: cli.provider_api_key,
        github_token: cli.github_token,
        local_prompt: cli.local_prompt,
    };

    let config = match load_config(overrides).await {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration failed: {:#}", e);
            return ExitCode::from(2);
        }
    };

    let result = match cli.mode {
        Mode::Single => single_command(&config).await,
        Mode::Daemon => {
            tokio::select! {
                result = daemon_command(&config) => result,
                _ = tokio::signal::ctrl_c() => {
                    // Runtime shutdown would wait on the pending stdin read
                    info!("interrupted, shutting down");
                    std::process::exit(0)
                }
            }
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}
