//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use broterm_core::config::{self, Config};
use broterm_core::{Theme, logging};
use clap::Parser;
use tracing::info;

mod commands;

#[derive(Parser)]
#[command(name = "broterm")]
#[command(version)]
#[command(about = "Terminal client for chatting with your bros")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file to load instead of $BROTERM_HOME/config.toml
    #[arg(long, value_name = "PATH", env = "BROTERM_CONFIG")]
    config: Option<PathBuf>,

    /// Override the theme from config (default, light)
    #[arg(long, value_name = "CODE")]
    theme: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Cli {
        command,
        config: config_path,
        theme,
    } = cli;

    if let Some(command) = command {
        return match command {
            Commands::Config { command } => match command {
                ConfigCommands::Path => {
                    commands::config::path(config_path.as_deref());
                    Ok(())
                }
                ConfigCommands::Init => commands::config::init(config_path.as_deref()),
            },
        };
    }

    let mut config = match config_path.as_deref() {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("load config")?;

    if let Some(code) = theme {
        if Theme::by_code(&code).is_none() {
            let known: Vec<String> = Theme::builtin().into_iter().map(|t| t.code).collect();
            anyhow::bail!("Unknown theme '{code}'. Available: {}", known.join(", "));
        }
        config.theme = code;
    }

    let _log_guard = logging::init(&config.log).context("init logging")?;
    info!(
        config = %config_path.unwrap_or_else(config::paths::config_path).display(),
        theme = %config.theme,
        "starting broterm"
    );

    broterm_tui::run(&config).await
}
