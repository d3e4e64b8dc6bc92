//! Quiver CLI - run and manage Python helper scripts.
//!
//! Discovers scripts in the configured directories, screens them for
//! dangerous operations and runs them with live output.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use quiver_config::{Config, ResolvedConfig};

mod commands;
mod theme;

use commands::{Session, check, config, init, list, run, show, watch};
use theme::Theme;

/// Quiver - Python helper script manager
#[derive(Parser)]
#[command(name = "quiver")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Script directory (repeatable, replaces the configured directories)
    #[arg(short, long = "dir", global = true, value_name = "PATH")]
    dirs: Vec<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List discovered scripts
    List {
        /// Only show scripts offered on the toolbar
        #[arg(long)]
        toolbar: bool,
    },

    /// Show details for one script
    Show {
        /// Path to the script
        path: PathBuf,
    },

    /// Screen one script, or every script, for dangerous operations
    Check {
        /// Path to the script (all scripts when omitted)
        path: Option<PathBuf>,
    },

    /// Run a script and stream its output
    Run {
        /// Path to the script
        path: PathBuf,

        /// Acknowledge flagged operations without prompting
        #[arg(short, long)]
        yes: bool,
    },

    /// Watch the script directories and report changes
    Watch,

    /// Write the example script into a directory with no scripts
    Init {
        /// Target directory (defaults to the first script directory)
        dir: Option<PathBuf>,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show resolved configuration
    Show {
        /// Output format (toml or json)
        #[arg(short, long, default_value = "toml")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let workspace_root = std::env::current_dir()?;
    let loaded = Config::load(Some(workspace_root.as_path()));

    // Set up logging from config, with --verbose override.
    let log_config = match loaded
        .as_ref()
        .ok()
        .map(|r| quiver_telemetry::LogConfig::try_from(&r.config.logging))
    {
        Some(Ok(mut lc)) => {
            if cli.verbose {
                "debug".clone_into(&mut lc.level);
            }
            lc
        },
        _ => {
            // Fallback if config loading fails.
            let level = if cli.verbose { "debug" } else { "warn" };
            quiver_telemetry::LogConfig::new(level)
                .with_format(quiver_telemetry::LogFormat::Compact)
        },
    };
    if let Err(e) = quiver_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    if let Some(Commands::Config { command }) = cli.command {
        return handle_config(command, loaded).map(|()| ExitCode::SUCCESS);
    }

    let config = match loaded {
        Ok(resolved) => resolved.config,
        Err(e) => {
            eprintln!(
                "{}",
                Theme::warning(&format!("Ignoring invalid configuration: {e}"))
            );
            Config::default()
        },
    };
    let session = Session::open(&config, &cli.dirs, &workspace_root).await?;

    match cli.command {
        Some(Commands::List { toolbar }) => list::list_scripts(&session, toolbar).await?,
        Some(Commands::Show { path }) => show::show_script(&session, &path).await?,
        Some(Commands::Check { path }) => {
            return check::check_scripts(&session, path.as_deref()).await;
        },
        Some(Commands::Run { path, yes }) => {
            return run::run_script(&session, &path, yes).await;
        },
        Some(Commands::Watch) => watch::watch_scripts(&session).await?,
        Some(Commands::Init { dir }) => init::init_example(&session, dir.as_deref()).await?,
        Some(Commands::Config { .. }) => {},
        None => list::list_scripts(&session, false).await?,
    }

    Ok(ExitCode::SUCCESS)
}

fn handle_config(
    command: ConfigCommands,
    loaded: quiver_config::ConfigResult<ResolvedConfig>,
) -> Result<()> {
    match command {
        ConfigCommands::Show { format } => config::show_config(&loaded?, &format),
    }
}
