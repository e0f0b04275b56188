//! seqgen CLI — configure and launch training/evaluation runs for
//! sequential-data generative models.
//!
//! Overrides are positional `key=value` tokens; comma-separated value lists
//! combined with `--multirun` expand into a cartesian-product sweep.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// seqgen: run configuration and launch scaffolding for sequential generative models
#[derive(Parser, Debug)]
#[command(name = "seqgen", version, about, long_about = None)]
struct Cli {
    /// Configuration overrides as key=value tokens (key=v1,v2,... sweeps with --multirun)
    overrides: Vec<String>,

    /// Expand comma-separated override values into a cartesian-product sweep
    #[arg(short, long)]
    multirun: bool,

    /// Output root for run directories
    #[arg(long, default_value = "outputs")]
    root: PathBuf,

    /// Extra configuration file layered above presets
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Workspace directory
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Resolve overrides and print run directories without creating them
    Resolve {
        /// Configuration overrides as key=value tokens
        overrides: Vec<String>,

        /// Expand comma-separated override values into a sweep
        #[arg(short, long)]
        multirun: bool,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Create a default workspace configuration file
    Init,
    /// Show the resolved base configuration
    Show,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // Human-readable layer for stderr (always active)
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(EnvFilter::new(filter));

    // JSON file layer for structured logging
    let log_dir = directories::ProjectDirs::from("dev", "seqgen", "seqgen")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "seqgen.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    // Resolve workspace
    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    if let Some(command) = cli.command {
        return commands::handle_command(command, &workspace, &cli.root, cli.config.as_deref());
    }

    commands::launch(
        &cli.overrides,
        cli.multirun,
        &workspace,
        &cli.root,
        cli.config.as_deref(),
    )
}
