//! Plume CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Write a starter config file
//! - `serve`   — Start the HTTP gateway
//! - `tools`   — List the registered tools
//! - `doctor`  — Diagnose configuration problems

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "plume",
    about = "Plume — conversational agent service",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Turn on debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter config file to ~/.plume/config.toml
    Onboard,

    /// Start the HTTP gateway
    Serve {
        /// Listen on this port instead of the configured one
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List the registered tools
    Tools,

    /// Diagnose configuration problems
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run()?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Tools => commands::tools::run()?,
        Commands::Doctor => commands::doctor::run()?,
    }

    Ok(())
}
