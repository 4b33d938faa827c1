mod display;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};

use kiosk_core::bootstrap::load_config;
use kiosk_core::logging::{self, LogRole};

#[derive(Parser, Debug)]
#[command(name = "kiosk")]
#[command(about = "Kiosk content server and display client", long_about = None)]
struct Args {
    /// Configuration file (YAML, TOML or JSON)
    #[arg(long, short, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve content, media and the change stream
    Serve,
    /// Run a headless display driven by commands on stdin
    Display,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load and validate configuration
    let config = load_config(args.config.as_deref())?;

    // 2. Initialize logging for the selected role
    let role = match args.command {
        Command::Serve => LogRole::Server,
        Command::Display => LogRole::Display,
    };
    logging::init_logging(&config.logging, role)?;

    match args.command {
        Command::Serve => server::run(config).await,
        Command::Display => display::run(config).await,
    }
}
