//! ## netwatch-cli
//! **Agent entrypoint**
//! Live packet capture, rolling traffic aggregation, and export to the
//! collector and message bus.
//!
//! ### Expectations:
//! - POSIX-compliant argument parsing
//! - Configuration from files and `NETWATCH_*` environment variables
//! - Structured logs on stderr, `RUST_LOG` controlled

use clap::Parser;
use netwatch_telemetry::logging::EventLogger;

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    EventLogger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => commands::run_agent(args).await,
        Commands::CheckConfig(args) => commands::check_config(args).await,
    }
}
