use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use netwatch_config::{ConfigError, NetwatchConfig};
use netwatch_engine::AgentRuntime;

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the agent (live capture, aggregation, export)
    Run(RunArgs),
    /// Load and validate configuration, then print the resolved values
    CheckConfig(CheckConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Configuration file; when omitted, the config/ hierarchy and
    /// NETWATCH_* environment variables apply
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Interface to monitor, overriding the configured one
    #[arg(short, long)]
    pub interface: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct CheckConfigArgs {
    /// Configuration file to check
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

pub async fn run_agent(args: RunArgs) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(interface) = args.interface {
        config.agent.interface = interface;
        config.ensure_valid()?;
    }

    let runtime = Arc::new(AgentRuntime::new(config)?);
    runtime.run().await?;
    Ok(())
}

pub async fn check_config(
    args: CheckConfigArgs,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = load_config(args.config.as_deref())?;
    info!("Configuration valid");
    println!("{config:#?}");
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<NetwatchConfig, ConfigError> {
    match path {
        Some(path) => NetwatchConfig::load_from_path(path),
        None => NetwatchConfig::load(),
    }
}
