//! Pairwise CLI
//!
//! Plans the assignment list of one participant, or simulates a whole run
//! and checks that every participant's plan agrees with its partners'.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{
    plan::{handle_plan_command, PlanCommand},
    simulate::{handle_simulate_command, SimulateCommand},
};

#[derive(Parser)]
#[command(name = "pairwise")]
#[command(about = "Pairwise - seed-synchronized partner assignment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path (.toml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the assignment list of one participant as JSON
    Plan(PlanCommand),
    /// Generate every participant's plan and cross-check them
    Simulate(SimulateCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Plan(cmd) => handle_plan_command(&cmd, cli.config.as_deref())?,
        Commands::Simulate(cmd) => handle_simulate_command(&cmd, cli.config.as_deref())?,
    }

    Ok(())
}
