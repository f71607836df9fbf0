//! Crossover - Moving Average Crossover Backtester
//!
//! Replays daily closing prices through a moving-average crossover strategy
//! and reports return, drawdown, and trade count.

mod backtest;
mod commands;

use anyhow::Result;
use backtest::BacktestArgs;
use clap::{Parser, Subcommand};
use commands::{AccuracyArgs, SweepArgs};
use crossover_observability::{init_logging, parse_level, LogFormat};
use std::path::PathBuf;
use tracing::Level;

#[derive(Debug, Parser)]
#[command(name = "crossover", version, about = "Moving average crossover backtester")]
struct Cli {
    /// Backtest config file (defaults to $CROSSOVER_CONFIG, then config/default.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one backtest over a price file
    Backtest(BacktestArgs),
    /// Backtest a grid of short/long window pairs
    Sweep(SweepArgs),
    /// Compare predicted prices with actual closes
    Accuracy(AccuracyArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let log_format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|f| f.parse::<LogFormat>().ok())
        .unwrap_or_default();

    let log_level = std::env::var("LOG_LEVEL")
        .map(|l| parse_level(&l))
        .unwrap_or(Level::INFO);

    init_logging(log_format, log_level)?;

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match &cli.command {
        Command::Backtest(args) => backtest::run_backtest(args, config),
        Command::Sweep(args) => commands::run_sweep(args, config).await,
        Command::Accuracy(args) => commands::run_accuracy(args),
    }
}
