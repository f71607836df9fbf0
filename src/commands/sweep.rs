//! Sweep CLI command: backtest a grid of window pairs in parallel

use crate::backtest::{load_config, validate_symbol};
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use crossover_backtest::{BacktestConfig, BacktestEngine, BacktestResult, DataLoader};
use crossover_core::PricePoint;
use crossover_strategies::MovingAverageCrossover;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

#[derive(Debug, Args)]
pub struct SweepArgs {
    /// CSV or JSON file of daily closing prices
    #[arg(long)]
    pub prices: PathBuf,

    /// Ticker symbol the prices belong to
    #[arg(long, short)]
    pub symbol: String,

    /// Short windows to try, e.g. `5..=50`
    #[arg(long)]
    pub short_range: WindowRange,

    /// Long windows to try, e.g. `50..=200`
    #[arg(long)]
    pub long_range: WindowRange,

    /// Step between consecutive windows in both ranges
    #[arg(long, default_value_t = 1)]
    pub step: usize,

    /// Maximum number of backtests running at once
    #[arg(long, short, default_value_t = 4)]
    pub workers: usize,

    /// Only show the best N parameter pairs
    #[arg(long)]
    pub top: Option<usize>,

    /// Initial capital, overrides the config file
    #[arg(long)]
    pub capital: Option<Decimal>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: SweepFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SweepFormat {
    Table,
    Json,
    Csv,
}

/// Inclusive window range parsed from `a..=b`, `a..b` or a single `n`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRange {
    pub start: usize,
    pub end: usize,
}

impl FromStr for WindowRange {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parse = |v: &str| {
            v.trim()
                .parse::<usize>()
                .map_err(|e| format!("Invalid window '{}': {}", v.trim(), e))
        };

        let (start, end) = if let Some((a, b)) = s.split_once("..=") {
            (parse(a)?, parse(b)?)
        } else if let Some((a, b)) = s.split_once("..") {
            let end = parse(b)?;
            if end == 0 {
                return Err(format!("Empty window range: {}", s));
            }
            (parse(a)?, end - 1)
        } else {
            let n = parse(s)?;
            (n, n)
        };

        if start == 0 {
            return Err("Windows must be at least 1".to_string());
        }
        if start > end {
            return Err(format!("Empty window range: {}", s));
        }
        Ok(Self { start, end })
    }
}

impl WindowRange {
    fn values(&self, step: usize) -> impl Iterator<Item = usize> {
        (self.start..=self.end).step_by(step.max(1))
    }
}

/// One row of sweep output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepRow {
    pub short_window: usize,
    pub long_window: usize,
    pub total_return_pct: Decimal,
    pub final_value: Decimal,
    pub max_drawdown_pct: Decimal,
    pub number_of_trades: usize,
}

impl SweepRow {
    fn new(short_window: usize, long_window: usize, result: &BacktestResult) -> Self {
        Self {
            short_window,
            long_window,
            total_return_pct: result.total_return_pct,
            final_value: result.final_value,
            max_drawdown_pct: result.max_drawdown_pct,
            number_of_trades: result.number_of_trades,
        }
    }
}

/// Window pairs with `short < long`
pub fn window_pairs(short: &WindowRange, long: &WindowRange, step: usize) -> Vec<(usize, usize)> {
    short
        .values(step)
        .flat_map(|s| long.values(step).filter(move |l| s < *l).map(move |l| (s, l)))
        .collect()
}

/// Best return first; ties broken by the smaller windows
pub fn rank_rows(rows: &mut [SweepRow]) {
    rows.sort_by(|a, b| {
        b.total_return_pct
            .cmp(&a.total_return_pct)
            .then(a.short_window.cmp(&b.short_window))
            .then(a.long_window.cmp(&b.long_window))
    });
}

/// Run one backtest per window pair on the blocking pool, at most `workers` at a time
pub async fn run_grid(
    symbol: &str,
    prices: Arc<Vec<PricePoint>>,
    base: &BacktestConfig,
    pairs: &[(usize, usize)],
    workers: usize,
) -> Result<Vec<SweepRow>> {
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks = JoinSet::new();

    for &(short_window, long_window) in pairs {
        let permit = semaphore.clone().acquire_owned().await?;
        let prices = prices.clone();
        let symbol = symbol.to_string();
        let config = BacktestConfig {
            short_window,
            long_window,
            ..base.clone()
        };

        tasks.spawn_blocking(move || {
            let _permit = permit;
            let result = BacktestEngine::new(config).run(
                &symbol,
                &prices,
                &MovingAverageCrossover::new(),
            );
            (short_window, long_window, result)
        });
    }

    let mut rows = Vec::with_capacity(pairs.len());
    while let Some(joined) = tasks.join_next().await {
        let (short_window, long_window, result) = joined.context("Backtest task panicked")?;
        match result {
            Ok(report) => rows.push(SweepRow::new(short_window, long_window, &report.result)),
            Err(e) => warn!(
                short_window,
                long_window,
                error = %e,
                "Backtest failed for window pair"
            ),
        }
    }

    rank_rows(&mut rows);
    Ok(rows)
}

pub async fn run_sweep(args: &SweepArgs, config_path: Option<&Path>) -> Result<()> {
    let symbol = validate_symbol(&args.symbol)?;
    let mut base = load_config(config_path)?;
    if let Some(capital) = args.capital {
        base.initial_capital = capital;
    }

    let pairs = window_pairs(&args.short_range, &args.long_range, args.step);
    if pairs.is_empty() {
        anyhow::bail!("No window pairs with short < long in the given ranges");
    }

    let prices = DataLoader::load_prices(&args.prices)
        .with_context(|| format!("Failed to load prices: {}", args.prices.display()))?;

    info!(
        symbol = %symbol,
        pairs = pairs.len(),
        workers = args.workers,
        "Starting parameter sweep"
    );

    let mut rows = run_grid(&symbol, Arc::new(prices), &base, &pairs, args.workers).await?;
    if let Some(top) = args.top {
        rows.truncate(top);
    }

    match args.format {
        SweepFormat::Table => output_table(&symbol, &rows),
        SweepFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        SweepFormat::Csv => output_csv(&rows)?,
    }

    Ok(())
}

fn output_table(symbol: &str, rows: &[SweepRow]) {
    println!();
    println!("Parameter Sweep ({})", symbol);
    println!();

    if rows.is_empty() {
        println!("No backtests completed.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Short").add_attribute(Attribute::Bold),
            Cell::new("Long").add_attribute(Attribute::Bold),
            Cell::new("Return").add_attribute(Attribute::Bold),
            Cell::new("Final Value").add_attribute(Attribute::Bold),
            Cell::new("Max DD").add_attribute(Attribute::Bold),
            Cell::new("Trades").add_attribute(Attribute::Bold),
        ]);

    for row in rows {
        let return_color = if row.total_return_pct >= Decimal::ZERO {
            Color::Green
        } else {
            Color::Red
        };

        table.add_row(vec![
            Cell::new(row.short_window),
            Cell::new(row.long_window),
            Cell::new(format!("{:.2}%", row.total_return_pct)).fg(return_color),
            Cell::new(format!("{:.2}", row.final_value)),
            Cell::new(format!("{:.2}%", row.max_drawdown_pct)),
            Cell::new(row.number_of_trades),
        ]);
    }

    println!("{table}");
    println!();
}

fn output_csv(rows: &[SweepRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(std::io::stdout());

    wtr.write_record([
        "short_window",
        "long_window",
        "total_return_pct",
        "final_value",
        "max_drawdown_pct",
        "number_of_trades",
    ])?;

    for row in rows {
        wtr.write_record([
            &row.short_window.to_string(),
            &row.long_window.to_string(),
            &row.total_return_pct.to_string(),
            &row.final_value.to_string(),
            &row.max_drawdown_pct.to_string(),
            &row.number_of_trades.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
