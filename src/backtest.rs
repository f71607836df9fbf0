//! Backtest CLI command implementation

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use crossover_backtest::{BacktestConfig, BacktestEngine, BacktestReport, DataLoader};
use crossover_core::Strategy;
use crossover_strategies::MovingAverageCrossover;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tracing::info;

/// Configuration file path used when neither `--config` nor the env var is set
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Environment variable naming an alternate config file
pub const CONFIG_ENV_VAR: &str = "CROSSOVER_CONFIG";

/// Longest ticker symbol accepted
pub const MAX_SYMBOL_LEN: usize = 10;

#[derive(Debug, Args)]
pub struct BacktestArgs {
    /// CSV or JSON file of daily closing prices
    #[arg(long)]
    pub prices: PathBuf,

    /// Ticker symbol the prices belong to
    #[arg(long, short)]
    pub symbol: String,

    /// Initial capital, overrides the config file
    #[arg(long)]
    pub capital: Option<Decimal>,

    /// Short moving average window in days
    #[arg(long)]
    pub short: Option<usize>,

    /// Long moving average window in days
    #[arg(long)]
    pub long: Option<usize>,

    /// Output format
    #[arg(long, short, default_value = "text")]
    pub format: ReportFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
}

impl BacktestArgs {
    /// Apply CLI flags on top of file config
    pub fn apply_overrides(&self, mut config: BacktestConfig) -> BacktestConfig {
        if let Some(capital) = self.capital {
            config.initial_capital = capital;
        }
        if let Some(short) = self.short {
            config.short_window = short;
        }
        if let Some(long) = self.long {
            config.long_window = long;
        }
        config
    }
}

/// Load the backtest config.
///
/// An explicit path (flag or env var) must exist. The default path is
/// optional and falls back to built-in defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<BacktestConfig> {
    let explicit = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));

    match explicit {
        Some(path) => BacktestConfig::from_toml_file(&path)
            .with_context(|| format!("Failed to load config file: {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            BacktestConfig::from_toml_file(DEFAULT_CONFIG_PATH)
                .with_context(|| format!("Failed to load config file: {}", DEFAULT_CONFIG_PATH))
        }
        None => {
            info!("Config file not found, using defaults");
            Ok(BacktestConfig::default())
        }
    }
}

/// Trim and check a ticker symbol
pub fn validate_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        anyhow::bail!("Symbol must not be empty");
    }
    if symbol.chars().count() > MAX_SYMBOL_LEN {
        anyhow::bail!(
            "Symbol '{}' is longer than {} characters",
            symbol,
            MAX_SYMBOL_LEN
        );
    }
    Ok(symbol.to_string())
}

/// Run a single backtest with the specified parameters
pub fn run_backtest(args: &BacktestArgs, config_path: Option<&Path>) -> Result<()> {
    let symbol = validate_symbol(&args.symbol)?;
    let config = args.apply_overrides(load_config(config_path)?);

    info!(
        symbol = %symbol,
        prices = %args.prices.display(),
        "Starting backtest"
    );

    let prices = DataLoader::load_prices(&args.prices)
        .with_context(|| format!("Failed to load prices: {}", args.prices.display()))?;

    let strategy = MovingAverageCrossover::new();
    let engine = BacktestEngine::new(config);
    let report = engine.run(&symbol, &prices, &strategy)?;

    match args.format {
        ReportFormat::Json => println!("{}", report.to_json()?),
        ReportFormat::Csv => print!("{}", report.trades_to_csv()),
        ReportFormat::Text => print_results_text(&report, engine.config(), &strategy),
    }

    Ok(())
}

fn print_results_text(report: &BacktestReport, config: &BacktestConfig, strategy: &dyn Strategy) {
    let result = &report.result;
    let period = match (report.equity_curve.first(), report.equity_curve.last()) {
        (Some(first), Some(last)) => format!("{} to {}", first.date, last.date),
        _ => "not enough history".to_string(),
    };

    println!("\n╔════════════════════════════════════════════════════════════════╗");
    println!("║                    BACKTEST RESULTS                            ║");
    println!("╠════════════════════════════════════════════════════════════════╣");
    println!("║ Symbol:           {:<44} ║", result.symbol);
    println!("║ Strategy:         {:<44} ║", strategy.name());
    println!(
        "║ Windows:          {:<44} ║",
        format!("{} / {} days", config.short_window, config.long_window)
    );
    println!("║ Traded Period:    {:<44} ║", period);
    println!("╠════════════════════════════════════════════════════════════════╣");
    println!(
        "║ Initial Capital:  ${:<43} ║",
        format!("{:.2}", result.initial_investment)
    );
    println!(
        "║ Final Value:      ${:<43} ║",
        format!("{:.2}", result.final_value)
    );
    println!(
        "║ Return:           {:<44} ║",
        format!("{:.2}%", result.total_return_pct)
    );
    println!(
        "║ Max Drawdown:     {:<44} ║",
        format!("{:.2}%", result.max_drawdown_pct)
    );
    println!("║ Trade Count:      {:<44} ║", result.number_of_trades);
    println!("╚════════════════════════════════════════════════════════════════╝\n");

    if report.trades.is_empty() {
        println!("No trades were executed.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Date").add_attribute(Attribute::Bold),
            Cell::new("Side").add_attribute(Attribute::Bold),
            Cell::new("Price").add_attribute(Attribute::Bold),
            Cell::new("Cash").add_attribute(Attribute::Bold),
            Cell::new("Shares").add_attribute(Attribute::Bold),
            Cell::new("Note").add_attribute(Attribute::Bold),
        ]);

    for trade in &report.trades {
        let side_color = match trade.kind {
            crossover_core::TradeKind::Buy => Color::Green,
            crossover_core::TradeKind::Sell => Color::Red,
        };
        table.add_row(vec![
            Cell::new(trade.date),
            Cell::new(trade.kind).fg(side_color),
            Cell::new(format!("{:.2}", trade.price)),
            Cell::new(format!("{:.2}", trade.resulting_position.cash)),
            Cell::new(trade.resulting_position.shares),
            Cell::new(if trade.forced { "end of series" } else { "" }),
        ]);
    }

    println!("{table}");
    println!();
}
