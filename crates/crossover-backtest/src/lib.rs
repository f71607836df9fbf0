//! Crossover Backtest
//!
//! Backtesting engine for the moving-average crossover strategy over daily
//! closing prices.

pub mod accuracy;
pub mod config;
pub mod data_loader;
pub mod engine;
pub mod error;
pub mod results;
pub mod series;

pub use accuracy::PredictionMetrics;
pub use config::BacktestConfig;
pub use data_loader::DataLoader;
pub use engine::{run_backtest, BacktestEngine};
pub use error::{BacktestError, Result};
pub use results::{BacktestReport, BacktestResult, EquityPoint};
pub use series::prepare_series;
