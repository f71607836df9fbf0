//! CLI subcommands beyond a single backtest

pub mod accuracy;
pub mod sweep;

pub use accuracy::{run_accuracy, AccuracyArgs};
pub use sweep::{run_sweep, SweepArgs};
