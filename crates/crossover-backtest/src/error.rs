//! Backtest error types

use chrono::NaiveDate;
use crossover_core::{DecimalOverflow, ParameterError};
use thiserror::Error;

/// Backtest result type alias
pub type Result<T> = std::result::Result<T, BacktestError>;

/// Backtest errors
#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("No price data available")]
    NoData,

    #[error("Invalid parameters: {0}")]
    InvalidParameters(#[from] ParameterError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Duplicate price date: {0}")]
    DuplicateDate(NaiveDate),

    #[error("Non-positive close {close} on {date}")]
    InvalidPrice {
        date: NaiveDate,
        close: rust_decimal::Decimal,
    },

    #[error("No dates shared between predictions and prices")]
    NoOverlap,

    #[error("Decimal overflow in {operation} on {date}")]
    ArithmeticOverflow {
        date: NaiveDate,
        operation: &'static str,
    },

    #[error("Return on {initial_investment} ending at {final_value} is out of range")]
    ReturnOutOfRange {
        initial_investment: rust_decimal::Decimal,
        final_value: rust_decimal::Decimal,
    },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for BacktestError {
    fn from(err: serde_json::Error) -> Self {
        BacktestError::SerializationError(err.to_string())
    }
}

impl From<csv::Error> for BacktestError {
    fn from(err: csv::Error) -> Self {
        BacktestError::ParseError(err.to_string())
    }
}

impl From<toml::de::Error> for BacktestError {
    fn from(err: toml::de::Error) -> Self {
        BacktestError::ConfigError(err.to_string())
    }
}

impl BacktestError {
    /// Attach the date being processed to a decimal overflow
    pub fn overflow_on(date: NaiveDate) -> impl FnOnce(DecimalOverflow) -> Self {
        move |err| BacktestError::ArithmeticOverflow {
            date,
            operation: err.operation,
        }
    }
}
