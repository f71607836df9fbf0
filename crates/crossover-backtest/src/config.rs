//! Backtest configuration

use crate::error::Result;
use crossover_core::{ParameterError, StrategyParameters, MAX_SHARE_SCALE};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Configuration for a backtest run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Initial capital
    #[serde(default = "default_initial_capital")]
    pub initial_capital: Decimal,
    /// Short moving average window in trading days
    #[serde(default = "default_short_window")]
    pub short_window: usize,
    /// Long moving average window in trading days
    #[serde(default = "default_long_window")]
    pub long_window: usize,
    /// Fractional digits kept when converting cash to shares
    #[serde(default = "default_share_scale")]
    pub share_scale: u32,
}

fn default_initial_capital() -> Decimal {
    dec!(10000)
}

fn default_short_window() -> usize {
    50
}

fn default_long_window() -> usize {
    200
}

fn default_share_scale() -> u32 {
    8
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: default_initial_capital(),
            short_window: default_short_window(),
            long_window: default_long_window(),
            share_scale: default_share_scale(),
        }
    }
}

impl BacktestConfig {
    /// Build a config from explicit strategy parameters
    pub fn from_parameters(params: StrategyParameters) -> Self {
        Self {
            initial_capital: params.initial_cash,
            short_window: params.short_window,
            long_window: params.long_window,
            ..Default::default()
        }
    }

    /// Load a config from a TOML file. Missing keys take their defaults.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        debug!(path = %path.display(), ?config, "Loaded backtest config");
        Ok(config)
    }

    pub fn parameters(&self) -> StrategyParameters {
        StrategyParameters::new(self.initial_capital, self.short_window, self.long_window)
    }

    /// Validate the strategy parameters and the rounding policy
    pub fn validate(&self) -> std::result::Result<(), ParameterError> {
        self.parameters().validate()?;
        if self.share_scale > MAX_SHARE_SCALE {
            return Err(ParameterError::ShareScaleTooLarge(self.share_scale));
        }
        Ok(())
    }
}
