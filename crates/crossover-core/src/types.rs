//! Domain types for price series, positions, and trades

use crate::error::{DecimalOverflow, ParameterError};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Largest fractional digit count a `Decimal` can carry
pub const MAX_SHARE_SCALE: u32 = 28;

/// One daily closing price for a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: Decimal,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: Decimal) -> Self {
        Self { date, close }
    }
}

/// A price point with both trailing averages defined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedPoint {
    pub date: NaiveDate,
    pub close: Decimal,
    /// Trailing mean over the short window
    pub short_avg: Decimal,
    /// Trailing mean over the long window
    pub long_avg: Decimal,
}

/// Parameters for a single crossover backtest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyParameters {
    /// Starting cash, must be positive
    pub initial_cash: Decimal,
    /// Short moving average window in trading days
    pub short_window: usize,
    /// Long moving average window in trading days
    pub long_window: usize,
}

impl StrategyParameters {
    pub fn new(initial_cash: Decimal, short_window: usize, long_window: usize) -> Self {
        Self {
            initial_cash,
            short_window,
            long_window,
        }
    }

    /// Reject parameters the engine cannot produce a meaningful result for.
    ///
    /// Window ordering is not checked here; see [`Self::has_conventional_order`].
    pub fn validate(&self) -> Result<(), ParameterError> {
        if self.initial_cash <= Decimal::ZERO {
            return Err(ParameterError::NonPositiveInvestment(self.initial_cash));
        }
        if self.short_window == 0 {
            return Err(ParameterError::ZeroWindow { name: "short" });
        }
        if self.long_window == 0 {
            return Err(ParameterError::ZeroWindow { name: "long" });
        }
        Ok(())
    }

    /// Whether the short window is strictly shorter than the long window
    pub fn has_conventional_order(&self) -> bool {
        self.short_window < self.long_window
    }

    /// Number of leading points consumed before both averages exist
    pub fn warmup(&self) -> usize {
        self.short_window.max(self.long_window)
    }
}

/// Whether the portfolio currently holds shares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionState {
    /// Fully in cash
    Idle,
    /// Fully invested
    Holding,
}

impl std::fmt::Display for PositionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionState::Idle => write!(f, "Idle"),
            PositionState::Holding => write!(f, "Holding"),
        }
    }
}

/// All-in/all-out portfolio: either `shares` or `cash` is zero at all times
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub cash: Decimal,
    pub shares: Decimal,
}

impl Position {
    /// A flat position holding only cash
    pub fn flat(cash: Decimal) -> Self {
        Self {
            cash,
            shares: Decimal::ZERO,
        }
    }

    pub fn state(&self) -> PositionState {
        if self.shares > Decimal::ZERO {
            PositionState::Holding
        } else {
            PositionState::Idle
        }
    }

    /// Mark-to-market value at `price`
    pub fn value_at(&self, price: Decimal) -> Result<Decimal, DecimalOverflow> {
        self.shares
            .checked_mul(price)
            .and_then(|held| held.checked_add(self.cash))
            .ok_or(DecimalOverflow {
                operation: "portfolio value",
            })
    }

    /// Convert all cash to shares at `price`.
    ///
    /// Share quantity is truncated toward zero at `share_scale` fractional
    /// digits, so the purchase never costs more than the cash on hand.
    /// Returns false and leaves the position untouched when the price is not
    /// positive or the cash buys less than one unit at that scale. A share
    /// count too large for `Decimal` is an error.
    pub fn buy_all(
        &mut self,
        price: Decimal,
        share_scale: u32,
    ) -> Result<bool, DecimalOverflow> {
        if price <= Decimal::ZERO {
            return Ok(false);
        }
        let shares = self
            .cash
            .checked_div(price)
            .ok_or(DecimalOverflow {
                operation: "share purchase",
            })?
            .round_dp_with_strategy(share_scale, RoundingStrategy::ToZero);
        if shares.is_zero() {
            return Ok(false);
        }
        self.shares = shares;
        self.cash = Decimal::ZERO;
        Ok(true)
    }

    /// Convert all shares to cash at `price`.
    ///
    /// Leaves the position untouched on overflow.
    pub fn sell_all(&mut self, price: Decimal) -> Result<(), DecimalOverflow> {
        self.cash = self.shares.checked_mul(price).ok_or(DecimalOverflow {
            operation: "share sale",
        })?;
        self.shares = Decimal::ZERO;
        Ok(())
    }
}

/// Direction of an executed trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeKind {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeKind::Buy => write!(f, "BUY"),
            TradeKind::Sell => write!(f, "SELL"),
        }
    }
}

/// A state transition executed by the simulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub date: NaiveDate,
    pub kind: TradeKind,
    /// Execution price (the day's close)
    pub price: Decimal,
    /// Position immediately after the trade
    pub resulting_position: Position,
    /// True for the unconditional end-of-series liquidation
    #[serde(default)]
    pub forced: bool,
}

/// Decision returned by a strategy for one prepared point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}
