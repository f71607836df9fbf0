//! Backtest results and end-of-series metrics

use crate::error::{BacktestError, Result};
use chrono::NaiveDate;
use crossover_core::{Position, PositionState, PreparedPoint, Trade, TradeKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Summary of one backtest run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub symbol: String,
    pub initial_investment: Decimal,
    /// Return on the initial investment, in percent
    pub total_return_pct: Decimal,
    /// Cash after the final liquidation
    pub final_value: Decimal,
    /// Largest peak-to-trough decline seen, in percent
    pub max_drawdown_pct: Decimal,
    pub number_of_trades: usize,
}

/// Portfolio value after processing one prepared point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub close: Decimal,
    pub portfolio_value: Decimal,
    pub peak_value: Decimal,
    pub drawdown_pct: Decimal,
}

/// Simulator state handed to the finalizer
#[derive(Debug, Clone)]
pub struct SimulationTrace {
    pub position: Position,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub max_drawdown_pct: Decimal,
}

/// Full output of a backtest: summary, trade log, and equity curve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub result: BacktestResult,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl BacktestReport {
    /// Close any open position at the last prepared close and derive metrics.
    ///
    /// The closing sale is unconditional. It is recorded in the trade log with
    /// `forced` set but is not counted in `number_of_trades`, so a run that
    /// ends holding reports an odd count.
    pub fn from_simulation(
        symbol: String,
        initial_investment: Decimal,
        trace: SimulationTrace,
        last_point: Option<&PreparedPoint>,
    ) -> Result<Self> {
        let SimulationTrace {
            mut position,
            mut trades,
            equity_curve,
            max_drawdown_pct,
        } = trace;

        if let (PositionState::Holding, Some(last)) = (position.state(), last_point) {
            position
                .sell_all(last.close)
                .map_err(BacktestError::overflow_on(last.date))?;
            debug!(
                date = %last.date,
                price = %last.close,
                cash = %position.cash,
                "Liquidated open position at end of series"
            );
            trades.push(Trade {
                date: last.date,
                kind: TradeKind::Sell,
                price: last.close,
                resulting_position: position,
                forced: true,
            });
        }

        let final_value = position.cash;
        let total_return_pct = return_pct(initial_investment, final_value).ok_or(
            BacktestError::ReturnOutOfRange {
                initial_investment,
                final_value,
            },
        )?;

        let result = BacktestResult {
            symbol,
            initial_investment,
            total_return_pct,
            final_value,
            max_drawdown_pct,
            number_of_trades: trades.iter().filter(|t| !t.forced).count(),
        };

        Ok(Self {
            result,
            trades,
            equity_curve,
        })
    }

    /// Export the report to a JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Export the trade log as CSV
    pub fn trades_to_csv(&self) -> String {
        let mut csv = String::from("date,side,price,cash,shares,forced\n");
        for trade in &self.trades {
            csv.push_str(&format!(
                "{},{},{},{},{},{}\n",
                trade.date,
                trade.kind,
                trade.price,
                trade.resulting_position.cash,
                trade.resulting_position.shares,
                trade.forced,
            ));
        }
        csv
    }
}

/// Percentage gain of `final_value` over `initial`
fn return_pct(initial: Decimal, final_value: Decimal) -> Option<Decimal> {
    if initial.is_zero() {
        return Some(Decimal::ZERO);
    }
    final_value
        .checked_sub(initial)?
        .checked_div(initial)?
        .checked_mul(Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn trace(position: Position, trades: Vec<Trade>) -> SimulationTrace {
        SimulationTrace {
            position,
            trades,
            equity_curve: Vec::new(),
            max_drawdown_pct: dec!(12.5),
        }
    }

    fn last_point(close: Decimal) -> PreparedPoint {
        PreparedPoint {
            date: date(9),
            close,
            short_avg: close,
            long_avg: close,
        }
    }

    #[test]
    fn test_flat_position_is_not_liquidated() {
        let report = BacktestReport::from_simulation(
            "AAPL".to_string(),
            dec!(1000),
            trace(Position::flat(dec!(1100)), Vec::new()),
            Some(&last_point(dec!(50))),
        )
        .unwrap();

        assert!(report.trades.is_empty());
        assert_eq!(report.result.final_value, dec!(1100));
        assert_eq!(report.result.total_return_pct, dec!(10));
        assert_eq!(report.result.max_drawdown_pct, dec!(12.5));
    }

    #[test]
    fn test_holding_position_is_force_sold() {
        let holding = Position {
            cash: Decimal::ZERO,
            shares: dec!(20),
        };
        let buy = Trade {
            date: date(4),
            kind: TradeKind::Buy,
            price: dec!(50),
            resulting_position: holding,
            forced: false,
        };

        let report = BacktestReport::from_simulation(
            "AAPL".to_string(),
            dec!(1000),
            trace(holding, vec![buy]),
            Some(&last_point(dec!(45))),
        )
        .unwrap();

        assert_eq!(report.trades.len(), 2);
        assert_eq!(report.result.number_of_trades, 1);
        assert_eq!(report.result.final_value, dec!(900));
        assert_eq!(report.result.total_return_pct, dec!(-10));

        let sell = report.trades.last().unwrap();
        assert!(sell.forced);
        assert_eq!(sell.kind, TradeKind::Sell);
        assert_eq!(sell.date, date(9));
        assert_eq!(sell.resulting_position, Position::flat(dec!(900)));
    }

    #[test]
    fn test_trades_to_csv() {
        let report = BacktestReport::from_simulation(
            "MSFT".to_string(),
            dec!(100),
            trace(
                Position {
                    cash: Decimal::ZERO,
                    shares: dec!(2),
                },
                Vec::new(),
            ),
            Some(&last_point(dec!(60))),
        )
        .unwrap();

        let csv = report.trades_to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "date,side,price,cash,shares,forced");
        assert_eq!(lines[1], "2024-03-09,SELL,60,120,0,true");
    }

    #[test]
    fn test_json_export_keeps_decimal_precision() {
        let report = BacktestReport::from_simulation(
            "IBM".to_string(),
            dec!(3),
            trace(Position::flat(dec!(4)), Vec::new()),
            None,
        )
        .unwrap();

        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["result"]["symbol"], "IBM");
        assert_eq!(value["result"]["final_value"], "4");
        assert!(value["result"]["total_return_pct"]
            .as_str()
            .unwrap()
            .starts_with("33.3333333333"));
    }

    #[test]
    fn test_liquidation_overflow_is_error() {
        let holding = Position {
            cash: Decimal::ZERO,
            shares: Decimal::MAX,
        };

        let err = BacktestReport::from_simulation(
            "BIG".to_string(),
            dec!(1000),
            trace(holding, Vec::new()),
            Some(&last_point(dec!(2))),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            BacktestError::ArithmeticOverflow { operation: "share sale", .. }
        ));
    }

    #[test]
    fn test_unrepresentable_return_is_error() {
        let err = BacktestReport::from_simulation(
            "TINY".to_string(),
            dec!(0.0000000000000000000000000001),
            trace(Position::flat(dec!(10000000000)), Vec::new()),
            None,
        )
        .unwrap_err();

        assert!(matches!(err, BacktestError::ReturnOutOfRange { .. }));
    }
}
