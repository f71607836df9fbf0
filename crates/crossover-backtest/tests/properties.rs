//! Property tests for the crossover backtest engine

use chrono::{Duration, NaiveDate};
use crossover_backtest::{run_backtest, BacktestConfig, BacktestEngine};
use crossover_core::{PricePoint, TradeKind};
use crossover_strategies::MovingAverageCrossover;
use proptest::prelude::*;
use rust_decimal::Decimal;

fn series(cents: &[u32]) -> Vec<PricePoint> {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    cents
        .iter()
        .enumerate()
        .map(|(i, c)| PricePoint::new(start + Duration::days(i as i64), Decimal::new(*c as i64, 2)))
        .collect()
}

fn engine(short_window: usize, long_window: usize) -> BacktestEngine {
    BacktestEngine::new(BacktestConfig {
        initial_capital: Decimal::new(10_000, 0),
        short_window,
        long_window,
        ..Default::default()
    })
}

prop_compose! {
    fn price_cents()(cents in prop::collection::vec(100u32..50_000, 1..120)) -> Vec<u32> {
        cents
    }
}

proptest! {
    #[test]
    fn identical_inputs_give_identical_results(
        cents in price_cents(),
        short_window in 1usize..15,
        long_window in 1usize..30,
    ) {
        let prices = series(&cents);
        let first = run_backtest("P1", &prices, Decimal::new(10_000, 0), short_window, long_window)
            .unwrap();
        let second = run_backtest("P1", &prices, Decimal::new(10_000, 0), short_window, long_window)
            .unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn positions_are_all_in_or_all_out(
        cents in price_cents(),
        short_window in 1usize..15,
        long_window in 1usize..30,
    ) {
        let report = engine(short_window, long_window)
            .run("P2", &series(&cents), &MovingAverageCrossover::new())
            .unwrap();

        for point in &report.equity_curve {
            prop_assert!(point.portfolio_value >= Decimal::ZERO);
        }
        for trade in &report.trades {
            match trade.kind {
                TradeKind::Buy => prop_assert!(trade.resulting_position.cash.is_zero()),
                TradeKind::Sell => prop_assert!(trade.resulting_position.shares.is_zero()),
            }
        }
    }

    #[test]
    fn drawdown_is_never_negative(
        cents in price_cents(),
        short_window in 1usize..15,
        long_window in 1usize..30,
    ) {
        let report = engine(short_window, long_window)
            .run("P3", &series(&cents), &MovingAverageCrossover::new())
            .unwrap();

        prop_assert!(report.result.max_drawdown_pct >= Decimal::ZERO);
        for point in &report.equity_curve {
            prop_assert!(point.drawdown_pct >= Decimal::ZERO);
            prop_assert!(point.drawdown_pct <= report.result.max_drawdown_pct);
        }
    }

    #[test]
    fn trades_alternate_starting_with_buy(
        cents in price_cents(),
        short_window in 1usize..15,
        long_window in 1usize..30,
    ) {
        let report = engine(short_window, long_window)
            .run("P4", &series(&cents), &MovingAverageCrossover::new())
            .unwrap();

        for (i, trade) in report.trades.iter().enumerate() {
            let expected = if i % 2 == 0 { TradeKind::Buy } else { TradeKind::Sell };
            prop_assert_eq!(trade.kind, expected);
        }
        // Only the last trade can be the forced liquidation
        for trade in report.trades.iter().rev().skip(1) {
            prop_assert!(!trade.forced);
        }
    }

    #[test]
    fn trade_count_parity_matches_final_state(
        cents in price_cents(),
        short_window in 1usize..15,
        long_window in 1usize..30,
    ) {
        let report = engine(short_window, long_window)
            .run("P5", &series(&cents), &MovingAverageCrossover::new())
            .unwrap();

        // A forced sale happens exactly when the simulator ended holding
        let ended_holding = report.trades.last().map_or(false, |t| t.forced);
        prop_assert_eq!(report.result.number_of_trades % 2 == 1, ended_holding);

        let forced = usize::from(ended_holding);
        prop_assert_eq!(report.result.number_of_trades + forced, report.trades.len());
        prop_assert_eq!(report.trades.len() % 2, 0);
    }

    #[test]
    fn rising_prices_have_no_drawdown(
        start in 100u32..1_000,
        steps in prop::collection::vec(0u32..500, 1..80),
        short_window in 1usize..10,
        long_window in 1usize..20,
    ) {
        let mut cents = vec![start];
        for step in steps {
            let next = cents[cents.len() - 1] + step;
            cents.push(next);
        }

        let report = engine(short_window, long_window)
            .run("UP", &series(&cents), &MovingAverageCrossover::new())
            .unwrap();

        // A non-decreasing close never dips below a trailing mean, so the
        // portfolio stays in cash and its value never falls
        prop_assert!(report.trades.is_empty());
        prop_assert_eq!(report.result.max_drawdown_pct, Decimal::ZERO);
    }
}

#[test]
fn equal_windows_still_trade_deterministically() {
    let prices = series(&[1000, 900, 1100, 800, 1200, 700]);
    let first = run_backtest("EQ", &prices, Decimal::new(1000, 0), 2, 2).unwrap();
    let second = run_backtest("EQ", &prices, Decimal::new(1000, 0), 2, 2).unwrap();

    assert_eq!(first, second);
    // Buys at 9, 8, 7 and sells at 11, 12; still holding at the last close
    assert_eq!(first.number_of_trades, 5);
    assert_eq!(first.final_value, second.final_value);
}
