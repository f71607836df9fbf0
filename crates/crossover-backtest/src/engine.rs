//! Backtest engine for simulating a strategy over a daily price series

use crate::config::BacktestConfig;
use crate::error::{BacktestError, Result};
use crate::results::{BacktestReport, BacktestResult, EquityPoint, SimulationTrace};
use crate::series::prepare_series;
use crossover_core::{
    Action, Position, PositionState, PreparedPoint, PricePoint, Strategy, StrategyParameters,
    Trade, TradeKind,
};
use crossover_strategies::MovingAverageCrossover;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

/// Backtest engine that walks a prepared price series through a strategy
#[derive(Debug, Clone)]
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    /// Create a new backtest engine
    pub fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run a backtest for one symbol.
    ///
    /// Parameters are validated before the data is looked at, so a bad config
    /// is reported even for an empty series. An empty series is `NoData`; a
    /// series too short for the long window is a zero-trade result.
    pub fn run(
        &self,
        symbol: &str,
        prices: &[PricePoint],
        strategy: &dyn Strategy,
    ) -> Result<BacktestReport> {
        self.config.validate()?;

        if prices.is_empty() {
            return Err(BacktestError::NoData);
        }

        let params = self.config.parameters();
        if !params.has_conventional_order() {
            warn!(
                symbol = %symbol,
                short_window = params.short_window,
                long_window = params.long_window,
                "Short window is not shorter than long window"
            );
        }

        info!(
            symbol = %symbol,
            strategy_id = %strategy.id(),
            price_count = prices.len(),
            initial_capital = %params.initial_cash,
            short_window = params.short_window,
            long_window = params.long_window,
            "Starting backtest"
        );

        let prepared = prepare_series(prices, params.short_window, params.long_window)?;
        if prepared.is_empty() {
            info!(
                symbol = %symbol,
                price_count = prices.len(),
                required = params.warmup(),
                "Not enough history to fill the long window, no trades possible"
            );
        }

        let mut simulator = Simulator::new(params.initial_cash, self.config.share_scale);
        for point in &prepared {
            let action = strategy.decide(simulator.state(), point);
            simulator.step(point, action)?;
        }

        let report = BacktestReport::from_simulation(
            symbol.to_string(),
            params.initial_cash,
            simulator.finish(),
            prepared.last(),
        )?;

        info!(
            symbol = %symbol,
            total_return_pct = %report.result.total_return_pct,
            final_value = %report.result.final_value,
            max_drawdown_pct = %report.result.max_drawdown_pct,
            trade_count = report.result.number_of_trades,
            "Backtest complete"
        );

        Ok(report)
    }
}

/// Run the moving average crossover backtest and return the summary result
pub fn run_backtest(
    symbol: &str,
    prices: &[PricePoint],
    initial_investment: Decimal,
    short_window: usize,
    long_window: usize,
) -> Result<BacktestResult> {
    let config = BacktestConfig::from_parameters(StrategyParameters::new(
        initial_investment,
        short_window,
        long_window,
    ));
    let report =
        BacktestEngine::new(config).run(symbol, prices, &MovingAverageCrossover::new())?;
    Ok(report.result)
}

/// Idle/Holding state machine with a running peak and drawdown
struct Simulator {
    position: Position,
    share_scale: u32,
    peak_value: Decimal,
    max_drawdown_pct: Decimal,
    trades: Vec<Trade>,
    equity_curve: Vec<EquityPoint>,
}

impl Simulator {
    fn new(initial_cash: Decimal, share_scale: u32) -> Self {
        Self {
            position: Position::flat(initial_cash),
            share_scale,
            peak_value: initial_cash,
            max_drawdown_pct: Decimal::ZERO,
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    fn state(&self) -> PositionState {
        self.position.state()
    }

    /// Apply at most one transition at `point`, then mark to market
    fn step(&mut self, point: &PreparedPoint, action: Action) -> Result<()> {
        match (self.state(), action) {
            (PositionState::Idle, Action::Buy) => {
                let filled = self
                    .position
                    .buy_all(point.close, self.share_scale)
                    .map_err(BacktestError::overflow_on(point.date))?;
                if filled {
                    self.record(point, TradeKind::Buy);
                } else {
                    warn!(
                        date = %point.date,
                        close = %point.close,
                        cash = %self.position.cash,
                        "Buy skipped, cash does not cover a share at this scale"
                    );
                }
            }
            (PositionState::Holding, Action::Sell) => {
                self.position
                    .sell_all(point.close)
                    .map_err(BacktestError::overflow_on(point.date))?;
                self.record(point, TradeKind::Sell);
            }
            _ => {}
        }

        let current_value = self
            .position
            .value_at(point.close)
            .map_err(BacktestError::overflow_on(point.date))?;
        if current_value > self.peak_value {
            self.peak_value = current_value;
        }
        let drawdown_pct = drawdown_from_peak(self.peak_value, current_value).ok_or(
            BacktestError::ArithmeticOverflow {
                date: point.date,
                operation: "drawdown",
            },
        )?;
        if drawdown_pct > self.max_drawdown_pct {
            self.max_drawdown_pct = drawdown_pct;
        }

        self.equity_curve.push(EquityPoint {
            date: point.date,
            close: point.close,
            portfolio_value: current_value,
            peak_value: self.peak_value,
            drawdown_pct,
        });
        Ok(())
    }

    fn record(&mut self, point: &PreparedPoint, kind: TradeKind) {
        debug!(
            date = %point.date,
            kind = %kind,
            price = %point.close,
            cash = %self.position.cash,
            shares = %self.position.shares,
            "Executed simulated trade"
        );

        self.trades.push(Trade {
            date: point.date,
            kind,
            price: point.close,
            resulting_position: self.position,
            forced: false,
        });
    }

    fn finish(self) -> SimulationTrace {
        SimulationTrace {
            position: self.position,
            trades: self.trades,
            equity_curve: self.equity_curve,
            max_drawdown_pct: self.max_drawdown_pct,
        }
    }
}

/// Percentage decline of `current` from `peak`
fn drawdown_from_peak(peak: Decimal, current: Decimal) -> Option<Decimal> {
    if peak.is_zero() {
        return Some(Decimal::ZERO);
    }
    peak.checked_sub(current)?
        .checked_div(peak)?
        .checked_mul(Decimal::ONE_HUNDRED)
}
