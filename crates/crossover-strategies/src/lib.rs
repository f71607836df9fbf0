//! Crossover Strategies
//!
//! Trading rules that plug into the backtest simulator.

pub mod moving_average_crossover;

pub use moving_average_crossover::MovingAverageCrossover;
