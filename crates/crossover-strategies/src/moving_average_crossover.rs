//! Moving Average Crossover Strategy
//!
//! Buys when the close dips below the short trailing average and sells when
//! it rises above the long trailing average. Both comparisons are strict, so
//! a close equal to an average never trades.

use crossover_core::{Action, PositionState, PreparedPoint, Strategy};

/// Moving average crossover strategy
#[derive(Debug, Clone)]
pub struct MovingAverageCrossover {
    id: String,
    name: String,
}

impl MovingAverageCrossover {
    /// Create a new crossover strategy
    pub fn new() -> Self {
        Self {
            id: "ma_crossover".to_string(),
            name: "Moving Average Crossover".to_string(),
        }
    }
}

impl Default for MovingAverageCrossover {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for MovingAverageCrossover {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn decide(&self, state: PositionState, point: &PreparedPoint) -> Action {
        match state {
            PositionState::Idle if point.close < point.short_avg => Action::Buy,
            PositionState::Holding if point.close > point.long_avg => Action::Sell,
            _ => Action::Hold,
        }
    }
}
