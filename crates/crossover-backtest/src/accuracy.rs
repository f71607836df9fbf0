//! Prediction accuracy against actual closing prices

use crate::error::{BacktestError, Result};
use crossover_core::PricePoint;
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Error statistics of a predicted series against actual closes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionMetrics {
    /// Number of dates present in both series
    pub sample_count: usize,
    pub mean_absolute_error: Decimal,
    pub root_mean_squared_error: Decimal,
}

impl PredictionMetrics {
    /// Compare predictions with actual closes on the dates both series share.
    ///
    /// Predictions for dates without an actual close are skipped, matching a
    /// forecast whose outcome is not known yet.
    pub fn calculate(actual: &[PricePoint], predicted: &[PricePoint]) -> Result<Self> {
        let actual_by_date: HashMap<_, _> = actual.iter().map(|p| (p.date, p.close)).collect();

        let mut sample_count = 0usize;
        let mut absolute_sum = Decimal::ZERO;
        let mut squared_sum = Decimal::ZERO;

        for prediction in predicted {
            let Some(close) = actual_by_date.get(&prediction.date) else {
                continue;
            };
            let overflow = || BacktestError::ArithmeticOverflow {
                date: prediction.date,
                operation: "prediction error",
            };

            let error = close.checked_sub(prediction.close).ok_or_else(overflow)?;
            absolute_sum = absolute_sum
                .checked_add(error.abs())
                .ok_or_else(overflow)?;
            squared_sum = error
                .checked_mul(error)
                .and_then(|squared| squared_sum.checked_add(squared))
                .ok_or_else(overflow)?;
            sample_count += 1;
        }

        if sample_count == 0 {
            return Err(BacktestError::NoOverlap);
        }

        let n = Decimal::from(sample_count);
        let mean_absolute_error = absolute_sum / n;
        let root_mean_squared_error = (squared_sum / n).sqrt().unwrap_or(Decimal::ZERO);

        debug!(
            matched = sample_count,
            skipped = predicted.len() - sample_count,
            "Computed prediction metrics"
        );

        Ok(Self {
            sample_count,
            mean_absolute_error,
            root_mean_squared_error,
        })
    }
}
