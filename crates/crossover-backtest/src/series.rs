//! Trailing moving averages aligned to a price series

use crate::error::{BacktestError, Result};
use crossover_core::{PreparedPoint, PricePoint};
use rust_decimal::Decimal;

/// Running sum over the most recent `window` closes
struct TrailingWindow {
    window: usize,
    sum: Decimal,
}

impl TrailingWindow {
    fn new(window: usize) -> Self {
        Self {
            window,
            sum: Decimal::ZERO,
        }
    }

    /// Push the close at `index` and return the mean once the window is full
    fn push(&mut self, prices: &[PricePoint], index: usize) -> Result<Option<Decimal>> {
        let price = &prices[index];
        let leaving = if index >= self.window {
            prices[index - self.window].close
        } else {
            Decimal::ZERO
        };
        self.sum = self
            .sum
            .checked_sub(leaving)
            .and_then(|sum| sum.checked_add(price.close))
            .ok_or(BacktestError::ArithmeticOverflow {
                date: price.date,
                operation: "moving average",
            })?;

        if index + 1 >= self.window {
            Ok(Some(self.sum / Decimal::from(self.window)))
        } else {
            Ok(None)
        }
    }
}

/// Compute short and long trailing averages and drop the warm-up prefix.
///
/// Each average is the arithmetic mean of the `w` most recent closes including
/// the current one. Only points where both averages exist are returned, in
/// input order. Empty input, a zero window, or a window longer than the input
/// all produce an empty series. A window sum beyond the range of `Decimal` is
/// an `ArithmeticOverflow` error.
pub fn prepare_series(
    prices: &[PricePoint],
    short_window: usize,
    long_window: usize,
) -> Result<Vec<PreparedPoint>> {
    if short_window == 0 || long_window == 0 {
        return Ok(Vec::new());
    }
    let warmup = short_window.max(long_window);
    if prices.len() < warmup {
        return Ok(Vec::new());
    }

    let mut short = TrailingWindow::new(short_window);
    let mut long = TrailingWindow::new(long_window);
    let mut prepared = Vec::with_capacity(prices.len() - warmup + 1);

    for (index, price) in prices.iter().enumerate() {
        let short_avg = short.push(prices, index)?;
        let long_avg = long.push(prices, index)?;

        if let (Some(short_avg), Some(long_avg)) = (short_avg, long_avg) {
            prepared.push(PreparedPoint {
                date: price.date,
                close: price.close,
                short_avg,
                long_avg,
            });
        }
    }

    Ok(prepared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use rust_decimal_macros::dec;

    fn series(closes: &[Decimal]) -> Vec<PricePoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, close)| PricePoint::new(start + Duration::days(i as i64), *close))
            .collect()
    }

    #[test]
    fn test_averages_are_trailing_means() {
        let prices = series(&[dec!(10), dec!(8), dec!(12), dec!(6), dec!(14)]);
        let prepared = prepare_series(&prices, 2, 3).unwrap();

        assert_eq!(prepared.len(), 3);
        assert_eq!(prepared[0].date, prices[2].date);
        assert_eq!(prepared[0].short_avg, dec!(10));
        assert_eq!(prepared[0].long_avg, dec!(10));
        assert_eq!(prepared[1].short_avg, dec!(9));
        assert_eq!(prepared[1].long_avg, dec!(26) / dec!(3));
        assert_eq!(prepared[2].short_avg, dec!(10));
        assert_eq!(prepared[2].long_avg, dec!(32) / dec!(3));
    }

    #[test]
    fn test_length_is_input_minus_warmup_plus_one() {
        let prices = series(&vec![dec!(100); 300]);
        assert_eq!(prepare_series(&prices, 50, 200).unwrap().len(), 101);
        // Swapped windows use the larger one as warm-up
        assert_eq!(prepare_series(&prices, 200, 50).unwrap().len(), 101);
    }

    #[test]
    fn test_window_of_one_is_the_close() {
        let prices = series(&[dec!(3), dec!(5), dec!(7)]);
        let prepared = prepare_series(&prices, 1, 1).unwrap();

        assert_eq!(prepared.len(), 3);
        for (point, price) in prepared.iter().zip(&prices) {
            assert_eq!(point.short_avg, price.close);
            assert_eq!(point.long_avg, price.close);
        }
    }

    #[test]
    fn test_degenerate_inputs_are_empty() {
        assert!(prepare_series(&[], 2, 3).unwrap().is_empty());

        let prices = series(&[dec!(1), dec!(2)]);
        assert!(prepare_series(&prices, 2, 3).unwrap().is_empty());
        assert!(prepare_series(&prices, 0, 1).unwrap().is_empty());
        assert!(prepare_series(&prices, 1, 0).unwrap().is_empty());
    }

    #[test]
    fn test_exact_length_yields_single_point() {
        let prices = series(&[dec!(1), dec!(2), dec!(3)]);
        let prepared = prepare_series(&prices, 2, 3).unwrap();

        assert_eq!(prepared.len(), 1);
        assert_eq!(prepared[0].short_avg, dec!(2.5));
        assert_eq!(prepared[0].long_avg, dec!(2));
    }

    #[test]
    fn test_window_sum_overflow_is_error() {
        // A one-day window of MAX fits; two days of it do not
        let prices = series(&[Decimal::MAX, Decimal::MAX, dec!(1)]);
        let err = prepare_series(&prices, 1, 2).unwrap_err();

        match err {
            BacktestError::ArithmeticOverflow { date, operation } => {
                assert_eq!(date, prices[1].date);
                assert_eq!(operation, "moving average");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
