//! Simple Moving Average (SMA) of the most recent values.

use super::volatility::mean;

/// Mean of the last `period` values, or of all values when fewer are available.
///
/// Returns `None` for an empty slice or a zero period.
pub fn trailing_mean(values: &[f64], period: usize) -> Option<f64> {
    if values.is_empty() || period == 0 {
        return None;
    }
    let start = values.len().saturating_sub(period);
    Some(mean(&values[start..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn sma_uses_last_period_values() {
        let values = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0];
        // mean(12..=16) = 14
        assert_approx(trailing_mean(&values, 5).unwrap(), 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_falls_back_to_all_values() {
        let values = [1.0, 2.0, 3.0];
        assert_approx(trailing_mean(&values, 50).unwrap(), 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_last_value() {
        assert_approx(trailing_mean(&[100.0, 200.0, 300.0], 1).unwrap(), 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_empty_is_none() {
        assert!(trailing_mean(&[], 20).is_none());
        assert!(trailing_mean(&[1.0], 0).is_none());
    }
}
