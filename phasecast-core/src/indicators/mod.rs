//! Classical indicators over close-price slices.
//!
//! All functions are pure and total: degenerate inputs (empty slices, zero
//! prices, zero variance) return sentinel values instead of NaN or panics.

pub mod sma;
pub mod volatility;

pub use sma::trailing_mean;
pub use volatility::{coefficient_of_variation, mean, pct_returns, population_std_dev};

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
