//! PhaseEstimator — price window → CycleEstimate.

use std::f64::consts::TAU;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use super::encode::encode_phase;
use super::entropy::strength;
use super::measurement::{dominant_bucket, outcome_probabilities, sample_counts, to_distribution};
use crate::domain::params::out_of_bounds;
use crate::domain::{CycleEstimate, Direction, ParamError, ParameterSet};
use crate::error::InsufficientData;

/// Smallest window that yields at least one return.
pub const MIN_WINDOW: usize = 2;

/// Precision range the sampler supports.
pub const MAX_PRECISION: u32 = 16;

/// Simulated phase estimator with `2^precision` buckets and `shots` draws.
///
/// The sampler is re-seeded from `seed` on every call, so identical input with an
/// identical seed always yields an identical estimate.
#[derive(Debug, Clone)]
pub struct PhaseEstimator {
    precision: u32,
    shots: u32,
    seed: u64,
}

impl PhaseEstimator {
    pub fn new(precision: u32, shots: u32, seed: u64) -> Result<Self, ParamError> {
        if !(1..=MAX_PRECISION).contains(&precision) {
            return Err(out_of_bounds("precision", precision, "[1, 16]"));
        }
        Ok(Self {
            precision,
            shots,
            seed,
        })
    }

    pub fn from_params(params: &ParameterSet, seed: u64) -> Result<Self, ParamError> {
        Self::new(params.num_measurement_qubits, params.shots, seed)
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn shots(&self) -> u32 {
        self.shots
    }

    pub fn buckets(&self) -> usize {
        1usize << self.precision
    }

    /// Estimate the dominant cycle over the last `window` prices.
    ///
    /// Fails when `window < 2` or fewer than `window` prices are given.
    pub fn estimate(&self, prices: &[f64], window: usize) -> Result<CycleEstimate, InsufficientData> {
        if window < MIN_WINDOW {
            return Err(InsufficientData {
                required: MIN_WINDOW,
                available: window.min(prices.len()),
            });
        }
        if prices.len() < window {
            return Err(InsufficientData {
                required: window,
                available: prices.len(),
            });
        }
        let recent = &prices[prices.len() - window..];

        let target_phase = encode_phase(recent);
        let probabilities = outcome_probabilities(target_phase, self.precision);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let counts = sample_counts(&probabilities, self.shots, &mut rng);
        let raw_distribution = to_distribution(&counts);

        let n = self.buckets();
        let (dominant_phase, dominant_period) = match dominant_bucket(&counts) {
            Some(k) if k > 0 => (TAU * k as f64 / n as f64, n as f64 / k as f64),
            _ => (0.0, f64::INFINITY),
        };

        let strength = strength(raw_distribution.values().copied());
        let direction = direction_of(recent);

        debug!(
            target_phase,
            dominant_phase,
            dominant_period,
            strength,
            %direction,
            buckets = raw_distribution.len(),
            "cycle estimated"
        );

        Ok(CycleEstimate {
            dominant_period,
            dominant_phase,
            strength,
            direction,
            raw_distribution,
            target_phase,
            shots: self.shots,
        })
    }
}

/// Bullish when the window ends above where it started, bearish when below.
fn direction_of(window: &[f64]) -> Direction {
    match (window.first(), window.last()) {
        (Some(first), Some(last)) if last > first => Direction::Bullish,
        (Some(first), Some(last)) if last < first => Direction::Bearish,
        _ => Direction::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| 1.1 + 0.0001 * i as f64).collect()
    }

    #[test]
    fn short_input_is_insufficient() {
        let est = PhaseEstimator::new(4, 1024, 1).unwrap();
        let err = est.estimate(&ramp(10), 20).unwrap_err();
        assert_eq!(err.required, 20);
        assert_eq!(err.available, 10);
    }

    #[test]
    fn window_below_two_is_insufficient() {
        let est = PhaseEstimator::new(4, 1024, 1).unwrap();
        let err = est.estimate(&[1.1, 1.2, 1.3], 1).unwrap_err();
        assert_eq!(err.required, MIN_WINDOW);
        assert_eq!(err.available, 1);
        assert!(est.estimate(&[1.1, 1.2, 1.3], 0).is_err());
        assert!(est.estimate(&[1.1, 1.2, 1.3], 2).is_ok());
    }

    #[test]
    fn precision_out_of_range_is_rejected() {
        assert!(matches!(
            PhaseEstimator::new(0, 1024, 1),
            Err(ParamError::OutOfBounds {
                field: "precision",
                ..
            })
        ));
        assert!(PhaseEstimator::new(MAX_PRECISION + 1, 1024, 1).is_err());
        assert!(PhaseEstimator::new(MAX_PRECISION, 1024, 1).is_ok());
    }

    #[test]
    fn flat_series_is_degenerate_full_strength() {
        let est = PhaseEstimator::new(4, 1024, 1).unwrap();
        let cycle = est.estimate(&[1.25; 30], 20).unwrap();
        assert_eq!(cycle.dominant_phase, 0.0);
        assert!(cycle.dominant_period.is_infinite());
        assert_eq!(cycle.strength, 1.0);
        assert_eq!(cycle.direction, Direction::Neutral);
        assert!(!cycle.has_cycle());
    }

    #[test]
    fn ramp_is_bullish_with_strong_peak() {
        let est = PhaseEstimator::new(4, 1024, 1).unwrap();
        let cycle = est.estimate(&ramp(100), 20).unwrap();
        assert_eq!(cycle.direction, Direction::Bullish);
        assert!(cycle.strength > 0.5, "strength {}", cycle.strength);
        assert!(cycle.has_cycle());
    }

    #[test]
    fn falling_window_is_bearish() {
        let prices: Vec<f64> = ramp(40).into_iter().rev().collect();
        let est = PhaseEstimator::new(4, 1024, 1).unwrap();
        assert_eq!(est.estimate(&prices, 20).unwrap().direction, Direction::Bearish);
    }

    #[test]
    fn same_seed_same_estimate() {
        let prices = [1.10, 1.12, 1.09, 1.13, 1.08, 1.15, 1.11, 1.14];
        let a = PhaseEstimator::new(5, 2048, 9).unwrap().estimate(&prices, 8).unwrap();
        let b = PhaseEstimator::new(5, 2048, 9).unwrap().estimate(&prices, 8).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_shots_gives_empty_distribution() {
        let est = PhaseEstimator::new(3, 0, 1).unwrap();
        let cycle = est.estimate(&ramp(20), 20).unwrap();
        assert!(cycle.raw_distribution.is_empty());
        assert_eq!(cycle.strength, 0.0);
        assert!(cycle.dominant_period.is_infinite());
    }

    #[test]
    fn dominant_phase_matches_bucket_grid() {
        let est = PhaseEstimator::new(3, 512, 3).unwrap();
        let prices = [1.0, 1.3, 1.1, 1.25, 1.2, 1.4];
        let cycle = est.estimate(&prices, 6).unwrap();
        let k = cycle.dominant_phase / TAU * 8.0;
        assert!((k - k.round()).abs() < 1e-9);
        assert!((0.0..TAU).contains(&cycle.dominant_phase));
    }
}
