//! Price window → target phase.

use std::f64::consts::TAU;

use crate::indicators::{mean, pct_returns};

/// Map a price window to a phase angle in `[0, 2π)`.
///
/// Per-bar returns are min–max normalised to `[0, 1]`, and their mean is scaled
/// to a full turn. A window with fewer than two prices or with constant returns
/// (including all-equal prices) maps to phase 0.
pub fn encode_phase(prices: &[f64]) -> f64 {
    let returns = pct_returns(prices);
    if returns.is_empty() {
        return 0.0;
    }

    let (min, max) = returns
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
            (lo.min(r), hi.max(r))
        });
    let range = max - min;
    if !range.is_finite() || range <= 0.0 {
        return 0.0;
    }

    let normalized: Vec<f64> = returns.iter().map(|r| (r - min) / range).collect();
    let phase = (mean(&normalized) * TAU).rem_euclid(TAU);
    if phase.is_finite() && phase < TAU {
        phase
    } else {
        0.0
    }
}
