//! CycleEstimate — output of one phase/cycle estimation.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Directional bias of the estimation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Bullish => "bullish",
            Direction::Bearish => "bearish",
            Direction::Neutral => "neutral",
        };
        f.write_str(s)
    }
}

/// Result of a simulated phase-estimation measurement over a price window.
///
/// `raw_distribution` maps bucket index `k` (phase `2πk/2^q`) to the sampled
/// probability mass. Only buckets that received at least one draw appear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleEstimate {
    /// Dominant period in bars; `f64::INFINITY` when the dominant phase is zero.
    #[serde(serialize_with = "ser_period", deserialize_with = "de_period")]
    pub dominant_period: f64,
    /// Phase of the most-sampled bucket, in `[0, 2π)`.
    pub dominant_phase: f64,
    /// `1 − H/H_max` over `raw_distribution`, in `[0, 1]`.
    pub strength: f64,
    pub direction: Direction,
    pub raw_distribution: BTreeMap<u32, f64>,
    /// Phase the price window encoded to, before measurement.
    pub target_phase: f64,
    pub shots: u32,
}

impl CycleEstimate {
    /// False for the "infinite period" case. A flat window lands here with
    /// full strength, which must not be read as a strong cycle.
    pub fn has_cycle(&self) -> bool {
        self.dominant_period.is_finite()
    }
}

// JSON has no infinity; an infinite period travels as `null`.
fn ser_period<S: Serializer>(period: &f64, s: S) -> Result<S::Ok, S::Error> {
    if period.is_finite() {
        s.serialize_some(period)
    } else {
        s.serialize_none()
    }
}

fn de_period<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(d)?.unwrap_or(f64::INFINITY))
}
