//! PriceBar — the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single symbol at a single timestamp.
///
/// Bars are immutable once produced and are held in time-ascending series
/// per symbol. The symbol itself is carried by the series, not the bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    /// OHLC sanity check: `low <= {open, close} <= high`, all prices finite and positive.
    pub fn is_sane(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return false;
        }
        self.low <= self.open
            && self.low <= self.close
            && self.high >= self.open
            && self.high >= self.close
    }
}

/// Close prices of a series, in order.
pub fn closes(series: &[PriceBar]) -> Vec<f64> {
    series.iter().map(|b| b.close).collect()
}
