//! Seeded random-walk bar generator for development and tests.
//!
//! Bars are clearly synthetic: a multiplicative walk from a fixed base price
//! with small open jitter and wicks that always bracket open and close.

use std::collections::BTreeSet;

use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;
use tracing::debug;

use super::provider::{DataError, MarketDataSource, Timeframe};
use crate::domain::PriceBar;
use crate::rng::SeedHierarchy;

const DEFAULT_VOLATILITY: f64 = 0.001;
/// Upper bound on per-bar return std. Keeps every draw well above -100%.
pub const MAX_VOLATILITY: f64 = 0.1;
const OPEN_JITTER: f64 = 0.0001;
const MAX_WICK: f64 = 0.0005;

/// Deterministic synthetic market data.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    seeds: SeedHierarchy,
    anchor: DateTime<Utc>,
    volatility: f64,
    unavailable: BTreeSet<String>,
}

impl SyntheticSource {
    /// Series end at a fixed anchor so output is reproducible across runs.
    pub fn new(seeds: SeedHierarchy) -> Self {
        Self {
            seeds,
            anchor: Utc
                .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
            volatility: DEFAULT_VOLATILITY,
            unavailable: BTreeSet::new(),
        }
    }

    /// Timestamp of the most recent bar of every series.
    pub fn with_anchor(mut self, anchor: DateTime<Utc>) -> Self {
        self.anchor = anchor;
        self
    }

    /// Per-bar return standard deviation, clamped to `[0, MAX_VOLATILITY]`.
    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = if volatility.is_finite() {
            volatility.abs().min(MAX_VOLATILITY)
        } else {
            0.0
        };
        self
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    /// Make `symbol` fail with `DataError::Unavailable`.
    pub fn with_unavailable(mut self, symbol: &str) -> Self {
        self.unavailable.insert(symbol.to_string());
        self
    }

    /// Starting price: EUR crosses start at 1.1000, everything else at 1.2500.
    pub fn base_price(symbol: &str) -> f64 {
        if symbol.contains("EUR") {
            1.1000
        } else {
            1.2500
        }
    }

    fn generate(&self, symbol: &str, timeframe: Timeframe, count: usize) -> Vec<PriceBar> {
        let mut rng = self.seeds.rng_for(symbol, timeframe.duration().num_seconds());
        // Uniform draw with the requested standard deviation.
        let half_width = self.volatility * 3f64.sqrt();
        let step = timeframe.duration();

        let mut price = Self::base_price(symbol);
        let mut bars = Vec::with_capacity(count);
        for i in 0..count {
            let ret = if half_width > 0.0 {
                rng.gen_range(-half_width..half_width)
            } else {
                0.0
            };
            price *= 1.0 + ret;
            let close = price;
            let open = close * (1.0 + rng.gen_range(-OPEN_JITTER..OPEN_JITTER));
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..MAX_WICK));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..MAX_WICK));
            let back = (count - 1 - i) as i32;
            bars.push(PriceBar {
                timestamp: self.anchor - step * back,
                open,
                high,
                low,
                close,
                volume: rng.gen_range(100..1000u64),
            });
        }
        bars
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new(SeedHierarchy::default())
    }
}

impl MarketDataSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn get_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<PriceBar>, DataError> {
        if self.unavailable.contains(symbol) {
            return Err(DataError::Unavailable {
                source_name: self.name().to_string(),
                reason: format!("{symbol} is not served"),
            });
        }
        if count == 0 {
            return Err(DataError::NoData {
                symbol: symbol.to_string(),
            });
        }
        let bars = self.generate(symbol, timeframe, count);
        debug!(symbol, %timeframe, count, "generated synthetic bars");
        Ok(bars)
    }
}
