//! Market data source trait, timeframes, and structured error types.
//!
//! The `MarketDataSource` trait abstracts over where bars come from (synthetic
//! generator, CSV files, a live feed) so the engine can swap implementations
//! and mock them in tests.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::PriceBar;

/// Structured error types for data operations.
///
/// `NoData` and `Unavailable` are distinct from a short-but-usable series,
/// which is returned as `Ok` with fewer bars than requested.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no data for symbol '{symbol}'")]
    NoData { symbol: String },

    #[error("data source '{source_name}' unavailable: {reason}")]
    Unavailable { source_name: String, reason: String },

    #[error("invalid series for '{symbol}': {reason}")]
    InvalidSeries { symbol: String, reason: String },

    #[error("unknown timeframe '{0}'")]
    UnknownTimeframe(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bar interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    #[default]
    H1,
    H4,
    D1,
}

impl Timeframe {
    pub fn duration(self) -> Duration {
        match self {
            Timeframe::M1 => Duration::minutes(1),
            Timeframe::M5 => Duration::minutes(5),
            Timeframe::M15 => Duration::minutes(15),
            Timeframe::M30 => Duration::minutes(30),
            Timeframe::H1 => Duration::hours(1),
            Timeframe::H4 => Duration::hours(4),
            Timeframe::D1 => Duration::days(1),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "M1" => Ok(Timeframe::M1),
            "M5" => Ok(Timeframe::M5),
            "M15" => Ok(Timeframe::M15),
            "M30" => Ok(Timeframe::M30),
            "H1" => Ok(Timeframe::H1),
            "H4" => Ok(Timeframe::H4),
            "D1" => Ok(Timeframe::D1),
            _ => Err(DataError::UnknownTimeframe(s.to_string())),
        }
    }
}

/// Pull-style supplier of OHLCV bars.
pub trait MarketDataSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Up to `count` most recent bars for `symbol`, time-ascending.
    fn get_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<PriceBar>, DataError>;

    /// Whether the source can currently serve requests.
    fn is_available(&self) -> bool {
        true
    }
}

/// Check every bar is sane and timestamps strictly ascend.
pub fn validate_series(symbol: &str, bars: &[PriceBar]) -> Result<(), DataError> {
    if let Some(i) = bars.iter().position(|b| !b.is_sane()) {
        return Err(DataError::InvalidSeries {
            symbol: symbol.to_string(),
            reason: format!("bar {i} violates low <= open,close <= high"),
        });
    }
    if let Some(i) = bars
        .windows(2)
        .position(|w| w[1].timestamp <= w[0].timestamp)
    {
        return Err(DataError::InvalidSeries {
            symbol: symbol.to_string(),
            reason: format!("timestamp at bar {} is not after bar {i}", i + 1),
        });
    }
    Ok(())
}
