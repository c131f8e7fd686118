//! Market data sources.

pub mod provider;
pub mod synthetic;

pub use provider::{validate_series, DataError, MarketDataSource, Timeframe};
pub use synthetic::SyntheticSource;
