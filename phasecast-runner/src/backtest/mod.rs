//! Backtesting: trade replay, aggregation, and historical signal generation.

pub mod backtester;
pub mod trade;
pub mod walk_forward;

pub use backtester::{BacktestConfig, BacktestError, BacktestResult, Backtester, MIN_FORWARD_BARS};
pub use trade::{ExitReason, Trade};
pub use walk_forward::historical_signals;
