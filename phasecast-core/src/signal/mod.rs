//! Signal generation: cycle estimate + moving-average/volatility confirmation.

pub mod generator;

pub use generator::{
    actionable, filter_actionable, SignalError, SignalGenerator, DEFAULT_CYCLE_WINDOW,
};
