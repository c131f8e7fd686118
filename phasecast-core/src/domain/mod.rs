//! Domain types for PhaseCast

pub mod bar;
pub mod cycle;
pub mod params;
pub mod signal;

pub use bar::{closes, PriceBar};
pub use cycle::{CycleEstimate, Direction};
pub use params::{ParamError, ParamSnapshot, ParameterSet, ParameterStore};
pub use signal::{SignalAction, SignalRecord, TradingSignal};
