//! Historical signal replay: run the generator over as-of windows of a series.
//!
//! At each step the generator only sees bars up to and including the as-of bar,
//! so the resulting signals carry no look-ahead. Steps that leave fewer than
//! `MIN_FORWARD_BARS` behind them are not generated at all, since the
//! backtester would skip them.

use phasecast_core::domain::{ParameterSet, PriceBar, TradingSignal};
use phasecast_core::signal::{SignalError, SignalGenerator};

use super::backtester::MIN_FORWARD_BARS;

/// Directional signals generated every `step` bars over `series`.
pub fn historical_signals(
    generator: &SignalGenerator,
    series: &[PriceBar],
    symbol: &str,
    params: &ParameterSet,
    step: usize,
) -> Result<Vec<TradingSignal>, SignalError> {
    params.validate()?;
    let lookback = params.lookback_periods;
    let last_end = series.len().saturating_sub(MIN_FORWARD_BARS);
    if last_end < lookback {
        return Ok(Vec::new());
    }

    let mut signals = Vec::new();
    for end in (lookback..=last_end).step_by(step.max(1)) {
        let signal = generator.generate(&series[..end], symbol, params)?;
        if !signal.is_hold() {
            signals.push(signal);
        }
    }
    Ok(signals)
}
