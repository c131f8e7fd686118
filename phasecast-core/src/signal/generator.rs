//! SignalGenerator — cycle estimate plus trend confirmation → TradingSignal.
//!
//! The generator always returns a structurally valid signal. Anything short of a
//! clean BUY/SELL setup degrades to HOLD with a reason; only bad parameters or a
//! short series surface as errors.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::cycle::PhaseEstimator;
use crate::domain::{
    closes, CycleEstimate, Direction, ParamError, ParameterSet, PriceBar, SignalAction,
    TradingSignal,
};
use crate::error::InsufficientData;
use crate::indicators::{coefficient_of_variation, trailing_mean};
use crate::rng::SeedHierarchy;

pub const DEFAULT_CYCLE_WINDOW: usize = 20;
pub const SHORT_MA_PERIOD: usize = 20;
pub const LONG_MA_PERIOD: usize = 50;
pub const STOP_MULTIPLE: f64 = 2.0;
pub const TARGET_MULTIPLE: f64 = 4.0;
const RISK_REWARD_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    #[error(transparent)]
    InsufficientData(#[from] InsufficientData),
    #[error(transparent)]
    InvalidParameter(#[from] ParamError),
}

/// Produces one signal per `(series, symbol, params)` call.
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    seeds: SeedHierarchy,
    cycle_window: usize,
}

impl SignalGenerator {
    pub fn new(seeds: SeedHierarchy) -> Self {
        Self {
            seeds,
            cycle_window: DEFAULT_CYCLE_WINDOW,
        }
    }

    /// Number of trailing closes handed to the estimator (capped at the lookback).
    pub fn with_cycle_window(mut self, window: usize) -> Self {
        self.cycle_window = window;
        self
    }

    pub fn cycle_window(&self) -> usize {
        self.cycle_window
    }

    pub fn seeds(&self) -> SeedHierarchy {
        self.seeds
    }

    /// Generate a signal from the last `params.lookback_periods` bars of `series`.
    pub fn generate(
        &self,
        series: &[PriceBar],
        symbol: &str,
        params: &ParameterSet,
    ) -> Result<TradingSignal, SignalError> {
        params.validate()?;
        let lookback = params.lookback_periods;
        if series.len() < lookback {
            return Err(InsufficientData {
                required: lookback,
                available: series.len(),
            }
            .into());
        }

        let bars = &series[series.len() - lookback..];
        let prices = closes(bars);
        let (price, as_of) = match bars.last() {
            Some(last) => (last.close, last.timestamp),
            None => {
                return Err(InsufficientData {
                    required: lookback.max(1),
                    available: 0,
                }
                .into())
            }
        };

        let seed = self.seeds.sub_seed(symbol, as_of.timestamp());
        let window = self.cycle_window.min(lookback);
        let cycle = PhaseEstimator::from_params(params, seed)?.estimate(&prices, window)?;

        let indicators = Trend {
            sma_short: trailing_mean(&prices, SHORT_MA_PERIOD).unwrap_or(price),
            sma_long: trailing_mean(&prices, LONG_MA_PERIOD).unwrap_or(price),
            volatility: coefficient_of_variation(&prices, SHORT_MA_PERIOD),
        };

        let signal = decide(symbol, price, as_of, &cycle, &indicators, params);
        let signal = with_metadata(signal, &cycle, &indicators);

        info!(
            symbol,
            action = %signal.action,
            confidence = signal.confidence,
            entry = signal.entry_price,
            reason = %signal.reason,
            "signal generated"
        );
        Ok(signal)
    }

    /// Generate for every symbol, dropping HOLDs and isolating failures.
    ///
    /// Output is ordered by symbol regardless of the map's iteration order.
    pub fn generate_batch(
        &self,
        series_by_symbol: &HashMap<String, Vec<PriceBar>>,
        params: &ParameterSet,
    ) -> Vec<TradingSignal> {
        let mut symbols: Vec<&String> = series_by_symbol.keys().collect();
        symbols.sort();

        let mut signals = Vec::new();
        for symbol in symbols {
            let series = &series_by_symbol[symbol];
            match self.generate(series, symbol, params) {
                Ok(signal) if !signal.is_hold() => signals.push(signal),
                Ok(_) => {}
                Err(e) => warn!(symbol = %symbol, error = %e, "signal generation failed"),
            }
        }
        signals
    }
}

impl Default for SignalGenerator {
    fn default() -> Self {
        Self::new(SeedHierarchy::default())
    }
}

/// `Some(signal)` when it is directional and meets the caller's confidence floor.
pub fn actionable(signal: TradingSignal, floor: f64) -> Option<TradingSignal> {
    (!signal.is_hold() && signal.confidence >= floor).then_some(signal)
}

/// Keep only deliverable signals.
pub fn filter_actionable<I>(signals: I, floor: f64) -> Vec<TradingSignal>
where
    I: IntoIterator<Item = TradingSignal>,
{
    signals
        .into_iter()
        .filter_map(|s| actionable(s, floor))
        .collect()
}

struct Trend {
    sma_short: f64,
    sma_long: f64,
    volatility: f64,
}

fn decide(
    symbol: &str,
    price: f64,
    as_of: DateTime<Utc>,
    cycle: &CycleEstimate,
    trend: &Trend,
    params: &ParameterSet,
) -> TradingSignal {
    let strength = cycle.strength;
    let hold = |confidence: f64, reason: &str| {
        TradingSignal::hold(symbol, confidence, price, reason, as_of)
    };

    if strength < params.confidence_threshold {
        return hold(strength, "Low cycle strength");
    }
    if !cycle.has_cycle() {
        return hold(0.0, "No detectable cycle");
    }

    let action = match cycle.direction {
        Direction::Bullish if price > trend.sma_short => SignalAction::Buy,
        Direction::Bearish if price < trend.sma_short => SignalAction::Sell,
        _ => return hold(strength, "Conflicting indicators"),
    };

    let v = trend.volatility;
    if !(v.is_finite() && v > 0.0) {
        return hold(strength, "Insufficient volatility");
    }

    let (stop, target) = match action {
        SignalAction::Buy => (
            price * (1.0 - STOP_MULTIPLE * v),
            price * (1.0 + TARGET_MULTIPLE * v),
        ),
        _ => (
            price * (1.0 + STOP_MULTIPLE * v),
            price * (1.0 - TARGET_MULTIPLE * v),
        ),
    };
    if stop <= 0.0 || target <= 0.0 {
        return hold(strength, "Volatility too high");
    }
    let ordered = match action {
        SignalAction::Buy => stop < price && price < target,
        _ => target < price && price < stop,
    };
    if !ordered {
        return hold(strength, "Insufficient volatility");
    }

    let risk_reward = (target - price).abs() / (price - stop).abs();
    if risk_reward + RISK_REWARD_TOLERANCE < params.min_risk_reward {
        return hold(strength, "Risk-reward below minimum");
    }

    let side = if action == SignalAction::Buy {
        "above"
    } else {
        "below"
    };
    TradingSignal {
        symbol: symbol.to_string(),
        action,
        confidence: strength,
        entry_price: price,
        stop_loss: Some(stop),
        take_profit: Some(target),
        risk_reward: Some(risk_reward),
        reason: format!(
            "{} cycle (strength {:.2}, period {:.1} bars), price {side} SMA{SHORT_MA_PERIOD}",
            capitalize(cycle.direction),
            strength,
            cycle.dominant_period,
        ),
        metadata: BTreeMap::new(),
        created_at: as_of,
    }
}

fn capitalize(direction: Direction) -> &'static str {
    match direction {
        Direction::Bullish => "Bullish",
        Direction::Bearish => "Bearish",
        Direction::Neutral => "Neutral",
    }
}

fn with_metadata(mut signal: TradingSignal, cycle: &CycleEstimate, trend: &Trend) -> TradingSignal {
    let entries = [
        ("period", Value::from(cycle.dominant_period)),
        ("phase", Value::from(cycle.dominant_phase)),
        ("target_phase", Value::from(cycle.target_phase)),
        ("strength", Value::from(cycle.strength)),
        ("direction", Value::from(cycle.direction.to_string())),
        ("sma_short", Value::from(trend.sma_short)),
        ("sma_long", Value::from(trend.sma_long)),
        ("volatility", Value::from(trend.volatility)),
    ];
    for (key, value) in entries {
        signal.metadata.insert(key.to_string(), value);
    }
    signal
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn bars_from(prices: &[f64]) -> Vec<PriceBar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| PriceBar {
                timestamp: start + Duration::hours(i as i64),
                open: p,
                high: p * 1.0005,
                low: p * 0.9995,
                close: p,
                volume: 1_000,
            })
            .collect()
    }

    fn ramp(n: usize, step: f64) -> Vec<PriceBar> {
        let prices: Vec<f64> = (0..n).map(|i| 1.1 + step * i as f64).collect();
        bars_from(&prices)
    }

    fn relaxed() -> ParameterSet {
        ParameterSet {
            confidence_threshold: 0.5,
            ..Default::default()
        }
    }

    #[test]
    fn invalid_params_are_rejected() {
        let params = ParameterSet {
            shots: 1,
            ..Default::default()
        };
        let err = SignalGenerator::default()
            .generate(&ramp(150, 0.0001), "EURUSD", &params)
            .unwrap_err();
        assert!(matches!(err, SignalError::InvalidParameter(_)));
    }

    #[test]
    fn short_series_is_insufficient() {
        let err = SignalGenerator::default()
            .generate(&ramp(99, 0.0001), "EURUSD", &relaxed())
            .unwrap_err();
        assert_eq!(
            err,
            SignalError::InsufficientData(InsufficientData {
                required: 100,
                available: 99
            })
        );
    }

    #[test]
    fn rising_ramp_buys_at_last_close() {
        let series = ramp(150, 0.0001);
        let signal = SignalGenerator::default()
            .generate(&series, "EURUSD", &relaxed())
            .unwrap();
        assert_eq!(signal.action, SignalAction::Buy);
        assert_eq!(signal.entry_price, series[149].close);
        assert_eq!(signal.created_at, series[149].timestamp);
        assert!((signal.risk_reward.unwrap() - 2.0).abs() < 1e-9);
        assert!(signal.is_well_formed());
        assert_eq!(signal.metadata["direction"], "bullish");
    }

    #[test]
    fn falling_ramp_sells() {
        let prices: Vec<f64> = (0..150).map(|i| 1.3 - 0.0001 * i as f64).collect();
        let signal = SignalGenerator::default()
            .generate(&bars_from(&prices), "GBPUSD", &relaxed())
            .unwrap();
        assert_eq!(signal.action, SignalAction::Sell);
        assert!(signal.is_well_formed());
    }

    #[test]
    fn flat_series_is_not_a_cycle() {
        let signal = SignalGenerator::default()
            .generate(&bars_from(&[2.0; 120]), "EURUSD", &relaxed())
            .unwrap();
        assert!(signal.is_hold());
        assert_eq!(signal.confidence, 0.0);
        assert_eq!(signal.reason, "No detectable cycle");
        assert!(signal.metadata["period"].is_null());
    }

    #[test]
    fn threshold_above_strength_holds() {
        let series = ramp(150, 0.0001);
        let generator = SignalGenerator::default();
        let buy = generator.generate(&series, "EURUSD", &relaxed()).unwrap();
        let strict = ParameterSet {
            confidence_threshold: 0.99,
            ..Default::default()
        };
        let signal = generator.generate(&series, "EURUSD", &strict).unwrap();
        if buy.confidence < 0.99 {
            assert!(signal.is_hold());
            assert_eq!(signal.reason, "Low cycle strength");
            assert_eq!(signal.confidence, buy.confidence);
        }
    }

    #[test]
    fn risk_reward_floor_holds() {
        let params = ParameterSet {
            min_risk_reward: 3.0,
            ..relaxed()
        };
        let signal = SignalGenerator::default()
            .generate(&ramp(150, 0.0001), "EURUSD", &params)
            .unwrap();
        assert!(signal.is_hold());
        assert_eq!(signal.reason, "Risk-reward below minimum");
    }

    #[test]
    fn bullish_cycle_below_sma_conflicts() {
        // Long climb, then a dip in the last few bars that still ends above the
        // window start but below the 20-bar mean.
        let mut prices: Vec<f64> = (0..130).map(|i| 1.1 + 0.001 * i as f64).collect();
        let top = prices[129];
        prices.extend((1..=20).map(|i| top - 0.0009 * i as f64));
        let signal = SignalGenerator::default()
            .with_cycle_window(100)
            .generate(&bars_from(&prices), "EURUSD", &relaxed())
            .unwrap();
        assert!(signal.is_hold());
    }

    #[test]
    fn one_bar_cycle_window_is_insufficient() {
        let err = SignalGenerator::default()
            .with_cycle_window(1)
            .generate(&ramp(150, 0.0001), "EURUSD", &relaxed())
            .unwrap_err();
        assert_eq!(
            err,
            SignalError::InsufficientData(InsufficientData {
                required: 2,
                available: 1,
            })
        );
    }

    #[test]
    fn batch_sorts_and_isolates_failures() {
        let mut map = HashMap::new();
        map.insert("USDJPY".to_string(), ramp(150, 0.0001));
        map.insert("EURUSD".to_string(), ramp(150, 0.0001));
        map.insert("SHORT".to_string(), ramp(10, 0.0001));
        map.insert("FLAT".to_string(), bars_from(&[1.2; 120]));
        let signals = SignalGenerator::default().generate_batch(&map, &relaxed());
        let symbols: Vec<&str> = signals.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["EURUSD", "USDJPY"]);
    }

    #[test]
    fn actionable_applies_floor() {
        let signal = SignalGenerator::default()
            .generate(&ramp(150, 0.0001), "EURUSD", &relaxed())
            .unwrap();
        let confidence = signal.confidence;
        assert!(actionable(signal.clone(), confidence).is_some());
        assert!(actionable(signal.clone(), confidence + 0.01).is_none());

        let hold = TradingSignal::hold("EURUSD", 1.0, 1.1, "x", signal.created_at);
        assert_eq!(filter_actionable(vec![hold, signal], 0.0).len(), 1);
    }
}
