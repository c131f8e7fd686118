//! Candidate scoring.
//!
//! The optimizer only needs a number per candidate; `BacktestScorer` gets it by
//! regenerating historical signals with the candidate and backtesting them on
//! the same stored history every candidate sees.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::debug;

use phasecast_core::domain::{ParameterSet, PriceBar, TradingSignal};
use phasecast_core::signal::{SignalError, SignalGenerator};

use crate::backtest::{historical_signals, BacktestResult, Backtester};

/// Scores a parameter candidate; higher is better.
pub trait CandidateScorer: Send + Sync {
    fn score(&self, params: &ParameterSet) -> Result<f64, SignalError>;
}

/// Win rate of a walk-forward backtest over stored history.
pub struct BacktestScorer {
    generator: SignalGenerator,
    backtester: Backtester,
    history: HashMap<String, Vec<PriceBar>>,
    step: usize,
    min_trades: usize,
}

impl BacktestScorer {
    pub fn new(
        generator: SignalGenerator,
        backtester: Backtester,
        history: HashMap<String, Vec<PriceBar>>,
    ) -> Self {
        Self {
            generator,
            backtester,
            history,
            step: 5,
            min_trades: 5,
        }
    }

    /// Bars between consecutive as-of points.
    pub fn with_step(mut self, step: usize) -> Self {
        self.step = step.max(1);
        self
    }

    /// Candidates producing fewer trades than this score 0.
    pub fn with_min_trades(mut self, min_trades: usize) -> Self {
        self.min_trades = min_trades;
        self
    }

    /// Historical signals for every symbol, ordered by time then symbol.
    pub fn signals(&self, params: &ParameterSet) -> Result<Vec<TradingSignal>, SignalError> {
        let mut symbols: Vec<&String> = self.history.keys().collect();
        symbols.sort();

        let per_symbol: Vec<Vec<TradingSignal>> = symbols
            .par_iter()
            .map(|symbol| {
                historical_signals(
                    &self.generator,
                    &self.history[*symbol],
                    symbol,
                    params,
                    self.step,
                )
            })
            .collect::<Result<_, _>>()?;

        let mut signals: Vec<TradingSignal> = per_symbol.into_iter().flatten().collect();
        signals.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        Ok(signals)
    }

    /// Full backtest for `params` over the stored history.
    pub fn backtest(&self, params: &ParameterSet) -> Result<(Vec<TradingSignal>, BacktestResult), SignalError> {
        let signals = self.signals(params)?;
        let result = self.backtester.run_by_symbol(&signals, &self.history);
        Ok((signals, result))
    }
}

impl CandidateScorer for BacktestScorer {
    fn score(&self, params: &ParameterSet) -> Result<f64, SignalError> {
        let (_, result) = self.backtest(params)?;
        let score = if result.total_trades < self.min_trades {
            0.0
        } else {
            result.win_rate
        };
        debug!(
            qubits = params.num_measurement_qubits,
            shots = params.shots,
            threshold = params.confidence_threshold,
            trades = result.total_trades,
            score,
            "candidate scored"
        );
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::BacktestConfig;
    use phasecast_core::data::{MarketDataSource, SyntheticSource, Timeframe};

    fn scorer() -> BacktestScorer {
        let source = SyntheticSource::default();
        let history: HashMap<String, Vec<PriceBar>> = ["EURUSD", "GBPUSD"]
            .iter()
            .map(|s| (s.to_string(), source.get_series(s, Timeframe::H1, 300).unwrap()))
            .collect();
        BacktestScorer::new(
            SignalGenerator::default(),
            Backtester::new(BacktestConfig::default()).unwrap(),
            history,
        )
        .with_step(10)
        .with_min_trades(1)
    }

    fn params() -> ParameterSet {
        ParameterSet {
            confidence_threshold: 0.5,
            lookback_periods: 60,
            ..Default::default()
        }
    }

    #[test]
    fn score_is_a_rate() {
        let score = scorer().score(&params()).unwrap();
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn scoring_is_deterministic() {
        let s = scorer();
        assert_eq!(s.score(&params()).unwrap(), s.score(&params()).unwrap());
    }

    #[test]
    fn signals_are_time_ordered() {
        let signals = scorer().signals(&params()).unwrap();
        assert!(signals
            .windows(2)
            .all(|w| w[0].created_at <= w[1].created_at));
    }

    #[test]
    fn too_few_trades_scores_zero() {
        let s = scorer().with_min_trades(usize::MAX);
        assert_eq!(s.score(&params()).unwrap(), 0.0);
    }

    #[test]
    fn invalid_params_error() {
        let bad = ParameterSet {
            shots: 3,
            ..params()
        };
        assert!(scorer().score(&bad).is_err());
    }
}
