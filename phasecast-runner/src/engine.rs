//! Engine — owns the parameter store and fans analysis out across symbols.
//!
//! One analysis cycle reads a single parameter snapshot, analyses every
//! configured symbol on a private rayon pool, keeps the most confident
//! actionable signals and hands them to the sink, if any. A failing symbol is
//! recorded in the cycle's `failures` and never aborts the others.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use phasecast_core::data::{DataError, MarketDataSource, SyntheticSource, Timeframe};
use phasecast_core::domain::{ParamSnapshot, ParameterSet, ParameterStore, TradingSignal};
use phasecast_core::rng::SeedHierarchy;
use phasecast_core::signal::{filter_actionable, SignalError, SignalGenerator};

use crate::config::{ConfigError, EngineConfig};
use crate::sink::{SignalSink, SinkError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error("delivery failed: {0}")]
    Sink(#[from] SinkError),
}

/// Per-symbol outcome of one fan-out.
#[derive(Debug, Default)]
pub struct BatchAnalysis {
    /// Directional signals, ordered by symbol.
    pub signals: Vec<TradingSignal>,
    /// Symbols that produced HOLD.
    pub holds: Vec<String>,
    /// Symbol → error message.
    pub failures: BTreeMap<String, String>,
}

/// The single payload produced by `run_analysis_cycle`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisCycle {
    pub started_at: DateTime<Utc>,
    pub timeframe: Timeframe,
    pub params_version: u64,
    pub params: ParameterSet,
    pub symbols_analyzed: usize,
    /// Actionable signals, highest confidence first.
    pub signals: Vec<TradingSignal>,
    pub failures: BTreeMap<String, String>,
    /// Number of signals handed to the sink (0 without one).
    pub delivered: usize,
}

/// Health report from `validate_system`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemValidation {
    pub source_available: bool,
    pub symbols_configured: bool,
    pub params_valid: bool,
    pub signal_generation_working: bool,
}

impl SystemValidation {
    pub fn all_ok(&self) -> bool {
        self.source_available
            && self.symbols_configured
            && self.params_valid
            && self.signal_generation_working
    }
}

pub struct Engine {
    config: EngineConfig,
    source: Arc<dyn MarketDataSource>,
    store: Arc<ParameterStore>,
    generator: SignalGenerator,
    sink: Option<Arc<dyn SignalSink>>,
    running: AtomicBool,
}

impl Engine {
    pub fn new(config: EngineConfig, source: Arc<dyn MarketDataSource>) -> Result<Self, EngineError> {
        config.validate()?;
        let store = ParameterStore::new(config.params.clone()).map_err(ConfigError::from)?;
        let generator = SignalGenerator::new(SeedHierarchy::new(config.seed));

        info!(
            symbols = config.symbols.len(),
            timeframe = %config.timeframe,
            source = source.name(),
            qubits = config.params.num_measurement_qubits,
            threshold = config.params.confidence_threshold,
            "engine initialised"
        );

        Ok(Self {
            config,
            source,
            store: Arc::new(store),
            generator,
            sink: None,
            running: AtomicBool::new(false),
        })
    }

    pub fn with_sink(mut self, sink: Arc<dyn SignalSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Shared handle for the optimizer's apply/rollback.
    pub fn store(&self) -> Arc<ParameterStore> {
        Arc::clone(&self.store)
    }

    pub fn params(&self) -> Arc<ParamSnapshot> {
        self.store.snapshot()
    }

    pub fn generator(&self) -> &SignalGenerator {
        &self.generator
    }

    /// Mark the engine running. An unavailable source is logged, not fatal.
    pub fn start(&self) -> bool {
        if self.source.is_available() {
            info!(source = self.source.name(), "market data source available");
        } else {
            warn!(source = self.source.name(), "market data source unavailable");
        }
        self.running.store(true, Ordering::Relaxed);
        info!("engine started");
        true
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
        info!("engine stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Fetch and analyse one symbol with the given snapshot. HOLD is a valid result.
    pub fn analyze_symbol(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        snapshot: &ParamSnapshot,
    ) -> Result<TradingSignal, EngineError> {
        let count = self.config.bars_needed(&snapshot.params);
        let series = self.source.get_series(symbol, timeframe, count)?;
        let signal = self.generator.generate(&series, symbol, &snapshot.params)?;
        Ok(signal)
    }

    /// Analyse every configured symbol against the active snapshot.
    pub fn analyze_all(&self, timeframe: Timeframe) -> BatchAnalysis {
        let snapshot = self.store.snapshot();
        self.analyze_with(timeframe, &snapshot)
    }

    fn analyze_with(&self, timeframe: Timeframe, snapshot: &ParamSnapshot) -> BatchAnalysis {
        let symbols = &self.config.symbols;
        let analyze = |symbol: &String| (symbol.clone(), self.analyze_symbol(symbol, timeframe, snapshot));

        let results: Vec<(String, Result<TradingSignal, EngineError>)> =
            match rayon::ThreadPoolBuilder::new()
                .num_threads(symbols.len())
                .thread_name(|i| format!("phasecast-analysis-{i}"))
                .build()
            {
                Ok(pool) => pool.install(|| symbols.par_iter().map(&analyze).collect()),
                Err(e) => {
                    warn!(error = %e, "analysis pool unavailable, running sequentially");
                    symbols.iter().map(&analyze).collect()
                }
            };

        let mut batch = BatchAnalysis::default();
        for (symbol, result) in results {
            match result {
                Ok(signal) if signal.is_hold() => batch.holds.push(symbol),
                Ok(signal) => batch.signals.push(signal),
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "symbol analysis failed");
                    batch.failures.insert(symbol, e.to_string());
                }
            }
        }
        batch.signals.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        info!(
            symbols = symbols.len(),
            signals = batch.signals.len(),
            holds = batch.holds.len(),
            failures = batch.failures.len(),
            "analysis complete"
        );
        batch
    }

    /// Analyse all symbols, keep up to `max_signals` deliverable signals by
    /// confidence and hand them to the sink.
    pub fn run_analysis_cycle(
        &self,
        timeframe: Timeframe,
        max_signals: Option<usize>,
    ) -> Result<AnalysisCycle, EngineError> {
        let started_at = Utc::now();
        let snapshot = self.store.snapshot();
        let batch = self.analyze_with(timeframe, &snapshot);

        let mut signals = filter_actionable(batch.signals, self.config.delivery_confidence_floor);
        signals.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        if let Some(max) = max_signals {
            signals.truncate(max);
        }

        let delivered = match &self.sink {
            Some(sink) if !signals.is_empty() => {
                sink.deliver(&signals)?;
                signals.len()
            }
            _ => 0,
        };

        info!(
            version = snapshot.version,
            signals = signals.len(),
            delivered,
            failures = batch.failures.len(),
            "analysis cycle complete"
        );

        Ok(AnalysisCycle {
            started_at,
            timeframe,
            params_version: snapshot.version,
            params: snapshot.params.clone(),
            symbols_analyzed: self.config.symbols.len(),
            signals,
            failures: batch.failures,
            delivered,
        })
    }

    /// Check the collaborators and run one signal on synthetic data.
    pub fn validate_system(&self) -> SystemValidation {
        let snapshot = self.store.snapshot();
        let params = &snapshot.params;

        let probe = SyntheticSource::new(SeedHierarchy::new(self.config.seed));
        let signal_generation_working = probe
            .get_series("EURUSD", self.config.timeframe, params.lookback_periods)
            .map_err(EngineError::from)
            .and_then(|bars| {
                self.generator
                    .generate(&bars, "EURUSD", params)
                    .map_err(EngineError::from)
            })
            .map(|signal| signal.is_well_formed())
            .unwrap_or_else(|e| {
                warn!(error = %e, "signal generation probe failed");
                false
            });

        let validation = SystemValidation {
            source_available: self.source.is_available(),
            symbols_configured: !self.config.symbols.is_empty(),
            params_valid: params.validate().is_ok(),
            signal_generation_working,
        };
        info!(
            passed = validation.all_ok(),
            source_available = validation.source_available,
            signal_generation_working,
            "system validation"
        );
        validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    fn config(symbols: &[&str]) -> EngineConfig {
        EngineConfig {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            params: ParameterSet {
                confidence_threshold: 0.5,
                ..Default::default()
            },
            delivery_confidence_floor: 0.0,
            ..Default::default()
        }
    }

    fn engine(symbols: &[&str], source: SyntheticSource) -> Engine {
        Engine::new(config(symbols), Arc::new(source)).unwrap()
    }

    #[test]
    fn invalid_config_rejected() {
        let result = Engine::new(config(&[]), Arc::new(SyntheticSource::default()));
        assert!(matches!(
            result,
            Err(EngineError::Config(ConfigError::NoSymbols))
        ));
    }

    #[test]
    fn lifecycle_flags() {
        let e = engine(&["EURUSD"], SyntheticSource::default());
        assert!(!e.is_running());
        assert!(e.start());
        assert!(e.is_running());
        e.stop();
        assert!(!e.is_running());
    }

    #[test]
    fn every_symbol_accounted_for() {
        let e = engine(
            &["EURUSD", "GBPUSD", "USDJPY"],
            SyntheticSource::default().with_unavailable("USDJPY"),
        );
        let batch = e.analyze_all(Timeframe::H1);
        assert_eq!(
            batch.signals.len() + batch.holds.len() + batch.failures.len(),
            3
        );
        assert!(batch.failures.contains_key("USDJPY"));
    }

    #[test]
    fn cycle_is_ordered_by_confidence_and_capped() {
        let e = engine(
            &["EURUSD", "GBPUSD", "AUDUSD", "USDCAD"],
            SyntheticSource::default(),
        );
        let cycle = e.run_analysis_cycle(Timeframe::H1, Some(2)).unwrap();
        assert!(cycle.signals.len() <= 2);
        assert!(cycle
            .signals
            .windows(2)
            .all(|w| w[0].confidence >= w[1].confidence));
        assert_eq!(cycle.params_version, 1);
        assert_eq!(cycle.symbols_analyzed, 4);
    }

    #[test]
    fn sink_receives_cycle_signals() {
        let sink = Arc::new(MemorySink::new());
        let e = engine(&["EURUSD", "GBPUSD"], SyntheticSource::default())
            .with_sink(Arc::clone(&sink) as Arc<dyn SignalSink>);
        let cycle = e.run_analysis_cycle(Timeframe::H1, None).unwrap();
        assert_eq!(cycle.delivered, cycle.signals.len());
        assert_eq!(sink.delivered().len(), cycle.signals.len());
    }

    #[test]
    fn cycle_reports_applied_version() {
        let e = engine(&["EURUSD"], SyntheticSource::default());
        let next = ParameterSet {
            shots: 2048,
            ..e.params().params.clone()
        };
        e.store().replace(next).unwrap();
        let cycle = e.run_analysis_cycle(Timeframe::H1, None).unwrap();
        assert_eq!(cycle.params_version, 2);
        assert_eq!(cycle.params.shots, 2048);
    }

    #[test]
    fn validation_passes_on_synthetic_source() {
        let e = engine(&["EURUSD"], SyntheticSource::default());
        assert!(e.validate_system().all_ok());
    }
}
