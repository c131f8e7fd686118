//! PhaseCast Runner — backtesting, optimization and engine orchestration.
//!
//! This crate builds on `phasecast-core` to provide:
//! - Trade replay against OHLC bars and aggregate performance metrics
//! - Walk-forward historical signal generation
//! - Outcome statistics, bounded parameter search, apply/rollback
//! - The `Engine`, which fans analysis out across the configured symbols
//! - CSV market data, JSON-lines delivery and JSON/CSV export

pub mod backtest;
pub mod config;
pub mod data_loader;
pub mod engine;
pub mod export;
pub mod metrics;
pub mod optimizer;
pub mod sink;

pub use backtest::{
    historical_signals, BacktestConfig, BacktestError, BacktestResult, Backtester, ExitReason,
    Trade,
};
pub use config::{ConfigError, EngineConfig};
pub use data_loader::CsvSource;
pub use engine::{AnalysisCycle, BatchAnalysis, Engine, EngineError, SystemValidation};
pub use optimizer::{
    collect_performance, BacktestScorer, CandidateScorer, OptimizationReport, OptimizationResult,
    OutcomeRecord, PerformanceStats, SearchSpace, SignalOptimizer,
};
pub use sink::{JsonLinesSink, MemorySink, RecordStore, SignalSink, SinkError};
