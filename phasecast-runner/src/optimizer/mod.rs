//! Closed-loop parameter tuning.
//!
//! Outcome statistics form the baseline, a bounded search over estimator
//! parameters scores each candidate, and the winner is applied to the shared
//! parameter store only on request, with rollback available.

pub mod outcomes;
pub mod scorer;
pub mod search;
pub mod signal_optimizer;

pub use outcomes::{
    collect_performance, confidence_bin, outcomes_from_backtest, GroupStats, OutcomeRecord,
    PerformanceStats, Session,
};
pub use scorer::{BacktestScorer, CandidateScorer};
pub use search::SearchSpace;
pub use signal_optimizer::{
    Candidate, OptimizationReport, OptimizationResult, PerformanceSummary, SignalOptimizer,
};
