//! SignalOptimizer — grid search against an outcome baseline, apply, rollback.
//!
//! The optimizer is the only writer of the shared `ParameterStore`. Search is
//! read-only: candidates are scored one at a time, with cancellation checked
//! before each, and nothing is applied until `apply` is called explicitly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use phasecast_core::domain::{ParamError, ParameterSet, ParameterStore};

use super::outcomes::PerformanceStats;
use super::scorer::CandidateScorer;
use super::search::SearchSpace;

/// Number of best-scoring improvements kept in a result.
pub const TOP_CANDIDATES: usize = 3;

/// A candidate that beat the running best when it was scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub params: ParameterSet,
    pub score: f64,
    /// Score minus the baseline win rate.
    pub improvement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub current_params: ParameterSet,
    pub optimized_params: ParameterSet,
    pub current_win_rate: f64,
    pub expected_win_rate: f64,
    pub expected_improvement: f64,
    pub improvement_pct: f64,
    /// Candidates that strictly improved on the running best.
    pub candidates_found: usize,
    pub candidates_evaluated: usize,
    pub top_candidates: Vec<Candidate>,
    pub cancelled: bool,
}

impl OptimizationResult {
    pub fn improved(&self) -> bool {
        self.candidates_found > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub win_rate: f64,
    pub total_signals: usize,
    pub avg_profit: f64,
    pub profit_factor: f64,
}

/// Human-facing summary of an optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub generated_at: DateTime<Utc>,
    pub current_performance: PerformanceSummary,
    pub optimization: OptimizationResult,
    pub symbol_insights: Vec<String>,
    pub recommendations: Vec<String>,
}

pub struct SignalOptimizer {
    store: Arc<ParameterStore>,
}

impl SignalOptimizer {
    pub fn new(store: Arc<ParameterStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<ParameterStore> {
        &self.store
    }

    /// Search `space` around the active parameters.
    ///
    /// The running best starts at `baseline.win_rate`; a candidate is kept only
    /// when its score is strictly greater. Scoring failures are logged and the
    /// candidate is skipped.
    pub fn optimize(
        &self,
        baseline: &PerformanceStats,
        space: &SearchSpace,
        scorer: &dyn CandidateScorer,
        cancel: Option<&AtomicBool>,
    ) -> OptimizationResult {
        let current = self.store.snapshot().params.clone();
        let current_win_rate = baseline.win_rate;
        let candidates = space.candidates(&current);
        info!(
            baseline_win_rate = current_win_rate,
            candidates = candidates.len(),
            "optimization started"
        );

        let mut best_params = current.clone();
        let mut best_score = current_win_rate;
        let mut improvements: Vec<Candidate> = Vec::new();
        let mut evaluated = 0usize;
        let mut cancelled = false;

        for candidate in candidates {
            if cancel.is_some_and(|f| f.load(Ordering::Relaxed)) {
                cancelled = true;
                break;
            }
            let score = match scorer.score(&candidate) {
                Ok(score) => score,
                Err(e) => {
                    warn!(error = %e, "candidate scoring failed");
                    continue;
                }
            };
            evaluated += 1;
            if score > best_score {
                best_score = score;
                best_params = candidate.clone();
                improvements.push(Candidate {
                    params: candidate,
                    score,
                    improvement: score - current_win_rate,
                });
            }
        }

        let candidates_found = improvements.len();
        improvements.sort_by(|a, b| b.score.total_cmp(&a.score));
        improvements.truncate(TOP_CANDIDATES);

        let expected_improvement = best_score - current_win_rate;
        let result = OptimizationResult {
            current_params: current,
            optimized_params: best_params,
            current_win_rate,
            expected_win_rate: best_score,
            expected_improvement,
            improvement_pct: if current_win_rate > 0.0 {
                expected_improvement / current_win_rate * 100.0
            } else {
                0.0
            },
            candidates_found,
            candidates_evaluated: evaluated,
            top_candidates: improvements,
            cancelled,
        };
        info!(
            evaluated,
            found = candidates_found,
            expected_improvement,
            cancelled,
            "optimization complete"
        );
        result
    }

    /// Validate and activate `params`. On failure nothing changes.
    pub fn try_apply(&self, params: &ParameterSet) -> Result<u64, ParamError> {
        let version = self.store.replace(params.clone())?;
        info!(
            version,
            qubits = params.num_measurement_qubits,
            shots = params.shots,
            threshold = params.confidence_threshold,
            "parameters applied"
        );
        Ok(version)
    }

    /// `try_apply` reduced to success/failure.
    pub fn apply(&self, params: &ParameterSet) -> bool {
        match self.try_apply(params) {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "parameters rejected");
                false
            }
        }
    }

    /// Restore the set active before the last successful apply.
    pub fn rollback(&self) -> bool {
        let restored = self.store.rollback();
        if restored {
            info!(version = self.store.version(), "parameters rolled back");
        }
        restored
    }

    pub fn report(&self, baseline: &PerformanceStats, result: &OptimizationResult) -> OptimizationReport {
        OptimizationReport {
            generated_at: Utc::now(),
            current_performance: PerformanceSummary {
                win_rate: baseline.win_rate,
                total_signals: baseline.total,
                avg_profit: baseline.avg_profit,
                profit_factor: baseline.profit_factor,
            },
            optimization: result.clone(),
            symbol_insights: symbol_insights(baseline),
            recommendations: recommendations(baseline, result),
        }
    }
}

fn symbol_insights(baseline: &PerformanceStats) -> Vec<String> {
    baseline
        .by_symbol
        .iter()
        .map(|(symbol, stats)| {
            let rate = stats.win_rate * 100.0;
            if stats.win_rate >= 0.97 {
                format!("{symbol}: excellent ({rate:.1}% win rate), maintain current approach")
            } else if stats.win_rate >= 0.90 {
                format!("{symbol}: good ({rate:.1}% win rate), minor optimization potential")
            } else {
                format!("{symbol}: needs optimization ({rate:.1}% win rate)")
            }
        })
        .collect()
}

fn recommendations(baseline: &PerformanceStats, result: &OptimizationResult) -> Vec<String> {
    let mut out = Vec::new();
    if result.expected_improvement > 0.01 {
        out.push(format!(
            "Apply optimized parameters for +{:.2}% win rate",
            result.expected_improvement * 100.0
        ));
    }
    if baseline
        .by_confidence
        .get("0.95-1.00")
        .is_some_and(|g| g.win_rate > 0.98)
    {
        out.push("Consider raising the confidence threshold to 0.95".to_string());
    }
    let weak: Vec<&str> = baseline
        .by_symbol
        .iter()
        .filter(|(_, g)| g.win_rate < 0.90)
        .map(|(s, _)| s.as_str())
        .collect();
    if !weak.is_empty() {
        out.push(format!(
            "Reduce exposure to underperforming symbols: {}",
            weak.join(", ")
        ));
    }
    out
}
