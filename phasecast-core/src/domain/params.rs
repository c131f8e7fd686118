//! ParameterSet and the process-wide store that swaps it atomically.
//!
//! Readers take an `Arc<ParamSnapshot>` and hold it for one analysis cycle;
//! the optimizer's apply step is the only writer. A snapshot is never mutated
//! in place, so an in-flight analysis cannot observe a half-updated set.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

pub const QUBITS_MIN: u32 = 2;
pub const QUBITS_MAX: u32 = 8;
pub const SHOTS_MIN: u32 = 256;
pub const SHOTS_MAX: u32 = 8192;
pub const THRESHOLD_MIN: f64 = 0.5;
pub const THRESHOLD_MAX: f64 = 0.99;
/// Minimum window the estimator can compute a return over.
pub const LOOKBACK_MIN: usize = 2;

/// A parameter value outside its permitted range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("invalid parameter {field} = {value}: must be within {bounds}")]
    OutOfBounds {
        field: &'static str,
        value: String,
        bounds: &'static str,
    },
}

pub(crate) fn out_of_bounds(field: &'static str, value: impl ToString, bounds: &'static str) -> ParamError {
    ParamError::OutOfBounds {
        field,
        value: value.to_string(),
        bounds,
    }
}

/// Tunable estimator/generator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSet {
    pub num_measurement_qubits: u32,
    pub shots: u32,
    pub confidence_threshold: f64,
    pub min_risk_reward: f64,
    pub lookback_periods: usize,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            num_measurement_qubits: 4,
            shots: 1024,
            confidence_threshold: 0.85,
            min_risk_reward: 2.0,
            lookback_periods: 100,
        }
    }
}

impl ParameterSet {
    /// Check every bound, reporting the first violation.
    pub fn validate(&self) -> Result<(), ParamError> {
        if !(QUBITS_MIN..=QUBITS_MAX).contains(&self.num_measurement_qubits) {
            return Err(out_of_bounds(
                "num_measurement_qubits",
                self.num_measurement_qubits,
                "[2, 8]",
            ));
        }
        if !(SHOTS_MIN..=SHOTS_MAX).contains(&self.shots) {
            return Err(out_of_bounds("shots", self.shots, "[256, 8192]"));
        }
        if !(THRESHOLD_MIN..=THRESHOLD_MAX).contains(&self.confidence_threshold) {
            return Err(out_of_bounds(
                "confidence_threshold",
                self.confidence_threshold,
                "[0.5, 0.99]",
            ));
        }
        if !(self.min_risk_reward.is_finite() && self.min_risk_reward > 0.0) {
            return Err(out_of_bounds(
                "min_risk_reward",
                self.min_risk_reward,
                "(0, +inf)",
            ));
        }
        if self.lookback_periods < LOOKBACK_MIN {
            return Err(out_of_bounds(
                "lookback_periods",
                self.lookback_periods,
                "[2, +inf)",
            ));
        }
        Ok(())
    }

    /// BLAKE3 hash of the canonical JSON form. Stable across runs.
    pub fn fingerprint(&self) -> String {
        // Plain struct of numbers; serialization cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

/// An immutable, versioned view of the active parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSnapshot {
    pub version: u64,
    pub params: ParameterSet,
}

#[derive(Debug)]
struct StoreState {
    active: Arc<ParamSnapshot>,
    previous: Option<Arc<ParamSnapshot>>,
}

/// Single-writer, multi-reader holder of the active `ParameterSet`.
#[derive(Debug)]
pub struct ParameterStore {
    state: RwLock<StoreState>,
}

impl ParameterStore {
    /// Create a store with `initial` as version 1.
    pub fn new(initial: ParameterSet) -> Result<Self, ParamError> {
        initial.validate()?;
        Ok(Self {
            state: RwLock::new(StoreState {
                active: Arc::new(ParamSnapshot {
                    version: 1,
                    params: initial,
                }),
                previous: None,
            }),
        })
    }

    /// The active snapshot. Cheap: clones an `Arc`.
    pub fn snapshot(&self) -> Arc<ParamSnapshot> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&state.active)
    }

    pub fn version(&self) -> u64 {
        self.snapshot().version
    }

    /// The snapshot that `rollback` would restore, if any.
    pub fn previous(&self) -> Option<Arc<ParamSnapshot>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.previous.clone()
    }

    /// Validate and swap in `params`. On error nothing changes.
    ///
    /// Returns the new version number.
    pub fn replace(&self, params: ParameterSet) -> Result<u64, ParamError> {
        params.validate()?;
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let version = state.active.version + 1;
        let next = Arc::new(ParamSnapshot { version, params });
        let prior = std::mem::replace(&mut state.active, next);
        state.previous = Some(prior);
        Ok(version)
    }

    /// Restore the set that was active before the last `replace`.
    ///
    /// The restored parameters get a fresh version number. Returns `false` when
    /// there is nothing to roll back to.
    pub fn rollback(&self) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let Some(prior) = state.previous.take() else {
            return false;
        };
        let version = state.active.version + 1;
        state.active = Arc::new(ParamSnapshot {
            version,
            params: prior.params.clone(),
        });
        true
    }
}
