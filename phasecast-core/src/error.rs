//! Errors shared across the estimation pipeline.

use thiserror::Error;

/// Not enough bars (or prices) to run an estimation or generation.
///
/// Recoverable: the caller should skip the symbol or retry with more history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("insufficient data: need {required} points, have {available}")]
pub struct InsufficientData {
    pub required: usize,
    pub available: usize,
}
