//! Phase/cycle estimation.
//!
//! A price window is encoded to a single target phase, a phase-estimation
//! measurement of that phase is simulated by drawing `shots` outcomes from the
//! closed-form outcome distribution over `2^q` buckets, and the sampled
//! distribution yields a dominant phase, a period, and an entropy-based
//! strength. The sampler is a classical statistical procedure; no quantum
//! runtime is involved.

pub mod encode;
pub mod entropy;
pub mod estimator;
pub mod measurement;

pub use encode::encode_phase;
pub use entropy::{shannon_entropy, strength};
pub use estimator::PhaseEstimator;
pub use measurement::{outcome_probabilities, sample_counts};
