//! Parameter search space for grid or sampled search.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use phasecast_core::domain::ParameterSet;

/// Candidate values for the estimator parameters under search.
///
/// `min_risk_reward` and `lookback_periods` are held at the baseline's values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSpace {
    pub num_measurement_qubits: Vec<u32>,
    pub shots: Vec<u32>,
    pub confidence_threshold: Vec<f64>,
    /// Evaluate a seeded random subset of this size when the grid is larger.
    pub max_candidates: Option<usize>,
    pub seed: u64,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            num_measurement_qubits: vec![3, 4, 5, 6],
            shots: vec![512, 1024, 2048, 4096],
            confidence_threshold: vec![0.80, 0.85, 0.90, 0.95],
            max_candidates: None,
            seed: 42,
        }
    }
}

impl SearchSpace {
    /// Size of the full cross product, including out-of-bound combinations.
    pub fn grid_size(&self) -> usize {
        self.num_measurement_qubits.len() * self.shots.len() * self.confidence_threshold.len()
    }

    /// Every in-bound candidate in grid order (qubits, then shots, then threshold),
    /// sampled down to `max_candidates` when set.
    pub fn candidates(&self, baseline: &ParameterSet) -> Vec<ParameterSet> {
        let mut grid = Vec::with_capacity(self.grid_size());
        for &num_measurement_qubits in &self.num_measurement_qubits {
            for &shots in &self.shots {
                for &confidence_threshold in &self.confidence_threshold {
                    let candidate = ParameterSet {
                        num_measurement_qubits,
                        shots,
                        confidence_threshold,
                        ..baseline.clone()
                    };
                    if candidate.validate().is_ok() {
                        grid.push(candidate);
                    }
                }
            }
        }

        match self.max_candidates {
            Some(max) if max < grid.len() => {
                let mut rng = StdRng::seed_from_u64(self.seed);
                let mut picked = index::sample(&mut rng, grid.len(), max).into_vec();
                picked.sort_unstable();
                picked.into_iter().map(|i| grid[i].clone()).collect()
            }
            _ => grid,
        }
    }
}
