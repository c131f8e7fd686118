//! Deterministic seed hierarchy.
//!
//! A master seed generates sub-seeds for each `(scope, key)` pair, where the
//! scope is usually a symbol and the key a bar timestamp or iteration number.
//! Sub-seeds are derived via BLAKE3 hashing, independently of the order in
//! which symbols are processed, so parallel fan-out stays reproducible.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedHierarchy {
    master_seed: u64,
}

impl SeedHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive a deterministic sub-seed for `(scope, key)`.
    pub fn sub_seed(&self, scope: &str, key: i64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(scope.as_bytes());
        hasher.update(&key.to_le_bytes());
        let hash = hasher.finalize();
        let mut first = [0u8; 8];
        first.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(first)
    }

    /// Create a seeded StdRng for `(scope, key)`.
    pub fn rng_for(&self, scope: &str, key: i64) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(scope, key))
    }
}

impl Default for SeedHierarchy {
    fn default() -> Self {
        Self::new(42)
    }
}
