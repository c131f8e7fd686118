//! Simulated phase-estimation measurement.
//!
//! For an eigenphase fraction `φ` and `N = 2^q` counting buckets, an ideal
//! phase-estimation readout returns bucket `k` with probability
//!
//! `P(k) = sin²(Nπδ) / (N² sin²(πδ))`, `δ = φ − k/N`
//!
//! which is 1 at `δ = 0` and spreads over neighbouring buckets when `φ` is not
//! an exact multiple of `1/N`. Finite sampling noise comes from drawing `shots`
//! outcomes from this distribution.

use std::collections::BTreeMap;
use std::f64::consts::{PI, TAU};

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// Below this `|sin(πδ)|` the bucket is treated as an exact hit.
const EXACT_HIT: f64 = 1e-12;

/// Closed-form outcome probabilities over `2^precision` buckets for `target_phase` radians.
///
/// The returned vector sums to 1.
pub fn outcome_probabilities(target_phase: f64, precision: u32) -> Vec<f64> {
    let buckets = 1usize << precision;
    let n = buckets as f64;
    let phi = (target_phase / TAU).rem_euclid(1.0);

    let mut probs: Vec<f64> = (0..buckets)
        .map(|k| {
            let x = PI * (phi - k as f64 / n);
            let s = x.sin();
            if s.abs() < EXACT_HIT {
                1.0
            } else {
                let ratio = (n * x).sin() / (n * s);
                ratio * ratio
            }
        })
        .collect();

    let total: f64 = probs.iter().sum();
    if total > 0.0 && total.is_finite() {
        for p in &mut probs {
            *p /= total;
        }
    }
    probs
}

/// Draw `shots` outcomes from `probabilities`, returning per-bucket counts.
///
/// An unusable weight vector (all zero, negative, or NaN) yields all-zero counts,
/// i.e. an empty measurement.
pub fn sample_counts<R: Rng + ?Sized>(probabilities: &[f64], shots: u32, rng: &mut R) -> Vec<u32> {
    let mut counts = vec![0u32; probabilities.len()];
    let Ok(dist) = WeightedIndex::new(probabilities) else {
        return counts;
    };
    for _ in 0..shots {
        counts[dist.sample(rng)] += 1;
    }
    counts
}

/// Normalise counts into a bucket → mass map, dropping empty buckets.
pub fn to_distribution(counts: &[u32]) -> BTreeMap<u32, f64> {
    let total: u64 = counts.iter().map(|&c| u64::from(c)).sum();
    if total == 0 {
        return BTreeMap::new();
    }
    counts
        .iter()
        .enumerate()
        .filter(|(_, &c)| c > 0)
        .map(|(k, &c)| (k as u32, f64::from(c) / total as f64))
        .collect()
}

/// Bucket with the most draws; ties resolve to the lowest index.
pub fn dominant_bucket(counts: &[u32]) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (k, &c) in counts.iter().enumerate() {
        if c == 0 {
            continue;
        }
        match best {
            Some((_, top)) if c <= top => {}
            _ => best = Some((k, c)),
        }
    }
    best.map(|(k, _)| k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn exact_bucket_phase_is_a_delta() {
        // φ = 0.25 with 16 buckets lands exactly on k = 4.
        let probs = outcome_probabilities(0.25 * TAU, 4);
        assert_eq!(probs.len(), 16);
        assert!((probs[4] - 1.0).abs() < 1e-9);
        assert!(probs.iter().enumerate().all(|(k, p)| k == 4 || *p < 1e-9));
    }

    #[test]
    fn probabilities_sum_to_one() {
        for &phase in &[0.0, 0.3, 1.7, 3.14, 5.9] {
            let total: f64 = outcome_probabilities(phase, 5).iter().sum();
            assert!((total - 1.0).abs() < 1e-9, "phase {phase}: total {total}");
        }
    }

    #[test]
    fn off_grid_phase_peaks_at_nearest_bucket() {
        // φ = 0.26 with 16 buckets: nearest bucket is 4 (0.25).
        let probs = outcome_probabilities(0.26 * TAU, 4);
        let peak = probs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(k, _)| k)
            .unwrap();
        assert_eq!(peak, 4);
        assert!(probs[4] < 1.0);
        assert!(probs[5] > 0.0);
    }

    #[test]
    fn sampling_is_seed_deterministic() {
        let probs = outcome_probabilities(1.0, 4);
        let a = sample_counts(&probs, 512, &mut StdRng::seed_from_u64(7));
        let b = sample_counts(&probs, 512, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert_eq!(a.iter().sum::<u32>(), 512);
    }

    #[test]
    fn unusable_weights_give_empty_counts() {
        let counts = sample_counts(&[0.0, 0.0], 100, &mut StdRng::seed_from_u64(1));
        assert_eq!(counts, vec![0, 0]);
        assert!(to_distribution(&counts).is_empty());
        assert_eq!(dominant_bucket(&counts), None);
    }

    #[test]
    fn distribution_drops_empty_buckets() {
        let dist = to_distribution(&[0, 3, 1, 0]);
        assert_eq!(dist.len(), 2);
        assert!((dist[&1] - 0.75).abs() < 1e-12);
        assert!((dist[&2] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn dominant_bucket_ties_pick_lowest() {
        assert_eq!(dominant_bucket(&[0, 5, 5, 2]), Some(1));
        assert_eq!(dominant_bucket(&[1, 0, 9]), Some(2));
    }
}
