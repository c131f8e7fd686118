//! Entropy-based confidence.

/// Shannon entropy in bits over a probability mass iterator. Zero masses are ignored.
pub fn shannon_entropy<I>(masses: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    masses
        .into_iter()
        .filter(|p| *p > 0.0)
        .map(|p| -p * p.log2())
        .sum()
}

/// `1 − H(p)/log2(n)` where `n` is the number of buckets with nonzero mass.
///
/// One occupied bucket gives 1.0 and an empty distribution gives 0.0. The
/// result is clamped to `[0, 1]`.
pub fn strength<I>(masses: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let occupied: Vec<f64> = masses.into_iter().filter(|p| *p > 0.0).collect();
    match occupied.len() {
        0 => 0.0,
        1 => 1.0,
        n => {
            let h_max = (n as f64).log2();
            let h = shannon_entropy(occupied.iter().copied());
            (1.0 - h / h_max).clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_has_zero_strength() {
        assert!(strength([0.25, 0.25, 0.25, 0.25]).abs() < 1e-12);
    }

    #[test]
    fn single_bucket_is_full_strength() {
        assert_eq!(strength([1.0]), 1.0);
    }

    #[test]
    fn empty_is_zero_strength() {
        assert_eq!(strength(std::iter::empty()), 0.0);
    }

    #[test]
    fn concentrated_mass_is_strong() {
        let s = strength([0.98, 0.01, 0.01]);
        assert!(s > 0.8 && s < 1.0, "strength {s}");
    }

    #[test]
    fn entropy_of_fair_coin_is_one_bit() {
        assert!((shannon_entropy([0.5, 0.5]) - 1.0).abs() < 1e-12);
    }
}
