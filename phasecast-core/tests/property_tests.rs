//! Property tests for estimator and signal invariants.
//!
//! Uses proptest to verify:
//! 1. Strength is always in [0, 1] and the dominant phase in [0, 2π)
//! 2. Estimation is idempotent for a fixed seed
//! 3. BUY/SELL signals respect stop/entry/target ordering; HOLD carries no targets
//! 4. Parameter validation gates the store: a rejected set never becomes active

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use std::f64::consts::TAU;

use phasecast_core::cycle::PhaseEstimator;
use phasecast_core::domain::{ParameterSet, ParameterStore, PriceBar, SignalAction};
use phasecast_core::signal::SignalGenerator;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_prices(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.5..2.0_f64, min_len..max_len)
}

fn arb_walk(len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.004..0.004_f64, len).prop_map(|returns| {
        let mut price = 1.2;
        returns
            .into_iter()
            .map(|r| {
                price *= 1.0 + r;
                price
            })
            .collect()
    })
}

fn to_bars(prices: &[f64]) -> Vec<PriceBar> {
    let start = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| PriceBar {
            timestamp: start + Duration::hours(i as i64),
            open: p,
            high: p * 1.001,
            low: p * 0.999,
            close: p,
            volume: 100,
        })
        .collect()
}

// ── 1. Estimate ranges ───────────────────────────────────────────────

proptest! {
    #[test]
    fn strength_and_phase_in_range(
        prices in arb_prices(2, 80),
        precision in 2u32..=8,
        shots in 256u32..2048,
        seed in any::<u64>(),
    ) {
        let window = prices.len();
        let cycle = PhaseEstimator::new(precision, shots, seed)
            .unwrap()
            .estimate(&prices, window)
            .unwrap();
        prop_assert!((0.0..=1.0).contains(&cycle.strength));
        prop_assert!((0.0..TAU).contains(&cycle.dominant_phase));
        prop_assert!((0.0..TAU).contains(&cycle.target_phase));
        let mass: f64 = cycle.raw_distribution.values().sum();
        prop_assert!((mass - 1.0).abs() < 1e-9);
        if cycle.dominant_phase == 0.0 {
            prop_assert!(cycle.dominant_period.is_infinite());
        } else {
            prop_assert!((cycle.dominant_period - TAU / cycle.dominant_phase).abs() < 1e-9);
        }
    }
}

// ── 2. Idempotence ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn estimate_is_idempotent(prices in arb_prices(2, 60), seed in any::<u64>()) {
        let estimator = PhaseEstimator::new(5, 1024, seed).unwrap();
        let a = estimator.estimate(&prices, prices.len()).unwrap();
        let b = estimator.estimate(&prices, prices.len()).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn window_longer_than_prices_fails(prices in arb_prices(2, 30)) {
        let estimator = PhaseEstimator::new(4, 512, 1).unwrap();
        prop_assert!(estimator.estimate(&prices, prices.len() + 1).is_err());
    }
}

// ── 3. Signal ordering ───────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn signals_are_well_formed(
        prices in arb_walk(120),
        threshold in 0.5..0.99_f64,
        qubits in 2u32..=8,
        seed in any::<u64>(),
    ) {
        let params = ParameterSet {
            num_measurement_qubits: qubits,
            confidence_threshold: threshold,
            min_risk_reward: 1.0,
            ..Default::default()
        };
        let generator = SignalGenerator::new(phasecast_core::rng::SeedHierarchy::new(seed));
        let signal = generator.generate(&to_bars(&prices), "EURUSD", &params).unwrap();

        prop_assert!(signal.is_well_formed());
        prop_assert_eq!(signal.entry_price, prices[prices.len() - 1]);
        match signal.action {
            SignalAction::Buy => {
                prop_assert!(signal.stop_loss.unwrap() < signal.entry_price);
                prop_assert!(signal.entry_price < signal.take_profit.unwrap());
                prop_assert!(signal.confidence >= threshold);
            }
            SignalAction::Sell => {
                prop_assert!(signal.take_profit.unwrap() < signal.entry_price);
                prop_assert!(signal.entry_price < signal.stop_loss.unwrap());
                prop_assert!(signal.confidence >= threshold);
            }
            SignalAction::Hold => {
                prop_assert!(signal.stop_loss.is_none());
                prop_assert!(signal.take_profit.is_none());
                prop_assert!(signal.risk_reward.is_none());
            }
        }
    }
}

// ── 4. Store gating ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn rejected_params_never_become_active(qubits in 0u32..20, shots in 0u32..10_000) {
        let store = ParameterStore::new(ParameterSet::default()).unwrap();
        let candidate = ParameterSet {
            num_measurement_qubits: qubits,
            shots,
            ..Default::default()
        };
        let valid = candidate.validate().is_ok();
        let result = store.replace(candidate.clone());
        prop_assert_eq!(result.is_ok(), valid);
        if valid {
            prop_assert_eq!(&store.snapshot().params, &candidate);
        } else {
            prop_assert_eq!(&store.snapshot().params, &ParameterSet::default());
            prop_assert_eq!(store.version(), 1);
        }
    }
}
