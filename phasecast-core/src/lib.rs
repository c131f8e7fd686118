//! PhaseCast Core — domain types, cycle estimation, signal generation, parameters.
//!
//! This crate contains the analysis pipeline and nothing that touches files,
//! the network, or the environment:
//! - Domain types (bars, cycle estimates, signals, parameter sets)
//! - Market data source trait with a seeded synthetic generator
//! - Simulated phase-estimation sampler and entropy-based strength
//! - Signal generator with moving-average and volatility confirmation
//! - Versioned parameter store swapped atomically by the optimizer
//! - Deterministic seed hierarchy for reproducible sampling

pub mod cycle;
pub mod data;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod rng;
pub mod signal;

pub use error::InsufficientData;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types shared across the engine's worker pool are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::PriceBar>();
        require_sync::<domain::PriceBar>();
        require_send::<domain::CycleEstimate>();
        require_sync::<domain::CycleEstimate>();
        require_send::<domain::TradingSignal>();
        require_sync::<domain::TradingSignal>();
        require_send::<domain::ParameterSet>();
        require_sync::<domain::ParameterSet>();
        require_send::<domain::ParameterStore>();
        require_sync::<domain::ParameterStore>();

        // Pipeline
        require_send::<cycle::PhaseEstimator>();
        require_sync::<cycle::PhaseEstimator>();
        require_send::<signal::SignalGenerator>();
        require_sync::<signal::SignalGenerator>();
        require_send::<data::SyntheticSource>();
        require_sync::<data::SyntheticSource>();
        require_send::<rng::SeedHierarchy>();
        require_sync::<rng::SeedHierarchy>();
    }

    /// Architecture contract: the data source is usable as a shared trait object.
    #[test]
    fn market_data_source_is_object_safe() {
        fn _check(source: &dyn data::MarketDataSource) -> bool {
            source.is_available()
        }
        let source = data::SyntheticSource::default();
        assert!(_check(&source));
    }
}
