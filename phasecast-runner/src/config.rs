//! Serializable engine configuration.
//!
//! Everything the engine needs arrives in one `EngineConfig` at construction
//! time. Reading it from a file or the environment is the CLI's job.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use phasecast_core::data::Timeframe;
use phasecast_core::domain::{ParamError, ParameterSet};

use crate::backtest::BacktestConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no symbols configured")]
    NoSymbols,

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error(transparent)]
    InvalidParameter(#[from] ParamError),
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidField {
        field,
        reason: reason.into(),
    }
}

/// Configuration for one engine instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Symbols analysed on every cycle.
    pub symbols: Vec<String>,

    /// Default bar interval.
    pub timeframe: Timeframe,

    /// Initial active parameter set.
    pub params: ParameterSet,

    /// Fraction of balance risked per backtested trade, in (0, 1).
    pub risk_per_trade: f64,

    pub initial_balance: f64,

    /// Flat commission deducted per backtested trade.
    pub commission: f64,

    /// Minimum confidence for a signal to be handed to delivery.
    pub delivery_confidence_floor: f64,

    /// Extra bars fetched beyond the lookback window.
    pub history_padding: usize,

    /// Backtest exits at the close of this many bars if neither level is hit.
    pub max_holding_bars: Option<usize>,

    /// Master seed for sampling and synthetic data.
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbols: ["EURUSD", "GBPUSD", "USDJPY", "AUDUSD", "USDCAD"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeframe: Timeframe::H1,
            params: ParameterSet::default(),
            risk_per_trade: 0.02,
            initial_balance: 10_000.0,
            commission: 0.0,
            delivery_confidence_floor: 0.85,
            history_padding: 50,
            max_holding_bars: None,
            seed: 42,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.is_empty() {
            return Err(ConfigError::NoSymbols);
        }
        if let Some(blank) = self.symbols.iter().find(|s| s.trim().is_empty()) {
            return Err(invalid("symbols", format!("blank symbol {blank:?}")));
        }
        self.params.validate()?;
        self.backtest_config().validate()?;
        if !(0.0..=1.0).contains(&self.delivery_confidence_floor) {
            return Err(invalid(
                "delivery_confidence_floor",
                format!("{} is outside [0, 1]", self.delivery_confidence_floor),
            ));
        }
        Ok(())
    }

    /// Number of bars to request per symbol for one analysis.
    pub fn bars_needed(&self, params: &ParameterSet) -> usize {
        params.lookback_periods + self.history_padding
    }

    pub fn backtest_config(&self) -> BacktestConfig {
        BacktestConfig {
            initial_balance: self.initial_balance,
            risk_per_trade: self.risk_per_trade,
            commission: self.commission,
            max_holding_bars: self.max_holding_bars,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_balance.is_finite() && self.initial_balance > 0.0) {
            return Err(invalid(
                "initial_balance",
                format!("{} must be positive", self.initial_balance),
            ));
        }
        if !(self.risk_per_trade > 0.0 && self.risk_per_trade < 1.0) {
            return Err(invalid(
                "risk_per_trade",
                format!("{} is outside (0, 1)", self.risk_per_trade),
            ));
        }
        if !(self.commission.is_finite() && self.commission >= 0.0) {
            return Err(invalid(
                "commission",
                format!("{} must be non-negative", self.commission),
            ));
        }
        if self.max_holding_bars == Some(0) {
            return Err(invalid("max_holding_bars", "must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_symbols_rejected() {
        let config = EngineConfig {
            symbols: vec![],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoSymbols)));
    }

    #[test]
    fn risk_must_be_fractional() {
        let config = EngineConfig {
            risk_per_trade: 1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidField {
                field: "risk_per_trade",
                ..
            })
        ));
    }

    #[test]
    fn bad_params_surface_as_parameter_error() {
        let mut config = EngineConfig::default();
        config.params.num_measurement_qubits = 12;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter(_))
        ));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"symbols":["EURUSD"],"timeframe":"M15"}"#).unwrap();
        assert_eq!(config.symbols, vec!["EURUSD"]);
        assert_eq!(config.timeframe, Timeframe::M15);
        assert_eq!(config.history_padding, 50);
        assert_eq!(config.params, ParameterSet::default());
    }

    #[test]
    fn bars_needed_adds_padding() {
        let config = EngineConfig::default();
        assert_eq!(config.bars_needed(&config.params), 150);
    }

    #[test]
    fn shipped_toml_matches_defaults() {
        let text = include_str!("../../configs/default.toml");
        let config: EngineConfig = toml::from_str(text).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.validate().is_ok());
    }
}
