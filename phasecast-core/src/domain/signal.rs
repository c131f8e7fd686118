//! TradingSignal — a directional recommendation with price targets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Recommended action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalAction {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SignalAction::Buy => "BUY",
            SignalAction::Sell => "SELL",
            SignalAction::Hold => "HOLD",
        };
        f.write_str(s)
    }
}

/// A trading signal produced by one analysis of one symbol.
///
/// Ordering invariant: BUY has `stop_loss < entry_price < take_profit`, SELL the
/// reverse, HOLD carries no targets. `created_at` is the timestamp of the last
/// bar the signal was computed from, so historical signals can be replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingSignal {
    pub symbol: String,
    pub action: SignalAction,
    pub confidence: f64,
    pub entry_price: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub risk_reward: Option<f64>,
    pub reason: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl TradingSignal {
    /// A HOLD signal at `entry_price` with no targets.
    pub fn hold(
        symbol: &str,
        confidence: f64,
        entry_price: f64,
        reason: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            action: SignalAction::Hold,
            confidence,
            entry_price,
            stop_loss: None,
            take_profit: None,
            risk_reward: None,
            reason: reason.into(),
            metadata: BTreeMap::new(),
            created_at,
        }
    }

    pub fn is_hold(&self) -> bool {
        self.action == SignalAction::Hold
    }

    /// True when the stop/target ordering invariant holds for the action.
    pub fn is_well_formed(&self) -> bool {
        if !(self.entry_price.is_finite() && self.entry_price > 0.0) {
            return false;
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return false;
        }
        match (self.action, self.stop_loss, self.take_profit) {
            (SignalAction::Hold, None, None) => true,
            (SignalAction::Hold, _, _) => false,
            (SignalAction::Buy, Some(sl), Some(tp)) => sl < self.entry_price && self.entry_price < tp,
            (SignalAction::Sell, Some(sl), Some(tp)) => tp < self.entry_price && self.entry_price < sl,
            (_, sl, tp) => sl.map_or(true, |s| s > 0.0) && tp.map_or(true, |t| t > 0.0),
        }
    }

    /// Plain record handed to delivery collaborators.
    pub fn to_record(&self) -> SignalRecord {
        SignalRecord {
            symbol: self.symbol.clone(),
            action: self.action,
            confidence: self.confidence,
            entry_price: self.entry_price,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
            reason: self.reason.clone(),
            timestamp: self.created_at,
        }
    }
}

/// Transport-neutral view of a signal for downstream formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub symbol: String,
    pub action: SignalAction,
    pub confidence: f64,
    pub entry_price: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}
