//! Trade — one signal replayed against its forward bars.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use phasecast_core::domain::SignalAction;

/// How a replayed trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    /// Neither level was touched; closed at the last close of the replay window.
    EndOfWindow,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::EndOfWindow => "end_of_window",
        };
        f.write_str(s)
    }
}

/// A resolved trade. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: String,
    pub action: SignalAction,
    /// Index of the originating signal in the backtested batch.
    pub signal_ref: usize,
    pub entry_price: f64,
    pub exit_price: f64,
    pub position_size: f64,
    /// Net of commission.
    pub profit: f64,
    /// Profit as a percentage of the balance before the trade.
    pub return_pct: f64,
    pub win: bool,
    pub exit_reason: ExitReason,
    pub entered_at: DateTime<Utc>,
    pub exited_at: DateTime<Utc>,
    pub bars_held: usize,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.win
    }

    /// Price movement in the trade's favour, per unit.
    pub fn favourable_move(&self) -> f64 {
        match self.action {
            SignalAction::Sell => self.entry_price - self.exit_price,
            _ => self.exit_price - self.entry_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn favourable_move_respects_side() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut trade = Trade {
            symbol: "EURUSD".into(),
            action: SignalAction::Buy,
            signal_ref: 0,
            entry_price: 1.10,
            exit_price: 1.12,
            position_size: 1.0,
            profit: 0.02,
            return_pct: 0.0,
            win: true,
            exit_reason: ExitReason::TakeProfit,
            entered_at: at,
            exited_at: at,
            bars_held: 1,
        };
        assert!((trade.favourable_move() - 0.02).abs() < 1e-12);
        trade.action = SignalAction::Sell;
        assert!((trade.favourable_move() + 0.02).abs() < 1e-12);
    }

    #[test]
    fn exit_reason_serializes_snake_case() {
        let json = serde_json::to_string(&ExitReason::EndOfWindow).unwrap();
        assert_eq!(json, "\"end_of_window\"");
        assert_eq!(ExitReason::StopLoss.to_string(), "stop_loss");
    }
}
