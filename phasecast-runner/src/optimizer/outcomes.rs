//! Observed signal outcomes and their aggregate statistics.
//!
//! Outcomes come from the persistence collaborator in production, or from a
//! backtest via `outcomes_from_backtest`. A positive profit counts as a win.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use phasecast_core::domain::{SignalAction, TradingSignal};
use phasecast_core::indicators::mean;

use crate::backtest::{BacktestResult, Trade};
use crate::metrics;

/// Result of one delivered signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub symbol: String,
    pub action: SignalAction,
    pub confidence: f64,
    pub profit: f64,
    pub timestamp: DateTime<Utc>,
}

impl OutcomeRecord {
    pub fn from_trade(trade: &Trade, confidence: f64) -> Self {
        Self {
            symbol: trade.symbol.clone(),
            action: trade.action,
            confidence,
            profit: trade.profit,
            timestamp: trade.entered_at,
        }
    }

    pub fn is_win(&self) -> bool {
        self.profit > 0.0
    }
}

/// One outcome per trade, with confidence taken from the originating signal.
pub fn outcomes_from_backtest(
    signals: &[TradingSignal],
    result: &BacktestResult,
) -> Vec<OutcomeRecord> {
    result
        .trades
        .iter()
        .map(|trade| {
            let confidence = signals.get(trade.signal_ref).map_or(0.0, |s| s.confidence);
            OutcomeRecord::from_trade(trade, confidence)
        })
        .collect()
}

/// Trading session by UTC hour of the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Session {
    /// 22:00–08:00 UTC
    Asian,
    /// 08:00–13:00 UTC
    London,
    /// 13:00–22:00 UTC
    NewYork,
}

impl Session {
    pub fn of(timestamp: DateTime<Utc>) -> Self {
        match timestamp.hour() {
            8..=12 => Session::London,
            13..=21 => Session::NewYork,
            _ => Session::Asian,
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Session::Asian => "asian",
            Session::London => "london",
            Session::NewYork => "new_york",
        };
        f.write_str(s)
    }
}

/// Confidence bucket label.
pub fn confidence_bin(confidence: f64) -> &'static str {
    if confidence < 0.80 {
        "<0.80"
    } else if confidence < 0.85 {
        "0.80-0.85"
    } else if confidence < 0.90 {
        "0.85-0.90"
    } else if confidence < 0.95 {
        "0.90-0.95"
    } else {
        "0.95-1.00"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub count: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub avg_profit: f64,
}

impl GroupStats {
    fn of(records: &[&OutcomeRecord]) -> Self {
        let wins = records.iter().filter(|r| r.is_win()).count();
        let profits: Vec<f64> = records.iter().map(|r| r.profit).collect();
        Self {
            count: records.len(),
            wins,
            win_rate: if records.is_empty() {
                0.0
            } else {
                wins as f64 / records.len() as f64
            },
            avg_profit: mean(&profits),
        }
    }
}

/// Aggregate real-world performance. Empty groups are omitted from the maps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub total: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub avg_profit: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub profit_factor: f64,
    pub by_symbol: BTreeMap<String, GroupStats>,
    pub by_confidence: BTreeMap<String, GroupStats>,
    pub by_session: BTreeMap<Session, GroupStats>,
}

pub fn collect_performance(records: &[OutcomeRecord]) -> PerformanceStats {
    let profits: Vec<f64> = records.iter().map(|r| r.profit).collect();
    let win_profits: Vec<f64> = profits.iter().copied().filter(|p| *p > 0.0).collect();
    let loss_profits: Vec<f64> = profits.iter().copied().filter(|p| *p <= 0.0).collect();
    let avg_win = mean(&win_profits);
    let avg_loss = mean(&loss_profits);

    PerformanceStats {
        total: records.len(),
        wins: win_profits.len(),
        losses: loss_profits.len(),
        win_rate: if records.is_empty() {
            0.0
        } else {
            win_profits.len() as f64 / records.len() as f64
        },
        avg_profit: mean(&profits),
        avg_win,
        avg_loss,
        profit_factor: metrics::profit_factor(avg_win, avg_loss),
        by_symbol: group_by(records, |r| r.symbol.clone()),
        by_confidence: group_by(records, |r| confidence_bin(r.confidence).to_string()),
        by_session: group_by(records, |r| Session::of(r.timestamp)),
    }
}

fn group_by<K, F>(records: &[OutcomeRecord], key: F) -> BTreeMap<K, GroupStats>
where
    K: Ord,
    F: Fn(&OutcomeRecord) -> K,
{
    let mut groups: BTreeMap<K, Vec<&OutcomeRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(key(record)).or_default().push(record);
    }
    groups
        .into_iter()
        .map(|(k, members)| (k, GroupStats::of(&members)))
        .collect()
}
