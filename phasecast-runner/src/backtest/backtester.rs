//! Backtester — replays signals against the bars that followed them.
//!
//! Signals are processed in input order against a single running balance. For
//! each one the bars strictly after `created_at` are walked; the stop is checked
//! before the target within a bar, so an ambiguous bar resolves as a loss.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use phasecast_core::domain::{PriceBar, SignalAction, TradingSignal};

use super::trade::{ExitReason, Trade};
use crate::config::ConfigError;
use crate::metrics;

/// Fewer forward bars than this and the signal is skipped.
pub const MIN_FORWARD_BARS: usize = 10;

#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("invalid backtest config: {0}")]
    Config(#[from] ConfigError),
}

/// Account and sizing settings for one backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub initial_balance: f64,
    pub risk_per_trade: f64,
    pub commission: f64,
    /// Cap on bars walked per trade; `None` walks every forward bar.
    #[serde(default)]
    pub max_holding_bars: Option<usize>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_balance: 10_000.0,
            risk_per_trade: 0.02,
            commission: 0.0,
            max_holding_bars: None,
        }
    }
}

/// Aggregate outcome of a backtest. Derived purely from the trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// HOLD signals, signals without targets, and signals lacking forward data.
    pub skipped_signals: usize,
    pub win_rate: f64,
    pub total_profit: f64,
    pub total_return_pct: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub profit_factor: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub initial_balance: f64,
    pub final_balance: f64,
    /// Balance after each trade, starting with the initial balance.
    pub equity_curve: Vec<f64>,
    pub trades: Vec<Trade>,
}

impl BacktestResult {
    fn from_trades(
        trades: Vec<Trade>,
        equity_curve: Vec<f64>,
        skipped_signals: usize,
        initial_balance: f64,
    ) -> Self {
        let winning_trades = trades.iter().filter(|t| t.win).count();
        let total_profit: f64 = trades.iter().map(|t| t.profit).sum();
        let (avg_win, avg_loss) = metrics::average_win_loss(&trades);
        let final_balance = equity_curve.last().copied().unwrap_or(initial_balance);
        Self {
            total_trades: trades.len(),
            winning_trades,
            losing_trades: trades.len() - winning_trades,
            skipped_signals,
            win_rate: metrics::win_rate(&trades),
            total_profit,
            total_return_pct: total_profit / initial_balance * 100.0,
            avg_win,
            avg_loss,
            profit_factor: metrics::profit_factor(avg_win, avg_loss),
            max_drawdown: metrics::max_drawdown(&equity_curve),
            sharpe_ratio: metrics::sharpe_ratio(&equity_curve),
            initial_balance,
            final_balance,
            equity_curve,
            trades,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Backtester {
    config: BacktestConfig,
}

impl Backtester {
    pub fn new(config: BacktestConfig) -> Result<Self, BacktestError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Replay every signal against one shared bar series.
    pub fn run(&self, signals: &[TradingSignal], future_bars: &[PriceBar]) -> BacktestResult {
        self.replay(signals, |_| Some(future_bars))
    }

    /// Replay each signal against its own symbol's series. Signals for symbols
    /// missing from `series` are skipped.
    pub fn run_by_symbol(
        &self,
        signals: &[TradingSignal],
        series: &HashMap<String, Vec<PriceBar>>,
    ) -> BacktestResult {
        self.replay(signals, |signal| {
            series.get(&signal.symbol).map(Vec::as_slice)
        })
    }

    fn replay<'a, F>(&self, signals: &[TradingSignal], bars_for: F) -> BacktestResult
    where
        F: Fn(&TradingSignal) -> Option<&'a [PriceBar]>,
    {
        let mut balance = self.config.initial_balance;
        let mut equity_curve = vec![balance];
        let mut trades = Vec::new();
        let mut skipped = 0usize;

        for (index, signal) in signals.iter().enumerate() {
            let (Some(stop), Some(target)) = (signal.stop_loss, signal.take_profit) else {
                skipped += 1;
                continue;
            };
            if signal.is_hold() {
                skipped += 1;
                continue;
            }
            let Some(bars) = bars_for(signal) else {
                debug!(symbol = %signal.symbol, "no bars for signal");
                skipped += 1;
                continue;
            };

            let start = bars.partition_point(|b| b.timestamp <= signal.created_at);
            let mut forward = &bars[start..];
            if forward.len() < MIN_FORWARD_BARS {
                debug!(
                    symbol = %signal.symbol,
                    forward = forward.len(),
                    "insufficient forward data"
                );
                skipped += 1;
                continue;
            }
            if let Some(max) = self.config.max_holding_bars {
                forward = &forward[..forward.len().min(max)];
            }

            let stop_distance = (signal.entry_price - stop).abs();
            let position_size = if stop_distance > 0.0 {
                balance * self.config.risk_per_trade / stop_distance
            } else {
                1.0
            };

            let exit = resolve(signal.action, signal.entry_price, stop, target, forward);
            let per_unit = match signal.action {
                SignalAction::Sell => signal.entry_price - exit.price,
                _ => exit.price - signal.entry_price,
            };
            let profit = per_unit * position_size - self.config.commission;
            let return_pct = if balance > 0.0 {
                profit / balance * 100.0
            } else {
                0.0
            };
            balance += profit;
            equity_curve.push(balance);

            trades.push(Trade {
                symbol: signal.symbol.clone(),
                action: signal.action,
                signal_ref: index,
                entry_price: signal.entry_price,
                exit_price: exit.price,
                position_size,
                profit,
                return_pct,
                win: exit.win,
                exit_reason: exit.reason,
                entered_at: signal.created_at,
                exited_at: forward[exit.bar].timestamp,
                bars_held: exit.bar + 1,
            });
        }

        let result =
            BacktestResult::from_trades(trades, equity_curve, skipped, self.config.initial_balance);
        info!(
            signals = signals.len(),
            trades = result.total_trades,
            skipped = result.skipped_signals,
            win_rate = result.win_rate,
            final_balance = result.final_balance,
            "backtest complete"
        );
        result
    }
}

struct Exit {
    price: f64,
    win: bool,
    reason: ExitReason,
    bar: usize,
}

/// Walk `bars` (non-empty) until a level is touched or the window ends.
fn resolve(action: SignalAction, entry: f64, stop: f64, target: f64, bars: &[PriceBar]) -> Exit {
    let sell = action == SignalAction::Sell;
    for (i, bar) in bars.iter().enumerate() {
        let (stop_hit, target_hit) = if sell {
            (bar.high >= stop, bar.low <= target)
        } else {
            (bar.low <= stop, bar.high >= target)
        };
        if stop_hit {
            return Exit {
                price: stop,
                win: false,
                reason: ExitReason::StopLoss,
                bar: i,
            };
        }
        if target_hit {
            return Exit {
                price: target,
                win: true,
                reason: ExitReason::TakeProfit,
                bar: i,
            };
        }
    }

    let last = bars.len().saturating_sub(1);
    let close = bars.get(last).map_or(entry, |b| b.close);
    Exit {
        price: close,
        win: if sell { close < entry } else { close > entry },
        reason: ExitReason::EndOfWindow,
        bar: last,
    }
}
