//! Performance metrics — pure functions over trades and balance curves.
//!
//! Every metric is a pure function: balance curve and/or trade list in, scalar
//! out. Degenerate inputs (no trades, a single balance point, zero variance)
//! yield 0.0 rather than NaN.

use phasecast_core::indicators::{mean, population_std_dev};

use crate::backtest::Trade;

/// Annualisation factor applied to the per-trade Sharpe ratio.
pub const ANNUALIZATION: f64 = 252.0;

/// Largest peak-to-trough decline as a positive fraction (0.15 = 15% drawdown).
///
/// Returns 0.0 for an empty, constant, or monotonically increasing curve.
pub fn max_drawdown(balance_curve: &[f64]) -> f64 {
    let Some(&first) = balance_curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &balance in balance_curve {
        if balance > peak {
            peak = balance;
        }
        if peak > 0.0 {
            max_dd = max_dd.max((peak - balance) / peak);
        }
    }
    max_dd
}

/// Fractional balance change from one trade to the next.
pub fn per_trade_returns(balance_curve: &[f64]) -> Vec<f64> {
    balance_curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

/// Sharpe-like ratio over per-trade returns.
///
/// `mean / population_std × √252`. Returns 0.0 with fewer than two returns or
/// zero variance.
pub fn sharpe_ratio(balance_curve: &[f64]) -> f64 {
    let returns = per_trade_returns(balance_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let std = population_std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean(&returns) / std * ANNUALIZATION.sqrt()
}

/// Fraction of trades that were winners.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_winner()).count() as f64 / trades.len() as f64
}

/// Mean profit of winning trades (positive) and losing trades (usually negative).
pub fn average_win_loss(trades: &[Trade]) -> (f64, f64) {
    let (wins, losses): (Vec<&Trade>, Vec<&Trade>) = trades.iter().partition(|t| t.is_winner());
    let avg = |group: &[&Trade]| -> f64 {
        let profits: Vec<f64> = group.iter().map(|t| t.profit).collect();
        mean(&profits)
    };
    (avg(&wins), avg(&losses))
}

/// `|avg_win / avg_loss|`, 0.0 when there is no average loss.
pub fn profit_factor(avg_win: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 0.0;
    }
    (avg_win / avg_loss).abs()
}
