//! Export — JSON and CSV artifacts for backtest and optimization results.
//!
//! - **JSON**: full `BacktestResult` / `OptimizationReport`
//! - **CSV**: trade tape and equity curve for external analysis tools

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::backtest::BacktestResult;
use crate::optimizer::OptimizationReport;

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

pub fn import_json(json: &str) -> Result<BacktestResult> {
    serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")
}

pub fn export_report_json(report: &OptimizationReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize OptimizationReport to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Trade tape as CSV.
///
/// Columns: signal_ref, symbol, action, entered_at, exited_at, entry_price,
/// exit_price, position_size, profit, return_pct, win, exit_reason, bars_held
pub fn export_trades_csv(result: &BacktestResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "signal_ref",
        "symbol",
        "action",
        "entered_at",
        "exited_at",
        "entry_price",
        "exit_price",
        "position_size",
        "profit",
        "return_pct",
        "win",
        "exit_reason",
        "bars_held",
    ])?;
    for t in &result.trades {
        wtr.write_record([
            t.signal_ref.to_string(),
            t.symbol.clone(),
            t.action.to_string(),
            t.entered_at.to_rfc3339(),
            t.exited_at.to_rfc3339(),
            format!("{:.5}", t.entry_price),
            format!("{:.5}", t.exit_price),
            format!("{:.4}", t.position_size),
            format!("{:.2}", t.profit),
            format!("{:.4}", t.return_pct),
            t.win.to_string(),
            t.exit_reason.to_string(),
            t.bars_held.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Balance after each trade. Row 0 is the initial balance.
pub fn export_equity_csv(equity_curve: &[f64]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["trade_index", "balance"])?;
    for (i, balance) in equity_curve.iter().enumerate() {
        wtr.write_record([i.to_string(), format!("{balance:.2}")])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write `result.json`, `trades.csv` and `equity.csv` under `output_dir/name/`.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path, name: &str) -> Result<PathBuf> {
    let dir = output_dir.join(name);
    fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    fs::write(dir.join("result.json"), export_json(result)?)
        .context("failed to write result.json")?;
    fs::write(dir.join("trades.csv"), export_trades_csv(result)?)
        .context("failed to write trades.csv")?;
    fs::write(dir.join("equity.csv"), export_equity_csv(&result.equity_curve)?)
        .context("failed to write equity.csv")?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::{BacktestConfig, Backtester};
    use chrono::{Duration, TimeZone, Utc};
    use phasecast_core::domain::{PriceBar, SignalAction, TradingSignal};
    use std::collections::BTreeMap;

    fn sample_result() -> BacktestResult {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars: Vec<PriceBar> = (0..15)
            .map(|i| PriceBar {
                timestamp: t0 + Duration::hours(i),
                open: 1.1,
                high: if i == 2 { 1.125 } else { 1.1005 },
                low: 1.0995,
                close: 1.1,
                volume: 1,
            })
            .collect();
        let signal = TradingSignal {
            symbol: "EURUSD".into(),
            action: SignalAction::Buy,
            confidence: 0.9,
            entry_price: 1.1,
            stop_loss: Some(1.09),
            take_profit: Some(1.12),
            risk_reward: Some(2.0),
            reason: "test".into(),
            metadata: BTreeMap::new(),
            created_at: t0,
        };
        Backtester::new(BacktestConfig::default())
            .unwrap()
            .run(&[signal], &bars)
    }

    #[test]
    fn trades_csv_has_header_and_rows() {
        let csv = export_trades_csv(&sample_result()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("signal_ref,symbol,action"));
        assert!(lines[1].contains("EURUSD,BUY"));
        assert!(lines[1].contains("take_profit"));
    }

    #[test]
    fn equity_csv_starts_at_initial_balance() {
        let csv = export_equity_csv(&[10_000.0, 10_400.0]).unwrap();
        assert_eq!(csv, "trade_index,balance\n0,10000.00\n1,10400.00\n");
    }

    #[test]
    fn json_round_trip() {
        let result = sample_result();
        let back = import_json(&export_json(&result).unwrap()).unwrap();
        assert_eq!(back.total_trades, result.total_trades);
        assert_eq!(back.trades[0].exit_reason, result.trades[0].exit_reason);
    }

    #[test]
    fn artifacts_written_to_named_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = save_artifacts(&sample_result(), dir.path(), "run1").unwrap();
        assert!(out.join("result.json").exists());
        assert!(out.join("trades.csv").exists());
        assert!(out.join("equity.csv").exists());
    }
}
