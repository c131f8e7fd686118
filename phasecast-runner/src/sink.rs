//! Delivery and persistence collaborators.
//!
//! The engine hands signals to a `SignalSink` and, optionally, signals and
//! backtest results to a `RecordStore`. Both only acknowledge success or
//! failure; transport and storage are the implementor's business.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use thiserror::Error;

use phasecast_core::domain::{SignalRecord, TradingSignal};

use crate::backtest::BacktestResult;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Receives signals selected for delivery.
pub trait SignalSink: Send + Sync {
    fn deliver(&self, signals: &[TradingSignal]) -> Result<(), SinkError>;
}

/// Stores signals and backtest results.
pub trait RecordStore: Send + Sync {
    fn store_signal(&self, signal: &TradingSignal) -> Result<(), SinkError>;
    fn store_backtest(&self, result: &BacktestResult) -> Result<(), SinkError>;
}

#[derive(Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
enum Entry<'a> {
    Delivery(&'a SignalRecord),
    Signal(&'a TradingSignal),
    Backtest(&'a BacktestResult),
}

/// Appends one JSON object per line to any writer.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries<'a, I>(&self, entries: I) -> Result<(), SinkError>
    where
        I: IntoIterator<Item = Entry<'a>>,
    {
        let mut buf = Vec::new();
        for entry in entries {
            serde_json::to_writer(&mut buf, &entry)?;
            buf.push(b'\n');
        }
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(&buf)?;
        writer.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> SignalSink for JsonLinesSink<W> {
    fn deliver(&self, signals: &[TradingSignal]) -> Result<(), SinkError> {
        let records: Vec<SignalRecord> = signals.iter().map(TradingSignal::to_record).collect();
        self.write_entries(records.iter().map(Entry::Delivery))
    }
}

impl<W: Write + Send> RecordStore for JsonLinesSink<W> {
    fn store_signal(&self, signal: &TradingSignal) -> Result<(), SinkError> {
        self.write_entries([Entry::Signal(signal)])
    }

    fn store_backtest(&self, result: &BacktestResult) -> Result<(), SinkError> {
        self.write_entries([Entry::Backtest(result)])
    }
}

/// Keeps delivered records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    delivered: Mutex<Vec<SignalRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<SignalRecord> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SignalSink for MemorySink {
    fn deliver(&self, signals: &[TradingSignal]) -> Result<(), SinkError> {
        let mut delivered = self.delivered.lock().unwrap_or_else(PoisonError::into_inner);
        delivered.extend(signals.iter().map(TradingSignal::to_record));
        Ok(())
    }
}
