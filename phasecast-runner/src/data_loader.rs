//! CSV-backed market data.
//!
//! One file per `(symbol, timeframe)` under a data directory, named
//! `{SYMBOL}_{TIMEFRAME}.csv` with columns
//! `timestamp,open,high,low,close,volume` (RFC 3339 timestamps, ascending).

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use phasecast_core::data::{validate_series, DataError, MarketDataSource, Timeframe};
use phasecast_core::domain::PriceBar;

/// Reads bars from CSV files in a directory.
#[derive(Debug, Clone)]
pub struct CsvSource {
    dir: PathBuf,
}

impl CsvSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `symbol` at `timeframe`.
    pub fn path_for(&self, symbol: &str, timeframe: Timeframe) -> PathBuf {
        self.dir.join(file_name(symbol, timeframe))
    }

    /// Every bar in the file, validated.
    pub fn load_all(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<PriceBar>, DataError> {
        let path = self.path_for(symbol, timeframe);
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(DataError::NoData {
                    symbol: symbol.to_string(),
                })
            }
            Err(e) => return Err(DataError::Io(e)),
        };

        let mut reader = csv::Reader::from_reader(file);
        let bars = reader
            .deserialize::<PriceBar>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DataError::InvalidSeries {
                symbol: symbol.to_string(),
                reason: e.to_string(),
            })?;
        validate_series(symbol, &bars)?;
        debug!(symbol, path = %path.display(), bars = bars.len(), "loaded csv bars");
        Ok(bars)
    }
}

impl MarketDataSource for CsvSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn get_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<PriceBar>, DataError> {
        let mut bars = self.load_all(symbol, timeframe)?;
        if bars.is_empty() || count == 0 {
            return Err(DataError::NoData {
                symbol: symbol.to_string(),
            });
        }
        let skip = bars.len().saturating_sub(count);
        bars.drain(..skip);
        Ok(bars)
    }

    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }
}

/// `{SYMBOL}_{TIMEFRAME}.csv`
pub fn file_name(symbol: &str, timeframe: Timeframe) -> String {
    format!("{}_{}.csv", symbol.to_ascii_uppercase(), timeframe)
}

/// Write `bars` to `path` in the format `CsvSource` reads.
pub fn write_bars_csv(path: &Path, bars: &[PriceBar]) -> Result<(), DataError> {
    let mut writer = csv::Writer::from_path(path).map_err(csv_to_data_error)?;
    for bar in bars {
        writer.serialize(bar).map_err(csv_to_data_error)?;
    }
    writer.flush()?;
    Ok(())
}

fn csv_to_data_error(e: csv::Error) -> DataError {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => DataError::Io(io),
        other => DataError::Io(io::Error::new(io::ErrorKind::Other, format!("{other:?}"))),
    }
}
