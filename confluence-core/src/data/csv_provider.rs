//! CSV file provider.
//!
//! Reads `<dir>/<SYMBOL>_<interval>.csv`, where the symbol has any `/`
//! removed (`EUR/USD` at 5min → `EURUSD_5min.csv`). Header:
//! `timestamp,open,high,low,close[,volume]`. Timestamps are RFC 3339 or
//! `%Y-%m-%d %H:%M:%S` in UTC.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::provider::{FetchError, PriceSeriesProvider};
use super::twelvedata::parse_datetime;
use crate::domain::{Candle, CandleSeries, Interval};

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str, interval: Interval) -> PathBuf {
        let stem: String = symbol.chars().filter(|&c| c != '/').collect();
        self.dir.join(format!("{stem}_{interval}.csv"))
    }
}

impl PriceSeriesProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch_series(
        &self,
        symbol: &str,
        interval: Interval,
        size: usize,
    ) -> Result<CandleSeries, FetchError> {
        let path = self.path_for(symbol, interval);
        let mut candles = read_candles(&path)?;
        if candles.len() > size {
            candles.drain(..candles.len() - size);
        }
        Ok(CandleSeries::new(symbol, interval, candles)?)
    }
}

fn read_candles(path: &Path) -> Result<Vec<Candle>, FetchError> {
    let io_err = |message: String| FetchError::Io {
        path: path.display().to_string(),
        message,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| io_err(e.to_string()))?;

    let mut candles = Vec::new();
    for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = row.map_err(|e| io_err(format!("row {}: {e}", line + 1)))?;
        let candle = Candle::new(
            parse_datetime(&row.timestamp)?,
            row.open,
            row.high,
            row.low,
            row.close,
        )
        .with_volume(row.volume.unwrap_or(0.0));
        candles.push(candle);
    }
    Ok(candles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfluenceError;
    use std::fs;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn path_strips_slash() {
        let provider = CsvProvider::new("/data");
        assert_eq!(
            provider.path_for("EUR/USD", Interval::M5),
            PathBuf::from("/data/EURUSD_5min.csv")
        );
    }

    #[test]
    fn reads_both_timestamp_forms_and_optional_volume() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "EURUSD_1min.csv",
            "timestamp,open,high,low,close,volume\n\
             2024-01-02 10:00:00,1.1,1.2,1.0,1.15,\n\
             2024-01-02T10:01:00Z,1.15,1.25,1.1,1.2,30\n",
        );
        let provider = CsvProvider::new(dir.path());
        let series = provider.fetch_series("EUR/USD", Interval::M1, 100).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.candles()[0].volume, 0.0);
        assert_eq!(series.candles()[1].volume, 30.0);
    }

    #[test]
    fn keeps_only_the_last_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut body = String::from("timestamp,open,high,low,close\n");
        for minute in 0..10 {
            body.push_str(&format!("2024-01-02 10:{minute:02}:00,1,2,0.5,1.{minute}\n"));
        }
        write(dir.path(), "GBPUSD_1min.csv", &body);
        let provider = CsvProvider::new(dir.path());
        let series = provider.fetch_series("GBP/USD", Interval::M1, 3).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![1.7, 1.8, 1.9]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = CsvProvider::new(dir.path());
        assert!(matches!(
            provider.fetch_series("EUR/USD", Interval::M5, 10),
            Err(FetchError::Io { .. })
        ));
    }

    #[test]
    fn malformed_candle_rejects_series() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "EURUSD_5min.csv",
            "timestamp,open,high,low,close\n2024-01-02 10:00:00,1.1,1.0,1.2,1.1\n",
        );
        let provider = CsvProvider::new(dir.path());
        assert!(matches!(
            provider.fetch_series("EUR/USD", Interval::M5, 10),
            Err(FetchError::Series(ConfluenceError::InvalidCandle { index: 0, .. }))
        ));
    }
}
