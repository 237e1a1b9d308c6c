//! CSV file data adapter.
//!
//! Expects a header row followed by `date,open,high,low,close,volume`.

use crate::domain::error::TraderError;
use crate::domain::price_bar::{PriceBar, parse_bar_date};
use crate::ports::data_port::{DataPort, FetchRequest};
use std::fs;
use std::path::PathBuf;

enum Location {
    /// `<dir>/<SYMBOL>.csv`
    Directory(PathBuf),
    File(PathBuf),
}

pub struct CsvAdapter {
    location: Location,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            location: Location::Directory(base_path),
        }
    }

    pub fn single_file(path: PathBuf) -> Self {
        Self {
            location: Location::File(path),
        }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        match &self.location {
            Location::Directory(dir) => dir.join(format!("{}.csv", symbol)),
            Location::File(path) => path.clone(),
        }
    }
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    line: u64,
) -> Result<T, TraderError>
where
    T::Err: std::fmt::Display,
{
    let raw = record.get(index).ok_or_else(|| TraderError::DataSource {
        reason: format!("line {}: missing {} column", line, name),
    })?;
    raw.trim().parse().map_err(|e| TraderError::DataSource {
        reason: format!("line {}: invalid {} value '{}': {}", line, name, raw, e),
    })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, request: &FetchRequest) -> Result<Vec<PriceBar>, TraderError> {
        let path = self.csv_path(&request.symbol);
        let content = fs::read_to_string(&path).map_err(|e| TraderError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| TraderError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            let date_str = record.get(0).ok_or_else(|| TraderError::DataSource {
                reason: format!("line {}: missing date column", line),
            })?;
            let date = parse_bar_date(date_str)?;

            if !request.contains(date) {
                continue;
            }

            // volume may be written as a float by some exporters
            let volume: f64 = parse_field(&record, 5, "volume", line)?;

            bars.push(PriceBar {
                date,
                open: parse_field(&record, 1, "open", line)?,
                high: parse_field(&record, 2, "high", line)?,
                low: parse_field(&record, 3, "low", line)?,
                close: parse_field(&record, 4, "close", line)?,
                volume: volume.round() as i64,
            });
        }

        Ok(bars)
    }
}
