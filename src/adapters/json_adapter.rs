//! JSON data adapter for the price backend's wire format.
//!
//! The backend answers with an array of
//! `[timestamp, open, high, low, close, volume]` tuples, or an
//! `{"error": "..."}` object when the lookup fails.

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::domain::error::TraderError;
use crate::domain::price_bar::{PriceBar, parse_bar_date};
use crate::ports::data_port::{DataPort, FetchRequest};

type WireBar = (String, f64, f64, f64, f64, f64);

#[derive(Deserialize)]
#[serde(untagged)]
enum WireResponse {
    Bars(Vec<WireBar>),
    Error { error: String },
}

/// Decode a backend response body into bars, keeping source order.
pub fn parse_wire_bars(body: &str) -> Result<Vec<PriceBar>, TraderError> {
    let response: WireResponse =
        serde_json::from_str(body).map_err(|e| TraderError::DataSource {
            reason: format!("malformed price response: {}", e),
        })?;

    match response {
        WireResponse::Error { error } => Err(TraderError::DataSource { reason: error }),
        WireResponse::Bars(rows) => rows
            .into_iter()
            .map(|(ts, open, high, low, close, volume)| {
                Ok(PriceBar {
                    date: parse_bar_date(&ts)?,
                    open,
                    high,
                    low,
                    close,
                    volume: volume.round() as i64,
                })
            })
            .collect(),
    }
}

pub(crate) fn filter_to_request(bars: Vec<PriceBar>, request: &FetchRequest) -> Vec<PriceBar> {
    bars.into_iter()
        .filter(|bar| request.contains(bar.date))
        .collect()
}

enum Location {
    Directory(PathBuf),
    File(PathBuf),
}

/// Reads saved backend responses from `<dir>/<SYMBOL>.json` or one file.
pub struct JsonFileAdapter {
    location: Location,
}

impl JsonFileAdapter {
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

    fn json_path(&self, symbol: &str) -> PathBuf {
        match &self.location {
            Location::Directory(dir) => dir.join(format!("{}.json", symbol)),
            Location::File(path) => path.clone(),
        }
    }
}

impl DataPort for JsonFileAdapter {
    fn fetch_bars(&self, request: &FetchRequest) -> Result<Vec<PriceBar>, TraderError> {
        let path = self.json_path(&request.symbol);
        let body = fs::read_to_string(&path).map_err(|e| TraderError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        let bars = parse_wire_bars(&body)?;
        Ok(filter_to_request(bars, request))
    }
}
