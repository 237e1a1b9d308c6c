#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use std::collections::HashMap;
use tradetrainer::domain::analytics::ChartSnapshot;
use tradetrainer::domain::error::TraderError;
pub use tradetrainer::domain::price_bar::PriceBar;
use tradetrainer::domain::session::SessionConfig;
use tradetrainer::domain::money::Cash;
use tradetrainer::ports::data_port::{DataPort, FetchRequest};
use tradetrainer::ports::render_port::RenderPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, request: &FetchRequest) -> Result<Vec<PriceBar>, TraderError> {
        if let Some(reason) = self.errors.get(&request.symbol) {
            return Err(TraderError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(&request.symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| request.contains(b.date))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Collects every snapshot it is asked to render.
#[derive(Default)]
pub struct RecordingRenderPort {
    pub snapshots: Vec<ChartSnapshot>,
}

impl RenderPort for RecordingRenderPort {
    fn render(&mut self, snapshot: &ChartSnapshot) -> Result<(), TraderError> {
        self.snapshots.push(snapshot.clone());
        Ok(())
    }
}

pub fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()
}

pub fn make_bar(date: NaiveDate, close: f64) -> PriceBar {
    PriceBar {
        date,
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1_000,
    }
}

/// One bar per day from `base_date()` with the given closes.
pub fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_bar(base_date() + Days::new(i as u64), close))
        .collect()
}

/// `count` bars drifting upward from `start_price`, alternating up and down days.
pub fn generate_bars(count: usize, start_price: f64) -> Vec<PriceBar> {
    (0..count)
        .map(|i| {
            let close = start_price + (i as f64) * 0.25;
            let open = if i % 2 == 0 { close - 0.5 } else { close + 0.5 };
            PriceBar {
                date: base_date() + Days::new(i as u64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 10_000 + (i as i64) * 10,
            }
        })
        .collect()
}

pub fn session_config(starting_capital: f64, initial_reveal: usize) -> SessionConfig {
    SessionConfig {
        starting_capital: Cash::from_float(starting_capital),
        initial_reveal,
        ..SessionConfig::default()
    }
}
