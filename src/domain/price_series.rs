//! Immutable, date-ordered price series for one session.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::ops::Range;

use crate::domain::error::TraderError;
use crate::domain::price_bar::PriceBar;

#[derive(Debug, Clone)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
    date_index: HashMap<NaiveDate, usize>,
}

impl PriceSeries {
    /// Build a series from bars already in ascending date order.
    ///
    /// Fails with `InvalidSeries` when `bars` is empty, when dates are not
    /// strictly increasing, or when a bar carries a non-finite price or a
    /// non-positive close.
    pub fn load(bars: Vec<PriceBar>) -> Result<Self, TraderError> {
        if bars.is_empty() {
            return Err(TraderError::InvalidSeries {
                reason: "series contains no bars".into(),
            });
        }

        for (i, bar) in bars.iter().enumerate() {
            if !bar.has_finite_prices() {
                return Err(TraderError::InvalidSeries {
                    reason: format!("bar {} ({}) has a non-finite price", i, bar.date),
                });
            }
            if bar.close <= 0.0 {
                return Err(TraderError::InvalidSeries {
                    reason: format!("bar {} ({}) has non-positive close {}", i, bar.date, bar.close),
                });
            }
            if bar.volume < 0 {
                return Err(TraderError::InvalidSeries {
                    reason: format!("bar {} ({}) has negative volume", i, bar.date),
                });
            }
        }

        if let Some(pair) = bars.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(TraderError::InvalidSeries {
                reason: format!(
                    "bars not in strictly ascending date order: {} followed by {}",
                    pair[0].date, pair[1].date
                ),
            });
        }

        let date_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();

        Ok(Self {
            symbol: String::new(),
            bars,
            date_index,
        })
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false for a loaded series; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn at(&self, index: usize) -> Result<&PriceBar, TraderError> {
        self.bars.get(index).ok_or(TraderError::IndexOutOfRange {
            index,
            len: self.bars.len(),
        })
    }

    pub fn slice(&self, range: Range<usize>) -> Result<&[PriceBar], TraderError> {
        if range.start > range.end || range.end > self.bars.len() {
            return Err(TraderError::IndexOutOfRange {
                index: range.end,
                len: self.bars.len(),
            });
        }
        Ok(&self.bars[range])
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.date_index.get(&date).copied()
    }

    /// First and last bar dates.
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        // load() guarantees at least one bar
        let first = self.bars[0].date;
        let last = self.bars[self.bars.len() - 1].date;
        (first, last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bar(date: &str, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            volume: 1000,
        }
    }

    fn three_bars() -> Vec<PriceBar> {
        vec![
            make_bar("2024-01-01", 100.0),
            make_bar("2024-01-02", 101.0),
            make_bar("2024-01-03", 102.0),
        ]
    }

    #[test]
    fn load_valid_series() {
        let series = PriceSeries::load(three_bars()).unwrap().with_symbol("AAPL");
        assert_eq!(series.len(), 3);
        assert!(!series.is_empty());
        assert_eq!(series.symbol(), "AAPL");
    }

    #[test]
    fn load_empty_fails() {
        let err = PriceSeries::load(Vec::new()).unwrap_err();
        assert!(matches!(err, TraderError::InvalidSeries { .. }));
    }

    #[test]
    fn load_out_of_order_fails() {
        let bars = vec![make_bar("2024-01-02", 100.0), make_bar("2024-01-01", 101.0)];
        let err = PriceSeries::load(bars).unwrap_err();
        assert!(matches!(err, TraderError::InvalidSeries { .. }));
    }

    #[test]
    fn load_duplicate_date_fails() {
        let bars = vec![make_bar("2024-01-01", 100.0), make_bar("2024-01-01", 101.0)];
        let err = PriceSeries::load(bars).unwrap_err();
        assert!(err.to_string().contains("strictly ascending"));
    }

    #[test]
    fn load_zero_close_fails() {
        let bars = vec![make_bar("2024-01-01", 0.0)];
        assert!(PriceSeries::load(bars).is_err());
    }

    #[test]
    fn load_nan_price_fails() {
        let mut bar = make_bar("2024-01-01", 10.0);
        bar.open = f64::NAN;
        assert!(PriceSeries::load(vec![bar]).is_err());
    }

    #[test]
    fn at_in_range() {
        let series = PriceSeries::load(three_bars()).unwrap();
        assert!((series.at(2).unwrap().close - 102.0).abs() < f64::EPSILON);
    }

    #[test]
    fn at_out_of_range() {
        let series = PriceSeries::load(three_bars()).unwrap();
        let err = series.at(3).unwrap_err();
        assert!(matches!(err, TraderError::IndexOutOfRange { index: 3, len: 3 }));
    }

    #[test]
    fn slice_bounds() {
        let series = PriceSeries::load(three_bars()).unwrap();
        assert_eq!(series.slice(1..3).unwrap().len(), 2);
        assert!(series.slice(0..0).unwrap().is_empty());
        assert!(series.slice(1..4).is_err());
    }

    #[test]
    fn index_of_date() {
        let series = PriceSeries::load(three_bars()).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(series.index_of(date), Some(1));
        assert_eq!(series.index_of(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()), None);
    }

    #[test]
    fn date_range_spans_series() {
        let series = PriceSeries::load(three_bars()).unwrap();
        let (first, last) = series.date_range();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
    }
}
