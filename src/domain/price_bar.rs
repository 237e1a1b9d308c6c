//! Daily OHLCV price bar.

use chrono::NaiveDate;

use crate::domain::error::TraderError;

/// Label format used by the data source and the chart axis.
pub const LABEL_FORMAT: &str = "%Y/%m/%d";

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl PriceBar {
    /// Axis label for this bar, e.g. `2024/01/15`.
    pub fn label(&self) -> String {
        self.date.format(LABEL_FORMAT).to_string()
    }

    /// True when the bar closed below its open.
    pub fn is_down(&self) -> bool {
        self.open > self.close
    }

    pub(crate) fn has_finite_prices(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite())
    }
}

/// Parse a bar timestamp in either `YYYY/MM/DD` or `YYYY-MM-DD` form.
pub fn parse_bar_date(value: &str) -> Result<NaiveDate, TraderError> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, LABEL_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
        .map_err(|_| TraderError::InvalidSeries {
            reason: format!("invalid bar date '{trimmed}'"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000,
        }
    }

    #[test]
    fn label_uses_slash_format() {
        assert_eq!(sample_bar().label(), "2024/01/15");
    }

    #[test]
    fn up_day_is_not_down() {
        assert!(!sample_bar().is_down());
    }

    #[test]
    fn down_day() {
        let bar = PriceBar {
            close: 95.0,
            ..sample_bar()
        };
        assert!(bar.is_down());
    }

    #[test]
    fn flat_day_is_not_down() {
        let bar = PriceBar {
            close: 100.0,
            ..sample_bar()
        };
        assert!(!bar.is_down());
    }

    #[test]
    fn parse_both_date_forms() {
        let expected = NaiveDate::from_ymd_opt(2019, 3, 7).unwrap();
        assert_eq!(parse_bar_date("2019/03/07").unwrap(), expected);
        assert_eq!(parse_bar_date("2019-03-07").unwrap(), expected);
        assert_eq!(parse_bar_date(" 2019-03-07 ").unwrap(), expected);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = parse_bar_date("March 7th").unwrap_err();
        assert!(matches!(err, TraderError::InvalidSeries { .. }));
    }

    #[test]
    fn nan_price_is_not_finite() {
        let bar = PriceBar {
            high: f64::NAN,
            ..sample_bar()
        };
        assert!(!bar.has_finite_prices());
        assert!(sample_bar().has_finite_prices());
    }
}
