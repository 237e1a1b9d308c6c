//! Price data source port trait.

use chrono::NaiveDate;
use std::fmt;

use crate::domain::error::TraderError;
use crate::domain::price_bar::PriceBar;

/// Bars for `symbol` between `start` and `end`, both inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchRequest {
    pub fn new(symbol: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            start,
            end,
        }
    }

    /// Request every bar the source has for `symbol`.
    pub fn unbounded(symbol: impl Into<String>) -> Self {
        Self::new(symbol, NaiveDate::MIN, NaiveDate::MAX)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn has_start(&self) -> bool {
        self.start != NaiveDate::MIN
    }

    pub fn has_end(&self) -> bool {
        self.end != NaiveDate::MAX
    }
}

impl fmt::Display for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.has_start(), self.has_end()) {
            (true, true) => write!(f, "{} ({} to {})", self.symbol, self.start, self.end),
            (true, false) => write!(f, "{} (from {})", self.symbol, self.start),
            (false, true) => write!(f, "{} (until {})", self.symbol, self.end),
            (false, false) => write!(f, "{} (all dates)", self.symbol),
        }
    }
}

/// One-shot fetch of a session's price series.
///
/// Implementations return bars in source order and never retry.
pub trait DataPort {
    fn fetch_bars(&self, request: &FetchRequest) -> Result<Vec<PriceBar>, TraderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn bounded_request_shows_range() {
        let request = FetchRequest::new("BHP", date(2015, 1, 5), date(2015, 3, 1));
        assert_eq!(request.to_string(), "BHP (2015-01-05 to 2015-03-01)");
    }

    #[test]
    fn unbounded_request_shows_all_dates() {
        let request = FetchRequest::unbounded("IBM");
        assert!(!request.has_start());
        assert!(!request.has_end());
        assert_eq!(request.to_string(), "IBM (all dates)");
    }

    #[test]
    fn half_open_requests() {
        let mut request = FetchRequest::unbounded("IBM");
        request.start = date(2020, 6, 1);
        assert_eq!(request.to_string(), "IBM (from 2020-06-01)");
        let mut request = FetchRequest::unbounded("IBM");
        request.end = date(2021, 6, 30);
        assert_eq!(request.to_string(), "IBM (until 2021-06-30)");
    }

    #[test]
    fn contains_is_inclusive() {
        let request = FetchRequest::new("BHP", date(2015, 1, 5), date(2015, 3, 1));
        assert!(request.contains(date(2015, 1, 5)));
        assert!(request.contains(date(2015, 3, 1)));
        assert!(!request.contains(date(2015, 3, 2)));
        assert!(FetchRequest::unbounded("BHP").contains(date(1900, 1, 1)));
    }
}
