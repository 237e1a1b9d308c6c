//! Random symbol and date-range selection for new sessions.
//!
//! The session itself never draws random numbers; callers pick a seed here
//! with an RNG they own and pass the resolved request to the data port.

use chrono::{Months, NaiveDate};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::domain::error::TraderError;
use crate::ports::data_port::FetchRequest;

pub const SEED_FIRST_YEAR: i32 = 2000;
/// Exclusive upper bound on the start year.
pub const SEED_LAST_YEAR: i32 = 2022;
pub const SESSION_SPAN_MONTHS: u32 = 24;

pub const DEFAULT_SYMBOLS: &[&str] = &[
    "AAPL", "MSFT", "AMZN", "GOOGL", "META", "NVDA", "TSLA", "JPM", "JNJ", "V", "PG", "XOM",
    "KO", "PEP", "WMT", "DIS", "INTC", "CSCO", "ORCL", "IBM",
];

/// Pick a symbol uniformly and a start date in `[2000, 2022)` with day 1-28,
/// spanning two years.
pub fn random_seed<R: Rng>(
    rng: &mut R,
    symbols: &[String],
) -> Result<FetchRequest, TraderError> {
    let symbol = symbols
        .choose(rng)
        .ok_or_else(|| TraderError::ConfigInvalid {
            section: "data".into(),
            key: "symbols".into(),
            reason: "no symbols to choose from".into(),
        })?
        .clone();

    let year = rng.gen_range(SEED_FIRST_YEAR..SEED_LAST_YEAR);
    let month = rng.gen_range(1..=12);
    let day = rng.gen_range(1..=28);
    let start = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        TraderError::InvalidSeries {
            reason: format!("invalid seed date {year}-{month}-{day}"),
        }
    })?;
    let end = two_years_after(start)?;

    Ok(FetchRequest { symbol, start, end })
}

pub fn two_years_after(start: NaiveDate) -> Result<NaiveDate, TraderError> {
    start
        .checked_add_months(Months::new(SESSION_SPAN_MONTHS))
        .ok_or_else(|| TraderError::InvalidSeries {
            reason: format!("date range starting {start} overflows"),
        })
}

pub fn default_symbols() -> Vec<String> {
    DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect()
}
