//! Single-asset portfolio state and equity tracking.
//!
//! Fields are only mutated through [`crate::domain::trade_engine`], which
//! validates every change before applying it.

use chrono::NaiveDate;
use serde::Serialize;

use super::money::{Cash, Price, Quantity};

/// Date and execution price of a fill, used for chart markers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradePoint {
    pub date: NaiveDate,
    pub price: Price,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: Cash,
}

/// Snapshot of the numbers shown beside the chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub capital: Cash,
    pub units: u64,
    pub value: Cash,
    pub total_asset: Cash,
    pub return_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub(crate) capital: Cash,
    pub(crate) units: Quantity,
    pub(crate) value: Cash,
    pub(crate) starting_capital: Cash,
    pub(crate) buy_points: Vec<TradePoint>,
    pub(crate) sell_points: Vec<TradePoint>,
    pub(crate) equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(starting_capital: Cash) -> Self {
        Portfolio {
            capital: starting_capital,
            units: Quantity::ZERO,
            value: Cash::ZERO,
            starting_capital,
            buy_points: Vec::new(),
            sell_points: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn capital(&self) -> Cash {
        self.capital
    }

    pub fn units(&self) -> Quantity {
        self.units
    }

    pub fn value(&self) -> Cash {
        self.value
    }

    pub fn starting_capital(&self) -> Cash {
        self.starting_capital
    }

    pub fn buy_points(&self) -> &[TradePoint] {
        &self.buy_points
    }

    pub fn sell_points(&self) -> &[TradePoint] {
        &self.sell_points
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    pub fn total_asset(&self) -> Cash {
        self.capital + self.value
    }

    /// Percentage gain of total asset over starting capital.
    pub fn return_pct(&self) -> f64 {
        let start = self.starting_capital.to_float();
        if start <= 0.0 {
            return 0.0;
        }
        (self.total_asset().to_float() - start) / start * 100.0
    }

    pub fn summary(&self) -> PortfolioSummary {
        PortfolioSummary {
            capital: self.capital,
            units: self.units.raw(),
            value: self.value,
            total_asset: self.total_asset(),
            return_pct: self.return_pct(),
        }
    }

    /// Record total asset for `date`, replacing the last point if it has the
    /// same date.
    pub(crate) fn record_equity(&mut self, date: NaiveDate) {
        let equity = self.total_asset();
        match self.equity_curve.last_mut() {
            Some(last) if last.date == date => last.equity = equity,
            _ => self.equity_curve.push(EquityPoint { date, equity }),
        }
    }
}
