//! Market order execution at the boundary bar's close.
//!
//! Every order is validated against the portfolio before any field changes,
//! so a rejected order leaves the portfolio exactly as it was. Callers may
//! clamp quantities up front, but the checks here are authoritative.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

use tracing::{info, warn};

use super::error::TraderError;
use super::money::{Cash, Price, Quantity};
use super::portfolio::{Portfolio, TradePoint};
use super::price_bar::PriceBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Result of an executed order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub side: Side,
    pub date: NaiveDate,
    pub units: Quantity,
    pub price: Price,
    pub amount: Cash,
}

/// Fraction-of-maximum order sizes offered by the trade dialogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizePreset {
    All,
    Half,
    Third,
    Quarter,
}

impl SizePreset {
    pub fn divisor(self) -> u64 {
        match self {
            SizePreset::All => 1,
            SizePreset::Half => 2,
            SizePreset::Third => 3,
            SizePreset::Quarter => 4,
        }
    }

    /// `floor(max / divisor)`
    pub fn units_of(self, max: Quantity) -> Quantity {
        Quantity(max.raw() / self.divisor())
    }
}

impl FromStr for SizePreset {
    type Err = TraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(SizePreset::All),
            "1/2" | "half" => Ok(SizePreset::Half),
            "1/3" | "third" => Ok(SizePreset::Third),
            "1/4" | "quarter" => Ok(SizePreset::Quarter),
            other => Err(TraderError::InvalidCommand {
                input: other.to_string(),
                reason: "size must be a unit count, all, 1/2, 1/3 or 1/4".into(),
            }),
        }
    }
}

impl fmt::Display for SizePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizePreset::All => write!(f, "all"),
            SizePreset::Half => write!(f, "1/2"),
            SizePreset::Third => write!(f, "1/3"),
            SizePreset::Quarter => write!(f, "1/4"),
        }
    }
}

/// Execution price for a bar: its close.
pub fn execution_price(bar: &PriceBar) -> Price {
    Price::from_float(bar.close)
}

/// Largest whole quantity `capital` can buy at `price`.
pub fn max_buy_units(capital: Cash, price: Price) -> Quantity {
    capital.units_affordable(price)
}

fn validate_order(bar: &PriceBar, units: Quantity) -> Result<Price, TraderError> {
    if units.is_zero() {
        return Err(TraderError::InvalidOrder {
            reason: "order quantity must be positive".into(),
        });
    }
    let price = execution_price(bar);
    if !price.is_positive() {
        return Err(TraderError::InvalidOrder {
            reason: format!("bar {} has no positive close to trade at", bar.date),
        });
    }
    Ok(price)
}

fn order_value(price: Price, units: Quantity) -> Result<Cash, TraderError> {
    price
        .checked_value_of(units)
        .ok_or_else(|| TraderError::InvalidOrder {
            reason: format!("order value of {} units at {} overflows", units, price),
        })
}

/// Buy `units` at the close of `bar`.
///
/// Fails with `InsufficientCapital` when the cost exceeds capital.
pub fn buy(portfolio: &mut Portfolio, bar: &PriceBar, units: Quantity) -> Result<Fill, TraderError> {
    let price = validate_order(bar, units)?;
    let cost = order_value(price, units)?;

    if cost > portfolio.capital {
        warn!(
            units = units.raw(),
            cost = %cost,
            capital = %portfolio.capital,
            "buy rejected: insufficient capital"
        );
        return Err(TraderError::InsufficientCapital {
            required: cost.to_float(),
            available: portfolio.capital.to_float(),
        });
    }

    let new_units = portfolio
        .units
        .checked_add(units)
        .ok_or_else(|| TraderError::InvalidOrder {
            reason: "position size overflows".into(),
        })?;
    let new_value = order_value(price, new_units)?;

    portfolio.capital -= cost;
    portfolio.units = new_units;
    portfolio.value = new_value;
    portfolio.buy_points.push(TradePoint {
        date: bar.date,
        price,
    });

    info!(date = %bar.date, units = units.raw(), price = %price, "bought");
    Ok(Fill {
        side: Side::Buy,
        date: bar.date,
        units,
        price,
        amount: cost,
    })
}

/// Sell `units` at the close of `bar`.
///
/// Fails with `InsufficientUnits` when more units are requested than held.
pub fn sell(portfolio: &mut Portfolio, bar: &PriceBar, units: Quantity) -> Result<Fill, TraderError> {
    let price = validate_order(bar, units)?;

    let Some(new_units) = portfolio.units.checked_sub(units) else {
        warn!(
            requested = units.raw(),
            held = portfolio.units.raw(),
            "sell rejected: insufficient units"
        );
        return Err(TraderError::InsufficientUnits {
            requested: units.raw(),
            held: portfolio.units.raw(),
        });
    };

    let proceeds = order_value(price, units)?;
    let new_capital =
        portfolio
            .capital
            .checked_add(proceeds)
            .ok_or_else(|| TraderError::InvalidOrder {
                reason: "capital overflows".into(),
            })?;
    let new_value = order_value(price, new_units)?;

    portfolio.capital = new_capital;
    portfolio.units = new_units;
    portfolio.value = new_value;
    portfolio.sell_points.push(TradePoint {
        date: bar.date,
        price,
    });

    info!(date = %bar.date, units = units.raw(), price = %price, "sold");
    Ok(Fill {
        side: Side::Sell,
        date: bar.date,
        units,
        price,
        amount: proceeds,
    })
}

/// Re-mark held units at `bar`'s close without trading.
pub fn revalue(portfolio: &mut Portfolio, bar: &PriceBar) {
    let price = execution_price(bar);
    // saturates instead of failing the tick
    portfolio.value = price
        .checked_value_of(portfolio.units)
        .unwrap_or(Cash(i64::MAX));
}
