//! Fixed-point monetary types.
//!
//! Capital and position value use fixed-point arithmetic with 4 decimal
//! places so that a buy followed by a sell of the same size at the same price
//! restores capital exactly. Prices stay at the bar's full precision; an
//! order's value is its exact cost rounded up to the next whole tick.

use derive_more::{Add, AddAssign, From, Into, Sub, SubAssign, Sum};
use serde::Serialize;
use std::fmt;

/// Number of fixed-point ticks per currency unit.
pub const MONEY_SCALE: i64 = 10_000;

/// Number of whole units held or traded.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Add, Sub,
    AddAssign, SubAssign, Sum, From, Into,
)]
pub struct Quantity(pub u64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Quantity)
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Quantity)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-unit execution price: a bar's close, kept at full precision.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, From, Into)]
pub struct Price(pub f64);

/// Relative distance from a whole tick below which an order value snaps to it.
const TICK_SNAP: f64 = 1e-12;

impl Price {
    pub const ZERO: Price = Price(0.0);

    pub fn from_float(v: f64) -> Self {
        Self(v)
    }

    pub fn to_float(self) -> f64 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0.is_finite() && self.0 > 0.0
    }

    /// Total value of `qty` units in whole ticks, or `None` on overflow.
    ///
    /// Part ticks round up, so the result is never below `qty * price`.
    /// Products within float noise of a whole tick snap to that tick.
    pub fn checked_value_of(self, qty: Quantity) -> Option<Cash> {
        if !self.0.is_finite() || self.0 < 0.0 {
            return None;
        }
        let ticks = qty.0 as f64 * self.0 * MONEY_SCALE as f64;
        let nearest = ticks.round();
        let ticks = if (ticks - nearest).abs() <= nearest * TICK_SNAP {
            nearest
        } else {
            ticks.ceil()
        };
        // i64::MAX is not representable; 2^63 is the first out-of-range value
        if ticks >= i64::MAX as f64 {
            return None;
        }
        Some(Cash(ticks as i64))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Account balance or position value with 4 decimal places.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Add, Sub, AddAssign,
    SubAssign, Sum, From, Into,
)]
pub struct Cash(pub i64);

impl Cash {
    pub const ZERO: Cash = Cash(0);

    pub fn from_float(v: f64) -> Self {
        Self((v * MONEY_SCALE as f64).round() as i64)
    }

    pub fn to_float(self) -> f64 {
        self.0 as f64 / MONEY_SCALE as f64
    }

    pub fn raw(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Cash)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Cash)
    }

    /// Largest whole quantity of `price` this balance can pay for.
    pub fn units_affordable(self, price: Price) -> Quantity {
        if !price.is_positive() || self.0 <= 0 {
            return Quantity::ZERO;
        }
        let fits = |units: u64| {
            price
                .checked_value_of(Quantity(units))
                .is_some_and(|cost| cost <= self)
        };
        // value grows with quantity, so bisect for the last quantity that fits
        let (mut fits_up_to, mut too_many) = (0u64, u64::MAX);
        while too_many - fits_up_to > 1 {
            let mid = fits_up_to + (too_many - fits_up_to) / 2;
            if fits(mid) {
                fits_up_to = mid;
            } else {
                too_many = mid;
            }
        }
        let units = if fits(too_many) { too_many } else { fits_up_to };
        Quantity(units)
    }
}

impl fmt::Display for Cash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.to_float())
    }
}

impl Serialize for Cash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_float())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_keeps_full_precision() {
        let p = Price::from_float(50.000_04);
        assert_eq!(p.to_float(), 50.000_04);
        assert!(p.is_positive());
        assert!(!Price::ZERO.is_positive());
        assert!(!Price::from_float(f64::NAN).is_positive());
    }

    #[test]
    fn whole_tick_value_is_exact() {
        let cost = Price::from_float(50.0).checked_value_of(Quantity(100));
        assert_eq!(cost, Some(Cash::from_float(5_000.0)));
        let cost = Price::from_float(0.1).checked_value_of(Quantity(3));
        assert_eq!(cost, Some(Cash::from_float(0.3)));
    }

    #[test]
    fn part_tick_value_rounds_up() {
        let cost = Price::from_float(50.000_04).checked_value_of(Quantity(1));
        assert_eq!(cost, Some(Cash(500_001)));
        let cost = Price::from_float(0.000_04).checked_value_of(Quantity(1));
        assert_eq!(cost, Some(Cash(1)));
    }

    #[test]
    fn checked_value_of_detects_overflow() {
        let p = Price::from_float(1_000_000.0);
        assert!(p.checked_value_of(Quantity(u64::MAX)).is_none());
        assert!(p.checked_value_of(Quantity(10)).is_some());
        assert!(Price::from_float(f64::INFINITY).checked_value_of(Quantity(1)).is_none());
    }

    #[test]
    fn units_affordable_floors() {
        let capital = Cash::from_float(95_000.0);
        assert_eq!(capital.units_affordable(Price::from_float(50.0)), Quantity(1_900));
        assert_eq!(capital.units_affordable(Price::from_float(33.0)), Quantity(2_878));
    }

    #[test]
    fn units_affordable_respects_part_ticks() {
        let capital = Cash::from_float(5_000.0);
        assert_eq!(capital.units_affordable(Price::from_float(50.000_04)), Quantity(99));
        // 0.4 of a tick per unit: two units still cost a single tick
        assert_eq!(Cash(1).units_affordable(Price::from_float(0.000_04)), Quantity(2));
    }

    #[test]
    fn units_affordable_zero_for_non_positive_price() {
        let capital = Cash::from_float(1_000.0);
        assert_eq!(capital.units_affordable(Price::ZERO), Quantity::ZERO);
        assert_eq!(Cash::ZERO.units_affordable(Price::from_float(1.0)), Quantity::ZERO);
    }

    #[test]
    fn cash_display_uses_two_places() {
        assert_eq!(Cash::from_float(100_500.0).to_string(), "100500.00");
    }

    #[test]
    fn cash_arithmetic() {
        let mut c = Cash::from_float(100.0);
        c -= Cash::from_float(40.5);
        c += Cash::from_float(0.5);
        assert_eq!(c, Cash::from_float(60.0));
        let total: Cash = vec![Cash(1), Cash(2), Cash(3)].into_iter().sum();
        assert_eq!(total, Cash(6));
    }
}
