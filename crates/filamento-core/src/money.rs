//! # Money Module
//!
//! Provides the `Money` type for monetary values.
//!
//! ## Whole Units
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CLP HAS NO MINOR UNIT                                                  │
//! │                                                                         │
//! │  Every price, cost and amount in the shop is a whole number of pesos.  │
//! │  Rates (cost per gram, cost per kWh, percentages) stay f64, and every  │
//! │  money value derived from them is rounded UP to the next whole unit:   │
//! │                                                                         │
//! │    100 g × 0.025 /g  = 2.5000000000000004  →  ceil  →  3               │
//! │                                                                         │
//! │  Money itself never holds fractions.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use filamento_core::money::Money;
//!
//! let price = Money::from_units(2309);
//! let total = price * 3;
//! assert_eq!(total.units(), 6927);
//! assert_eq!(total.to_string(), "$6.927");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole currency units.
///
/// Signed so that profits can go negative (selling below cost).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units)
    }

    /// Rounds a fractional amount UP to the next whole unit.
    ///
    /// Non-finite input (NaN, ±∞) yields zero.
    ///
    /// ## Example
    /// ```rust
    /// use filamento_core::money::Money;
    ///
    /// assert_eq!(Money::ceil_from(31.499999999999996).units(), 32);
    /// assert_eq!(Money::ceil_from(300.0).units(), 300);
    /// assert_eq!(Money::ceil_from(f64::NAN).units(), 0);
    /// ```
    pub fn ceil_from(amount: f64) -> Self {
        if !amount.is_finite() {
            return Money::zero();
        }
        Money(amount.ceil() as i64)
    }

    /// Rounds a fractional amount to the nearest whole unit (half away from zero).
    pub fn round_from(amount: f64) -> Self {
        if !amount.is_finite() {
            return Money::zero();
        }
        Money(amount.round() as i64)
    }

    /// Returns the value in whole units.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0
    }

    /// Returns the value as f64 (for rate arithmetic only).
    #[inline]
    pub fn as_f64(&self) -> f64 {
        self.0 as f64
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use filamento_core::money::Money;
    ///
    /// let unit_price = Money::from_units(2500);
    /// assert_eq!(unit_price.multiply_quantity(4).units(), 10_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Multiplies money by a quantity, `None` when the product leaves `i64`.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(units) => Some(Money(units)),
            None => None,
        }
    }

    /// Applies a percentage and rounds the result up.
    ///
    /// `percent` is a plain percentage: 19.0 = 19 %, 300.0 = 300 %.
    /// The division happens before the multiplication, matching the
    /// quotation form's arithmetic bit for bit.
    pub fn percentage_ceil(&self, percent: f64) -> Money {
        Money::ceil_from(self.as_f64() * (percent / 100.0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display uses the es-CL grouping: `$1.234.567`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.unsigned_abs().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        write!(f, "{}${}", sign, grouped)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::from_units(0).to_string(), "$0");
        assert_eq!(Money::from_units(999).to_string(), "$999");
        assert_eq!(Money::from_units(2309).to_string(), "$2.309");
        assert_eq!(Money::from_units(1_234_567).to_string(), "$1.234.567");
        assert_eq!(Money::from_units(-25_000).to_string(), "-$25.000");
    }

    #[test]
    fn test_ceil_from_rounds_up() {
        assert_eq!(Money::ceil_from(2.5000000000000004).units(), 3);
        assert_eq!(Money::ceil_from(368.6).units(), 369);
        assert_eq!(Money::ceil_from(0.0).units(), 0);
        assert_eq!(Money::ceil_from(f64::INFINITY).units(), 0);
    }

    #[test]
    fn test_round_from_nearest() {
        assert_eq!(Money::round_from(145.5).units(), 146);
        assert_eq!(Money::round_from(145.49).units(), 145);
    }

    #[test]
    fn test_percentage_ceil() {
        assert_eq!(Money::from_units(485).percentage_ceil(300.0).units(), 1455);
        assert_eq!(Money::from_units(1940).percentage_ceil(19.0).units(), 369);
        assert_eq!(Money::from_units(1000).percentage_ceil(0.0).units(), 0);
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_units(1000);
        let b = Money::from_units(400);

        assert_eq!((a + b).units(), 1400);
        assert_eq!((a - b).units(), 600);
        assert_eq!((a * 3).units(), 3000);
        assert_eq!(a.checked_multiply_quantity(3), Some(Money::from_units(3000)));
        assert_eq!(Money::from_units(i64::MAX / 2).checked_multiply_quantity(3), None);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.units(), 1800);
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_units(1).is_positive());
        assert!(Money::from_units(-1).is_negative());
        assert_eq!(Money::from_units(-50).abs().units(), 50);
    }
}
