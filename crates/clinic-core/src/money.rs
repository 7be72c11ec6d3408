//! # Money Module
//!
//! Provides the `Money` type for monetary values in Brazilian reais.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing a month of procedures as floats:                               │
//! │    150.10 + 80.20 = 230.29999999999998  ❌                              │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Centavos                                         │
//! │    15010 + 8020 = 23030 centavos  ✓                                     │
//! │    Totals and buckets stay exact no matter the order of summation      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The hosted backend stores amounts as numeric reais, so values crossing that
//! boundary go through [`Money::from_reais`] exactly once.
//!
//! ## Usage
//! ```rust
//! use clinic_core::money::Money;
//!
//! let consulta = Money::from_centavos(25000); // R$ 250,00
//! let exame = Money::from_reais(80.5);        // R$ 80,50
//! assert_eq!((consulta + exame).centavos(), 33050);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in centavos (1/100 of a real).
///
/// ## Design Decisions
/// - **i64 (signed)**: profit (revenue minus expenses) can be negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Ord**: ranking sorts by total revenue without float comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    ///
    /// ## Example
    /// ```rust
    /// use clinic_core::money::Money;
    ///
    /// let price = Money::from_centavos(1099); // R$ 10,99
    /// assert_eq!(price.centavos(), 1099);
    /// ```
    #[inline]
    pub const fn from_centavos(centavos: i64) -> Self {
        Money(centavos)
    }

    /// Converts a numeric reais amount (as stored by the hosted backend) to
    /// Money, rounding to the nearest centavo.
    ///
    /// Non-finite input becomes zero.
    ///
    /// ## Example
    /// ```rust
    /// use clinic_core::money::Money;
    ///
    /// assert_eq!(Money::from_reais(150.5).centavos(), 15050);
    /// assert_eq!(Money::from_reais(0.1 + 0.2).centavos(), 30);
    /// ```
    pub fn from_reais(reais: f64) -> Self {
        if !reais.is_finite() {
            return Money::zero();
        }
        Money((reais * 100.0).round() as i64)
    }

    /// Parses an amount typed into a form field.
    ///
    /// Accepts `.` or `,` as decimal separator. When a comma is present, dots
    /// are treated as thousands separators (`1.234,56`). Anything that does not
    /// parse to a finite number is coerced to zero, so the aggregation layer
    /// only ever sees valid numbers.
    ///
    /// ## Example
    /// ```rust
    /// use clinic_core::money::Money;
    ///
    /// assert_eq!(Money::parse_input("150.50").centavos(), 15050);
    /// assert_eq!(Money::parse_input("1.234,56").centavos(), 123456);
    /// assert_eq!(Money::parse_input("abc").centavos(), 0);
    /// assert_eq!(Money::parse_input("").centavos(), 0);
    /// ```
    pub fn parse_input(input: &str) -> Self {
        let trimmed = input.trim();
        let normalized = if trimmed.contains(',') {
            trimmed.replace('.', "").replace(',', ".")
        } else {
            trimmed.to_string()
        };

        match normalized.parse::<f64>() {
            Ok(value) => Money::from_reais(value),
            Err(_) => Money::zero(),
        }
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn centavos(&self) -> i64 {
        self.0
    }

    /// Returns the whole reais portion.
    #[inline]
    pub const fn reais(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the centavos portion (always 0-99).
    #[inline]
    pub const fn centavos_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns the value as floating point reais (for charts and display only).
    #[inline]
    pub fn as_reais(&self) -> f64 {
        self.0 as f64 / 100.0
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
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Formats as Brazilian currency: `R$ 1.234,56`.
///
/// ## Note
/// The dashboard formats with `Intl.NumberFormat('pt-BR')`; this impl exists
/// for logs and the seed report.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.reais().abs().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        write!(f, "{}R$ {},{:02}", sign, grouped, self.centavos_part())
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

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
