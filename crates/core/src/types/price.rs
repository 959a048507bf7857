//! Type-safe price representation for Chilean pesos.
//!
//! Catalog prices are integer CLP amounts (the minor unit of CLP is the
//! peso itself, there are no fractional digits), so the representation is a
//! plain `i64` newtype rather than decimal arithmetic.

use serde::{Deserialize, Serialize};

/// A price in Chilean pesos (CLP).
///
/// Display formatting follows the `es-CL` convention: a `$` sign followed by
/// dot-separated thousands and no decimals (`$1.990`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Zero pesos.
    pub const ZERO: Self = Self(0);

    /// Create a new price from an amount in pesos.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Get the amount in pesos.
    #[must_use]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// The total for a cart line: price times quantity.
    ///
    /// Saturates at `i64::MAX` rather than wrapping.
    #[must_use]
    pub const fn line_total(&self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as i64))
    }

    /// Add another price, saturating at `i64::MAX`.
    #[must_use]
    pub const fn saturating_add(&self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl std::iter::Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, p| acc.saturating_add(p))
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.unsigned_abs().to_string();

        // Group digits in threes from the right, separated by dots.
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }

        write!(f, "{sign}${grouped}")
    }
}
