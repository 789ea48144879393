use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Longest integer part accepted before the value can no longer fit in cents.
const MAX_INTEGER_DIGITS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("Amount is empty")]
    Empty,
    #[error("Invalid amount: '{0}'")]
    Invalid(String),
    #[error("Amount out of range: '{0}'")]
    OutOfRange(String),
}

/// Fixed-point monetary value, stored as an integer count of minor units (cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub fn to_cents(self) -> i64 {
        self.0
    }

    /// Magnitude without direction; `i64::MIN` is unreachable through `parse`.
    pub fn abs(self) -> Self {
        Money(self.0.saturating_abs())
    }

    /// Parse a signed decimal string such as `-100.00`, `+5.23` or `42`.
    ///
    /// Fractional digits beyond the second are truncated toward zero. A bare
    /// trailing point (`100.`) is accepted; thousands separators and currency
    /// symbols are not.
    pub fn parse(text: &str) -> Result<Self, AmountError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AmountError::Empty);
        }

        let (negative, unsigned) = match trimmed.as_bytes()[0] {
            b'-' => (true, &trimmed[1..]),
            b'+' => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if integer.is_empty() || !all_digits(integer) || !all_digits(fraction) {
            return Err(AmountError::Invalid(text.to_string()));
        }
        if integer.len() > MAX_INTEGER_DIGITS {
            return Err(AmountError::OutOfRange(text.to_string()));
        }

        // Two fractional digits are all the minor unit can hold.
        let fraction = &fraction[..fraction.len().min(2)];
        let normalized = if fraction.is_empty() {
            integer.to_string()
        } else {
            format!("{integer}.{fraction}")
        };

        let value = Decimal::from_str(&normalized)
            .map_err(|_| AmountError::Invalid(text.to_string()))?;
        let cents = value
            .checked_mul(Decimal::from(100))
            .map(|d| d.round_dp_with_strategy(0, RoundingStrategy::ToZero))
            .and_then(|d| d.to_i64())
            .ok_or_else(|| AmountError::OutOfRange(text.to_string()))?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}
