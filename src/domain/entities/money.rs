//! Money value object.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Amount in minor units (cents) with an ISO currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    cents: i64,
    currency: String,
}

impl Money {
    /// Currency used when the backend omits one.
    pub const DEFAULT_CURRENCY: &'static str = "EUR";

    #[must_use]
    pub fn new(cents: i64, currency: impl Into<String>) -> Self {
        let currency = currency.into();
        let currency = if currency.trim().is_empty() {
            Self::DEFAULT_CURRENCY.to_string()
        } else {
            currency.trim().to_uppercase()
        };
        Self { cents, currency }
    }

    /// Parses a decimal string such as `"12.5"` into money.
    #[must_use]
    pub fn parse_decimal(value: &str, currency: impl Into<String>) -> Option<Self> {
        Self::parse_cents(value).map(|cents| Self::new(cents, currency))
    }

    /// Parses a decimal string into cents.
    ///
    /// Accepts an optional leading minus sign, an integer part and at most
    /// two fractional digits.
    #[must_use]
    pub fn parse_cents(value: &str) -> Option<i64> {
        let value = value.trim();
        let (negative, digits) = match value.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, value),
        };

        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if digits.contains('.') && fraction.is_empty() {
            return None;
        }
        if fraction.len() > 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let whole: i64 = whole.parse().ok()?;
        let fraction_cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().ok()? * 10,
            _ => fraction.parse().ok()?,
        };

        let cents = whole.checked_mul(100)?.checked_add(fraction_cents)?;
        Some(if negative { -cents } else { cents })
    }

    /// Formats cents as a decimal string with two fractional digits.
    #[must_use]
    pub fn format_cents(cents: i64) -> String {
        let sign = if cents < 0 { "-" } else { "" };
        let abs = cents.unsigned_abs();
        format!("{sign}{}.{:02}", abs / 100, abs % 100)
    }

    #[must_use]
    pub const fn cents(&self) -> i64 {
        self.cents
    }

    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    #[must_use]
    pub const fn is_free(&self) -> bool {
        self.cents == 0
    }

    /// Returns the decimal amount without currency.
    #[must_use]
    pub fn amount(&self) -> String {
        Self::format_cents(self.cents)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", Self::format_cents(self.cents), self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("12", Some(1200) ; "whole")]
    #[test_case("12.5", Some(1250) ; "one decimal")]
    #[test_case("12.05", Some(1205) ; "two decimals")]
    #[test_case("-0.50", Some(-50) ; "negative")]
    #[test_case("  7.10 ", Some(710) ; "padded")]
    #[test_case("12.345", None ; "too many decimals")]
    #[test_case("", None ; "empty")]
    #[test_case("12.", None ; "dangling dot")]
    #[test_case(".5", None ; "missing whole")]
    #[test_case("1e3", None ; "exponent")]
    fn test_parse_cents(input: &str, expected: Option<i64>) {
        assert_eq!(Money::parse_cents(input), expected);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::new(1250, "eur").to_string(), "12.50 EUR");
        assert_eq!(Money::new(-5, "usd").to_string(), "-0.05 USD");
        assert_eq!(Money::new(100, "").currency(), "EUR");
    }

    #[test]
    fn test_parse_decimal() {
        let money = Money::parse_decimal("3.2", "gbp").unwrap();
        assert_eq!(money.cents(), 320);
        assert_eq!(money.currency(), "GBP");
        assert!(!money.is_free());
    }
}
