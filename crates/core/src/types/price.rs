//! Type-safe money representation using decimal arithmetic.
//!
//! Shopify returns monetary amounts as decimal strings with an explicit
//! currency code. They are parsed into [`rust_decimal::Decimal`] so that
//! totals never pick up binary floating point rounding.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while parsing or combining money values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Amount string is not a decimal number.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Currency code is not a three-letter ISO 4217 code.
    #[error("unsupported currency code: {0}")]
    UnsupportedCurrency(String),

    /// Attempted arithmetic across two currencies.
    #[error("currency mismatch: {0:?} vs {1:?}")]
    CurrencyMismatch(CurrencyCode, CurrencyCode),
}

/// A monetary amount with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the currency's standard unit (e.g., pounds, not pence).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Money {
    /// Create a new money value.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Zero in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Parse a Shopify `MoneyV2` pair (`amount` string + `currencyCode`).
    ///
    /// # Errors
    ///
    /// Returns `MoneyError` if the amount is not a decimal or the currency is unknown.
    pub fn parse(amount: &str, currency_code: &str) -> Result<Self, MoneyError> {
        let amount = Decimal::from_str(amount.trim())
            .map_err(|_| MoneyError::InvalidAmount(amount.to_string()))?;
        let currency_code = currency_code.parse::<CurrencyCode>()?;
        Ok(Self::new(amount, currency_code))
    }

    /// Add two amounts of the same currency.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::CurrencyMismatch` if the currencies differ.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        if self.currency_code != other.currency_code {
            return Err(MoneyError::CurrencyMismatch(
                self.currency_code,
                other.currency_code,
            ));
        }
        Ok(Self::new(self.amount + other.amount, self.currency_code))
    }

    /// Multiply by a line quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code)
    }

    /// Whether the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Format for display (e.g., "£19.99").
    #[must_use]
    pub fn display(&self) -> String {
        let amount = self.amount.round_dp(2);
        match self.currency_code.symbol() {
            Some(symbol) => format!("{symbol}{amount:.2}"),
            None => format!("{amount:.2} {}", self.currency_code),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency code.
///
/// Any three-letter alphabetic code is accepted so a shop priced in a
/// currency without a named constant still converts.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    pub const GBP: Self = Self(*b"GBP");
    pub const USD: Self = Self(*b"USD");
    pub const EUR: Self = Self(*b"EUR");
    pub const CAD: Self = Self(*b"CAD");
    pub const AUD: Self = Self(*b"AUD");
    pub const NZD: Self = Self(*b"NZD");
    pub const JPY: Self = Self(*b"JPY");

    /// Display symbol, or `None` when the code has no short symbol.
    #[must_use]
    pub fn symbol(&self) -> Option<&'static str> {
        match &self.0 {
            b"USD" | b"CAD" | b"AUD" | b"NZD" => Some("$"),
            b"EUR" => Some("€"),
            b"GBP" => Some("£"),
            b"JPY" => Some("¥"),
            _ => None,
        }
    }

    /// Three-letter code.
    #[must_use]
    pub fn code(&self) -> &str {
        // Constructed only from ASCII letters
        std::str::from_utf8(&self.0).unwrap_or("XXX")
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::GBP
    }
}

impl fmt::Debug for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        match <[u8; 3]>::try_from(upper.as_bytes()) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_uppercase) => Ok(Self(bytes)),
            _ => Err(MoneyError::UnsupportedCurrency(s.to_string())),
        }
    }
}

impl Serialize for CurrencyCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for CurrencyCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        code.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_exact_decimal() {
        let money = Money::parse("0.10", "GBP").unwrap();
        let sum = money.checked_add(Money::parse("0.20", "GBP").unwrap()).unwrap();
        assert_eq!(sum.amount, Decimal::from_str("0.30").unwrap());
    }

    #[test]
    fn test_parse_invalid_amount() {
        assert!(matches!(
            Money::parse("12,50", "GBP"),
            Err(MoneyError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_parse_malformed_currency() {
        for code in ["", "GB", "EURO", "12A", "£££"] {
            assert!(
                matches!(
                    Money::parse("1.00", code),
                    Err(MoneyError::UnsupportedCurrency(_))
                ),
                "{code:?}"
            );
        }
    }

    #[test]
    fn test_parse_any_iso_currency() {
        let sek = Money::parse("249", "sek").unwrap();
        assert_eq!(sek.currency_code.code(), "SEK");
        assert_eq!(sek.display(), "249.00 SEK");
        assert_eq!(Money::parse("1200", "JPY").unwrap().currency_code, CurrencyCode::JPY);
    }

    #[test]
    fn test_currency_serializes_as_code() {
        let json = serde_json::to_string(&CurrencyCode::from_str("CHF").unwrap()).unwrap();
        assert_eq!(json, "\"CHF\"");
        let back: CurrencyCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back.code(), "CHF");
        assert!(serde_json::from_str::<CurrencyCode>("\"CH\"").is_err());
    }

    #[test]
    fn test_checked_add_mismatch() {
        let gbp = Money::parse("1.00", "GBP").unwrap();
        let usd = Money::parse("1.00", "USD").unwrap();
        assert_eq!(
            gbp.checked_add(usd),
            Err(MoneyError::CurrencyMismatch(CurrencyCode::GBP, CurrencyCode::USD))
        );
    }

    #[test]
    fn test_times() {
        let money = Money::parse("249.99", "GBP").unwrap();
        assert_eq!(money.times(2).amount, Decimal::from_str("499.98").unwrap());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::parse("89", "GBP").unwrap().display(), "£89.00");
        assert_eq!(Money::parse("19.5", "USD").unwrap().display(), "$19.50");
    }
}
