//! Type-safe price representation using decimal arithmetic.
//!
//! Catalog payloads carry prices as decimal strings (e.g. `"49.00"`). They are
//! parsed into [`Decimal`] once at the boundary so that cart totals never
//! accumulate floating-point drift.

use core::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input string is empty.
    #[error("price cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("invalid price amount: {0}")]
    InvalidAmount(String),
    /// The amount is below zero.
    #[error("price cannot be negative: {0}")]
    Negative(Decimal),
    /// Unknown ISO 4217 code.
    #[error("unsupported currency code: {0}")]
    UnsupportedCurrency(String),
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., kronor, not öre).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Create a price from an amount in minor units (e.g., öre).
    #[must_use]
    pub fn from_minor(minor: i64, currency_code: CurrencyCode) -> Self {
        Self::new(
            Decimal::new(minor, currency_code.minor_units()),
            currency_code,
        )
    }

    /// Parse a non-negative decimal string such as `"49.00"` or `"12.5"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, not a decimal, or negative.
    pub fn parse(s: &str, currency_code: CurrencyCode) -> Result<Self, PriceError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PriceError::Empty);
        }

        let amount = Decimal::from_str(trimmed)
            .map_err(|_| PriceError::InvalidAmount(trimmed.to_string()))?;

        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }

        Ok(Self::new(amount, currency_code))
    }

    /// Multiply by a line quantity. Returns `None` on overflow.
    #[must_use]
    pub fn checked_mul_quantity(&self, quantity: u32) -> Option<Self> {
        self.amount
            .checked_mul(Decimal::from(quantity))
            .map(|amount| Self::new(amount, self.currency_code))
    }

    /// Add another price of the same currency. Returns `None` on overflow or
    /// currency mismatch.
    #[must_use]
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        if self.currency_code != other.currency_code {
            return None;
        }
        self.amount
            .checked_add(other.amount)
            .map(|amount| Self::new(amount, self.currency_code))
    }

    /// Round to the currency's minor units (half away from zero).
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self::new(
            self.amount.round_dp_with_strategy(
                self.currency_code.minor_units(),
                RoundingStrategy::MidpointAwayFromZero,
            ),
            self.currency_code,
        )
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.rounded();
        write!(
            f,
            "{:.*} {}",
            self.currency_code.minor_units() as usize,
            rounded.amount,
            self.currency_code.symbol()
        )
    }
}

/// ISO 4217 currency codes accepted by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    SEK,
    NOK,
    DKK,
    EUR,
    USD,
}

impl CurrencyCode {
    /// Number of decimal places in the currency's minor unit.
    #[must_use]
    pub const fn minor_units(&self) -> u32 {
        match self {
            Self::SEK | Self::NOK | Self::DKK | Self::EUR | Self::USD => 2,
        }
    }

    /// The ISO code as a string.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::SEK => "SEK",
            Self::NOK => "NOK",
            Self::DKK => "DKK",
            Self::EUR => "EUR",
            Self::USD => "USD",
        }
    }

    /// Display symbol.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::SEK | Self::NOK | Self::DKK => "kr",
            Self::EUR => "€",
            Self::USD => "$",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SEK" => Ok(Self::SEK),
            "NOK" => Ok(Self::NOK),
            "DKK" => Ok(Self::DKK),
            "EUR" => Ok(Self::EUR),
            "USD" => Ok(Self::USD),
            other => Err(PriceError::UnsupportedCurrency(other.to_string())),
        }
    }
}
