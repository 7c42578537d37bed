//! Shipping data held by the cart: destination, candidate methods, and the
//! lookup state machine.

use std::fmt;

use freshcart_core::{CurrencyCode, Price};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::line_item::LineItemKey;

/// Delivery destination entered at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub postcode: String,
    pub city: String,
    /// ISO 3166-1 alpha-2, upper case.
    pub country: String,
}

impl ShippingAddress {
    /// Create a normalized address: whitespace trimmed, inner spaces removed
    /// from the postcode (`"123 45"` becomes `"12345"`), country upper-cased.
    #[must_use]
    pub fn new(postcode: &str, city: &str, country: &str) -> Self {
        Self {
            postcode: postcode.split_whitespace().collect(),
            city: city.trim().to_string(),
            country: country.trim().to_ascii_uppercase(),
        }
    }
}

/// A delivery option quoted by the rate service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingMethod {
    pub method_id: String,
    #[serde(default)]
    pub label: String,
    pub cost: Decimal,
    #[serde(default)]
    pub currency: CurrencyCode,
}

impl ShippingMethod {
    /// The cost as a [`Price`].
    #[must_use]
    pub const fn cost_price(&self) -> Price {
        Price::new(self.cost, self.currency)
    }
}

/// Result of one rate lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingQuote {
    pub methods: Vec<ShippingMethod>,
    /// Lines that cannot be shipped to the quoted address.
    #[serde(default)]
    pub restricted_products: Vec<LineItemKey>,
}

/// Identifies one rate lookup. Only the most recently issued token is
/// accepted when results come back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ShippingRequestToken(u64);

impl ShippingRequestToken {
    pub(crate) const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// The raw sequence number.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ShippingRequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shipping lookup lifecycle.
///
/// ```text
/// Idle --(address set / cart changed)--> Calculating --> Resolved
///                                                   \--> Failed
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ShippingStatus {
    /// No lookup needed or possible yet.
    #[default]
    Idle,
    /// Waiting for the result of the lookup identified by `token`.
    Calculating { token: ShippingRequestToken },
    /// Available methods are current.
    Resolved,
    /// The last lookup failed.
    Failed { reason: String },
}

impl ShippingStatus {
    /// Whether a lookup is outstanding.
    #[must_use]
    pub const fn is_calculating(&self) -> bool {
        matches!(self, Self::Calculating { .. })
    }

    /// The outstanding lookup token, if any.
    #[must_use]
    pub const fn pending_token(&self) -> Option<ShippingRequestToken> {
        match self {
            Self::Calculating { token } => Some(*token),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_address_normalization() {
        let address = ShippingAddress::new(" 123 45 ", " Göteborg ", "se");
        assert_eq!(address.postcode, "12345");
        assert_eq!(address.city, "Göteborg");
        assert_eq!(address.country, "SE");
    }

    #[test]
    fn test_method_deserializes_string_cost() {
        let method: ShippingMethod =
            serde_json::from_str(r#"{"method_id": "dhl-standard", "cost": "49"}"#).unwrap();
        assert_eq!(method.cost, Decimal::new(49, 0));
        assert_eq!(method.currency, CurrencyCode::SEK);
        assert!(method.label.is_empty());
    }

    #[test]
    fn test_tokens_increase() {
        let first = ShippingRequestToken::default().next();
        let second = first.next();
        assert!(second > first);
        assert_eq!(second.to_string(), "#2");
    }

    #[test]
    fn test_status_pending_token() {
        let token = ShippingRequestToken::default().next();
        let status = ShippingStatus::Calculating { token };
        assert!(status.is_calculating());
        assert_eq!(status.pending_token(), Some(token));
        assert_eq!(ShippingStatus::Resolved.pending_token(), None);
    }
}
