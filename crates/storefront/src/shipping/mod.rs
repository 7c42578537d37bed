//! Shipping-rate calculation service.
//!
//! # Architecture
//!
//! - [`ShippingRates`] is the seam: anything that can turn a [`RateRequest`]
//!   into a [`ShippingQuote`]
//! - [`ShippingRateClient`] implements it over HTTP with `reqwest`
//! - [`refresh_shipping`] runs one guarded lookup for a cart store
//!
//! The cart store performs no I/O. Callers take the pending request from the
//! store, await the quote, and hand the result back with the request's token:
//!
//! ```rust,ignore
//! if let Some(request) = cart.pending_shipping_request() {
//!     let result = rates.quote(&request).await;
//!     cart.complete_shipping_request(request.token, result);
//! }
//! ```

mod client;

pub use client::ShippingRateClient;

use std::future::Future;

use freshcart_core::{ProductId, VariationId};
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::cart::{CartState, LineItem, ShippingAddress, ShippingQuote, ShippingRequestToken};
use crate::store::Store;

/// Errors that can occur when requesting shipping rates.
#[derive(Debug, Error)]
pub enum ShippingError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not a valid quote.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rate limited by the service.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Service answered with a non-success status.
    #[error("Shipping service returned {status}: {message}")]
    Service { status: u16, message: String },

    /// There is nothing to ship.
    #[error("Cannot quote shipping for an empty cart")]
    EmptyCart,
}

/// One line in a rate request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateRequestItem {
    pub product_id: ProductId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation_id: Option<VariationId>,
    pub quantity: u32,
}

/// Everything the rate service needs to quote a cart.
///
/// The token is not sent; it identifies the lookup inside the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateRequest {
    #[serde(skip)]
    pub token: ShippingRequestToken,
    pub items: Vec<RateRequestItem>,
    pub address: ShippingAddress,
}

impl RateRequest {
    /// Build a request from cart lines.
    #[must_use]
    pub fn new(token: ShippingRequestToken, items: &[LineItem], address: ShippingAddress) -> Self {
        Self {
            token,
            items: items
                .iter()
                .map(|item| RateRequestItem {
                    product_id: item.product_id,
                    variation_id: item.variation_id,
                    quantity: item.quantity,
                })
                .collect(),
            address,
        }
    }
}

/// Source of shipping quotes.
pub trait ShippingRates: Send + Sync {
    /// Quote the request's items to its address.
    fn quote(
        &self,
        request: &RateRequest,
    ) -> impl Future<Output = Result<ShippingQuote, ShippingError>> + Send;
}

/// Perform the cart's outstanding rate lookup, if any, and apply the result.
///
/// Returns `true` if the store accepted a result. This holds the store for
/// the duration of the lookup; callers that keep accepting UI events while
/// waiting should use [`Store::pending_shipping_request`] and
/// [`Store::complete_shipping_request`] directly.
#[instrument(skip_all)]
pub async fn refresh_shipping<R: ShippingRates>(cart: &mut Store<CartState>, rates: &R) -> bool {
    let Some(request) = cart.pending_shipping_request() else {
        tracing::debug!("No shipping lookup pending");
        return false;
    };

    let token = request.token;
    let result = rates.quote(&request).await;
    if let Err(e) = &result {
        tracing::warn!(%token, error = %e, "Shipping lookup failed");
    }
    cart.complete_shipping_request(token, result)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_request_wire_format() {
        let request = RateRequest {
            token: ShippingRequestToken::default(),
            items: vec![
                RateRequestItem {
                    product_id: ProductId::new(1),
                    variation_id: None,
                    quantity: 2,
                },
                RateRequestItem {
                    product_id: ProductId::new(2),
                    variation_id: Some(VariationId::new(21)),
                    quantity: 1,
                },
            ],
            address: ShippingAddress::new("11122", "Stockholm", "SE"),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "items": [
                    {"product_id": 1, "quantity": 2},
                    {"product_id": 2, "variation_id": 21, "quantity": 1}
                ],
                "address": {"postcode": "11122", "city": "Stockholm", "country": "SE"}
            })
        );
    }

    #[test]
    fn test_shipping_error_display() {
        let err = ShippingError::Service {
            status: 503,
            message: "maintenance".to_string(),
        };
        assert_eq!(err.to_string(), "Shipping service returned 503: maintenance");
        assert_eq!(
            ShippingError::RateLimited(30).to_string(),
            "Rate limited, retry after 30 seconds"
        );
    }
}
