//! HTTP client for the shipping-rate calculation service.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;
use url::Url;

use super::{RateRequest, ShippingError, ShippingRates};
use crate::cart::ShippingQuote;
use crate::config::ShippingConfig;

/// Maximum number of response body characters carried into errors and logs.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Client for `POST {base}/shipping/calculate`.
#[derive(Clone)]
pub struct ShippingRateClient {
    inner: Arc<ShippingRateClientInner>,
}

struct ShippingRateClientInner {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Option<SecretString>,
}

impl ShippingRateClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ShippingConfig) -> Result<Self, ShippingError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(ShippingRateClientInner {
                client,
                endpoint: config.calculate_endpoint(),
                api_key: config.api_key.clone(),
            }),
        })
    }

    /// The URL quotes are requested from.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }
}

impl std::fmt::Debug for ShippingRateClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShippingRateClient")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("api_key", &self.inner.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ShippingRates for ShippingRateClient {
    #[instrument(skip(self, request), fields(token = %request.token, items = request.items.len()))]
    async fn quote(&self, request: &RateRequest) -> Result<ShippingQuote, ShippingError> {
        if request.items.is_empty() {
            return Err(ShippingError::EmptyCart);
        }

        let mut builder = self
            .inner
            .client
            .post(self.inner.endpoint.clone())
            .json(request);
        if let Some(key) = &self.inner.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShippingError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let message = truncate(&body);
            tracing::error!(
                status = %status,
                body = %message,
                "Shipping service returned non-success status"
            );
            return Err(ShippingError::Service {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(&body),
                "Failed to parse shipping quote"
            );
            ShippingError::Parse(e)
        })
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}
