//! Integration test support for FreshCart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p freshcart-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_persistence` - Cart state across sessions through `FileStorage`
//! - `recently_viewed` - Viewing history across sessions
//! - `shipping_flow` - Checkout shipping against a stub rate service
//!
//! Nothing here needs network access beyond loopback.

#![allow(clippy::missing_panics_doc)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use freshcart_core::{Product, ProductPayload, ProductVariation, VariationPayload};
use freshcart_storefront::config::ShippingConfig;
use freshcart_storefront::storage::FileStorage;
use secrecy::SecretString;
use url::Url;
use uuid::Uuid;

/// API key the stub service expects.
pub const STUB_API_KEY: &str = "rk_live_9fQ2xLm7TzW4pB8v";

// =============================================================================
// Storage
// =============================================================================

/// A uniquely named directory under the system temp dir, removed on drop.
#[derive(Debug)]
pub struct TempStorageDir {
    path: PathBuf,
}

impl TempStorageDir {
    #[must_use]
    pub fn new() -> Self {
        Self {
            path: std::env::temp_dir().join(format!("freshcart-it-{}", Uuid::new_v4())),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A fresh backend over this directory, as a new page load would open.
    #[must_use]
    pub fn storage(&self) -> Arc<FileStorage> {
        Arc::new(FileStorage::new(&self.path))
    }

    /// Raw contents of the file backing `key`, if written.
    #[must_use]
    pub fn read_raw(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path.join(format!("{key}.json"))).ok()
    }

    /// Overwrite the file backing `key`.
    pub fn write_raw(&self, key: &str, contents: &str) {
        std::fs::create_dir_all(&self.path).expect("create storage dir");
        std::fs::write(self.path.join(format!("{key}.json")), contents).expect("write raw value");
    }
}

impl Default for TempStorageDir {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TempStorageDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

// =============================================================================
// Catalog Fixtures
// =============================================================================

/// A simple in-stock product priced in SEK.
#[must_use]
pub fn product(id: i64, name: &str, price: &str) -> Product {
    let slug = name.to_lowercase().replace(' ', "-");
    let payload: ProductPayload = serde_json::from_value(serde_json::json!({
        "id": id,
        "name": name,
        "slug": slug,
        "price": price,
        "regular_price": price,
        "stock_status": "instock",
        "images": [{"src": format!("https://cdn.freshcart.se/products/{slug}.jpg"), "alt": name}],
        "categories": [{"id": 10, "name": "Skafferi", "slug": "skafferi"}]
    }))
    .expect("valid product payload");
    Product::try_from(payload).expect("valid product")
}

/// A variation with a single attribute.
#[must_use]
pub fn variation(id: i64, price: &str, option: &str) -> ProductVariation {
    let payload: VariationPayload = serde_json::from_value(serde_json::json!({
        "id": id,
        "price": price,
        "stock_status": "instock",
        "attributes": [{"name": "Storlek", "option": option}]
    }))
    .expect("valid variation payload");
    ProductVariation::try_from(payload).expect("valid variation")
}

// =============================================================================
// Stub Rate Service
// =============================================================================

/// How the stub answers every request.
#[derive(Debug, Clone)]
pub enum StubReply {
    /// 200 with this JSON body.
    Quote(serde_json::Value),
    /// 429 with a `Retry-After` header.
    RateLimited(u64),
    /// This status with a plain-text body.
    Status(u16, String),
    /// 200 with a plain-text body.
    Raw(String),
}

/// A request as the stub saw it.
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub authorization: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Debug)]
struct StubState {
    reply: Mutex<StubReply>,
    received: Mutex<Vec<ReceivedRequest>>,
}

/// Shipping-rate service on a loopback port.
#[derive(Debug, Clone)]
pub struct StubRateService {
    base_url: Url,
    state: Arc<StubState>,
}

impl StubRateService {
    /// Bind to an ephemeral port and serve `POST /api/shipping/calculate`.
    pub async fn start(reply: StubReply) -> Self {
        let state = Arc::new(StubState {
            reply: Mutex::new(reply),
            received: Mutex::new(Vec::new()),
        });

        let router = Router::new()
            .route("/api/shipping/calculate", post(calculate))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let base_url = Url::parse(&format!("http://{addr}/api/")).expect("stub base url");
        Self { base_url, state }
    }

    /// Client configuration pointing at this stub.
    #[must_use]
    pub fn config(&self) -> ShippingConfig {
        ShippingConfig {
            api_url: self.base_url.clone(),
            api_key: Some(SecretString::from(STUB_API_KEY)),
            timeout: Duration::from_secs(5),
        }
    }

    /// Change the reply for subsequent requests.
    pub fn set_reply(&self, reply: StubReply) {
        *self.state.reply.lock().expect("stub lock") = reply;
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn received(&self) -> Vec<ReceivedRequest> {
        self.state.received.lock().expect("stub lock").clone()
    }
}

async fn calculate(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    state
        .received
        .lock()
        .expect("stub lock")
        .push(ReceivedRequest {
            authorization,
            body,
        });

    let reply = state.reply.lock().expect("stub lock").clone();
    match reply {
        StubReply::Quote(quote) => Json(quote).into_response(),
        StubReply::RateLimited(secs) => (
            StatusCode::TOO_MANY_REQUESTS,
            [("Retry-After", secs.to_string())],
            "slow down",
        )
            .into_response(),
        StubReply::Status(code, body) => (
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response(),
        StubReply::Raw(body) => body.into_response(),
    }
}
