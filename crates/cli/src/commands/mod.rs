//! Command implementations.

pub mod cart;
pub mod recently_viewed;

use std::sync::Arc;

use freshcart_storefront::config::StorefrontConfig;
use freshcart_storefront::error::StorefrontError;
use freshcart_storefront::storage::{ClientStorage, FileStorage};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Storefront(#[from] StorefrontError),

    /// `cart quote` without an address argument or a stored address.
    #[error("No shipping address given and none stored in the cart")]
    MissingAddress,

    /// The rate service answered but the lookup did not resolve.
    #[error("Shipping lookup failed: {0}")]
    QuoteFailed(String),
}

/// Open the persisted client storage named by the configuration.
pub fn open_storage(config: &StorefrontConfig) -> Arc<dyn ClientStorage> {
    tracing::debug!(dir = %config.storage_dir.display(), "Opening client storage");
    Arc::new(FileStorage::new(config.storage_dir.clone()))
}
