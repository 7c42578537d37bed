//! Unified error type for callers that drive several storefront components.
//!
//! The stores themselves never fail: invalid input is normalized and storage
//! errors are logged and ignored. Errors surface only at the edges (config,
//! catalog validation, shipping lookups, explicit storage maintenance), and
//! [`StorefrontError`] collects those for binaries.

use freshcart_core::ProductError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::shipping::ShippingError;
use crate::storage::StorageError;
use crate::store::PersistError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Storage backend failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Persisted snapshot could not be read or written.
    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    /// Catalog payload failed validation.
    #[error("Invalid product: {0}")]
    Product(#[from] ProductError),

    /// Shipping-rate lookup failed.
    #[error("Shipping error: {0}")]
    Shipping(#[from] ShippingError),
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storefront_error_display() {
        let err = StorefrontError::from(ShippingError::EmptyCart);
        assert_eq!(
            err.to_string(),
            "Shipping error: Cannot quote shipping for an empty cart"
        );

        let err = StorefrontError::from(ProductError::EmptyName(3));
        assert_eq!(err.to_string(), "Invalid product: product 3 has an empty name");
    }
}
