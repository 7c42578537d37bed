//! Recently viewed product commands.
//!
//! # Usage
//!
//! ```bash
//! fc-cli recent show
//! fc-cli recent clear
//! ```

use freshcart_storefront::config::StorefrontConfig;
use freshcart_storefront::error::StorefrontError;
use freshcart_storefront::recently_viewed::RecentlyViewed;
use freshcart_storefront::store::Store;

use super::{CommandError, open_storage};

fn load(config: &StorefrontConfig) -> Result<Store<RecentlyViewed>, StorefrontError> {
    let storage = open_storage(config);
    Ok(Store::try_hydrate_or(storage, RecentlyViewed::default())?)
}

/// Log the viewing history, most recent first.
///
/// # Errors
///
/// Fails if the persisted history cannot be read.
pub fn show(config: &StorefrontConfig) -> Result<(), CommandError> {
    let store = load(config)?;
    let products = store.get_products();

    if products.is_empty() {
        tracing::info!("No recently viewed products");
        return Ok(());
    }

    for (position, product) in products.iter().enumerate() {
        tracing::info!(
            position = position + 1,
            id = %product.id,
            slug = %product.slug,
            price = %product.price,
            category = product.category.as_ref().map_or("-", |c| c.name.as_str()),
            "{}",
            product.name
        );
    }
    Ok(())
}

/// Forget the viewing history.
///
/// # Errors
///
/// Fails if the persisted history cannot be read or the empty history cannot
/// be written back.
pub fn clear(config: &StorefrontConfig) -> Result<(), CommandError> {
    let mut store = load(config)?;
    if store.clear_all() {
        store.flush().map_err(StorefrontError::from)?;
        tracing::info!("Recently viewed products cleared");
    } else {
        tracing::info!("Nothing to clear");
    }
    Ok(())
}
