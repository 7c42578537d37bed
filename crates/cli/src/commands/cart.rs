//! Persisted cart commands.
//!
//! # Usage
//!
//! ```bash
//! # Print the persisted cart
//! fc-cli cart show
//!
//! # Empty the cart and forget the shipping address
//! fc-cli cart clear
//!
//! # Quote shipping for the persisted cart (uses the stored address if none given)
//! fc-cli cart quote --postcode "111 22" --city Stockholm --country SE
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_STORAGE_DIR` - Directory holding `cart-storage.json`
//! - `SHIPPING_API_URL` - Shipping-rate service (required for `quote`)
//! - `SHIPPING_API_KEY` - Bearer token for the shipping-rate service

use freshcart_storefront::cart::{CartState, ShippingAddress};
use freshcart_storefront::config::StorefrontConfig;
use freshcart_storefront::error::StorefrontError;
use freshcart_storefront::shipping::{ShippingError, ShippingRateClient, refresh_shipping};
use freshcart_storefront::store::Store;

use super::{CommandError, open_storage};

/// Load the persisted cart, failing loudly on unreadable data. A missing cart
/// starts empty in the configured currency.
fn load_cart(config: &StorefrontConfig) -> Result<Store<CartState>, StorefrontError> {
    let storage = open_storage(config);
    Ok(Store::try_hydrate_or(storage, CartState::new(config.currency))?)
}

/// Log the cart contents, totals, and shipping selection.
///
/// # Errors
///
/// Fails if the persisted cart cannot be read.
pub fn show(config: &StorefrontConfig) -> Result<(), CommandError> {
    let cart = load_cart(config)?;
    log_cart(cart.get_state());
    Ok(())
}

/// Empty the persisted cart.
///
/// # Errors
///
/// Fails if the persisted cart cannot be read or the cleared cart cannot be
/// written back.
pub fn clear(config: &StorefrontConfig) -> Result<(), CommandError> {
    let mut cart = load_cart(config)?;
    if cart.clear_cart() {
        cart.flush().map_err(StorefrontError::from)?;
        tracing::info!("Cart cleared");
    } else {
        tracing::info!("Cart was already empty");
    }
    Ok(())
}

/// Request a shipping quote for the persisted cart and store the result.
///
/// # Errors
///
/// Fails if the shipping service is not configured, the cart is empty, no
/// address is known, the lookup fails, or the result cannot be stored.
pub async fn quote(
    config: &StorefrontConfig,
    address: Option<ShippingAddress>,
) -> Result<(), CommandError> {
    let shipping = config.require_shipping().map_err(StorefrontError::from)?;
    let client = ShippingRateClient::new(shipping).map_err(StorefrontError::from)?;
    let mut cart = load_cart(config)?;

    if cart.get_state().is_empty() {
        return Err(StorefrontError::from(ShippingError::EmptyCart).into());
    }

    // A stored address is re-set to force a fresh lookup
    let address = address
        .or_else(|| cart.get_state().shipping_address().cloned())
        .ok_or(CommandError::MissingAddress)?;
    let token = cart.set_shipping_address(address);

    tracing::info!(%token, endpoint = %client.endpoint(), "Requesting shipping quote...");
    refresh_shipping(&mut cart, &client).await;
    cart.flush().map_err(StorefrontError::from)?;

    let state = cart.get_state();
    if let Some(reason) = state.shipping_error() {
        return Err(CommandError::QuoteFailed(reason.to_string()));
    }

    log_cart(state);
    Ok(())
}

fn log_cart(state: &CartState) {
    if state.is_empty() {
        tracing::info!("Cart is empty");
    }

    for item in state.items() {
        tracing::info!(
            product_id = %item.product_id,
            variation = item.variation_label.as_deref().unwrap_or("-"),
            quantity = item.quantity,
            unit_price = %item.unit_price,
            "{}",
            item.name
        );
    }

    tracing::info!(
        items = state.total_items(),
        total = %state.total_price(),
        "Cart total"
    );

    if let Some(address) = state.shipping_address() {
        tracing::info!(
            postcode = %address.postcode,
            city = %address.city,
            country = %address.country,
            "Shipping address"
        );
    }

    for method in state.available_shipping_methods() {
        let selected = state
            .selected_shipping_method()
            .is_some_and(|s| s.method_id == method.method_id);
        tracing::info!(
            method_id = %method.method_id,
            cost = %method.cost_price(),
            selected,
            "{}",
            method.label
        );
    }

    for key in state.restricted_products() {
        tracing::warn!(product_id = %key.product_id, "Cannot ship to this address");
    }

    if state.selected_shipping_method().is_some() {
        tracing::info!(total = %state.total_with_shipping(), "Total with shipping");
    }
}
