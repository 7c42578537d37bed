//! Cart operations on a [`Store<CartState>`].
//!
//! Thin wrappers that build the matching [`CartAction`] and dispatch it, plus
//! the derived queries the rendering layer reads on every render.

use freshcart_core::{Price, Product, ProductId, ProductVariation, VariationId};

use super::{
    CartAction, CartState, LineItemKey, ShippingAddress, ShippingMethod, ShippingQuote,
    ShippingRequestToken,
};
use crate::shipping::{RateRequest, ShippingError};
use crate::store::Store;

impl Store<CartState> {
    /// Add `quantity` of a product (or one of its variations).
    ///
    /// Quantities add up when the line already exists. Non-positive
    /// quantities are ignored.
    pub fn add_item(
        &mut self,
        product: &Product,
        quantity: i64,
        variation: Option<&ProductVariation>,
    ) -> bool {
        self.dispatch(CartAction::AddItem {
            product: Box::new(product.clone()),
            variation: variation.map(|v| Box::new(v.clone())),
            quantity,
        })
    }

    /// Set a line's quantity; zero or less removes it. Unknown lines are
    /// ignored.
    pub fn update_quantity(
        &mut self,
        product_id: ProductId,
        variation_id: Option<VariationId>,
        quantity: i64,
    ) -> bool {
        self.dispatch(CartAction::UpdateQuantity {
            key: LineItemKey {
                product_id,
                variation_id,
            },
            quantity,
        })
    }

    /// Remove a line if present.
    pub fn remove_item(&mut self, product_id: ProductId, variation_id: Option<VariationId>) -> bool {
        self.dispatch(CartAction::RemoveItem {
            key: LineItemKey {
                product_id,
                variation_id,
            },
        })
    }

    /// Empty the cart, address, and shipping selection.
    pub fn clear_cart(&mut self) -> bool {
        self.dispatch(CartAction::Clear)
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn get_total_items(&self) -> u64 {
        self.get_state().total_items()
    }

    /// Sum of line totals, rounded to the currency's minor units.
    #[must_use]
    pub fn get_total_price(&self) -> Price {
        self.get_state().total_price()
    }

    /// Total price plus the selected shipping method's cost.
    #[must_use]
    pub fn get_subtotal_with_shipping(&self) -> Price {
        self.get_state().total_with_shipping()
    }

    /// Set the destination. Returns the token the caller must quote under.
    pub fn set_shipping_address(&mut self, address: ShippingAddress) -> ShippingRequestToken {
        self.dispatch(CartAction::SetShippingAddress(address));
        // Setting an address always starts a lookup
        self.get_state()
            .shipping_status()
            .pending_token()
            .unwrap_or_default()
    }

    /// Replace the candidate methods directly, keeping the previous selection
    /// when its id is still offered. Methods priced in another currency than
    /// the cart are dropped. Returns `false` when nothing changed.
    pub fn set_available_shipping_methods(&mut self, methods: Vec<ShippingMethod>) -> bool {
        self.dispatch(CartAction::SetAvailableShippingMethods(methods))
    }

    /// Select an available method by id. Unknown ids are ignored.
    pub fn select_shipping_method(&mut self, method_id: &str) -> bool {
        self.dispatch(CartAction::SelectShippingMethod(method_id.to_string()))
    }

    /// Show the cart panel. Returns `false` when it was already open.
    pub fn open_cart(&mut self) -> bool {
        self.dispatch(CartAction::OpenCart)
    }

    /// Hide the cart panel. Returns `false` when it was already closed.
    pub fn close_cart(&mut self) -> bool {
        self.dispatch(CartAction::CloseCart)
    }

    /// Flip the cart panel between open and closed.
    pub fn toggle_cart(&mut self) -> bool {
        self.dispatch(CartAction::ToggleCart)
    }

    /// The lookup the caller should perform now, if one is outstanding.
    #[must_use]
    pub fn pending_shipping_request(&self) -> Option<RateRequest> {
        let state = self.get_state();
        let token = state.shipping_status().pending_token()?;
        let address = state.shipping_address()?.clone();
        Some(RateRequest::new(token, state.items(), address))
    }

    /// Feed back the outcome of the lookup identified by `token`. Returns
    /// `false` when the result was stale and discarded.
    pub fn complete_shipping_request(
        &mut self,
        token: ShippingRequestToken,
        result: Result<ShippingQuote, ShippingError>,
    ) -> bool {
        match result {
            Ok(quote) => self.dispatch(CartAction::ResolveShipping { token, quote }),
            Err(e) => self.dispatch(CartAction::FailShipping {
                token,
                reason: e.to_string(),
            }),
        }
    }
}
