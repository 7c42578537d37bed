//! Shopping cart state.
//!
//! [`CartState`] is the single source of truth for the cart across every UI
//! surface. It is driven through [`CartAction`]s by a [`Store`], which mirrors
//! it to `cart-storage` and notifies subscribers.
//!
//! # Shipping
//!
//! The cart never talks to the rate service itself. Setting an address (or
//! changing the contents while an address is set) moves shipping into
//! [`ShippingStatus::Calculating`] under a fresh [`ShippingRequestToken`]. The
//! caller performs the lookup and reports back with that token; results for
//! any older token are dropped, so a slow response for a previous address can
//! never overwrite a newer one.
//!
//! [`Store`]: crate::store::Store

mod line_item;
mod ops;
mod shipping;

pub use line_item::{LineItem, LineItemKey, MAX_LINE_QUANTITY};
pub use shipping::{
    ShippingAddress, ShippingMethod, ShippingQuote, ShippingRequestToken, ShippingStatus,
};

use std::collections::HashSet;

use freshcart_core::{CurrencyCode, Price, Product, ProductVariation};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::storage::CART_STORAGE_KEY;
use crate::store::Reducer;

/// Mutations accepted by [`CartState`].
#[derive(Debug, Clone)]
pub enum CartAction {
    /// Add `quantity` of a product. Non-positive quantities are ignored.
    AddItem {
        product: Box<Product>,
        variation: Option<Box<ProductVariation>>,
        quantity: i64,
    },
    /// Set a line's quantity. Non-positive quantities remove the line.
    UpdateQuantity { key: LineItemKey, quantity: i64 },
    /// Remove a line.
    RemoveItem { key: LineItemKey },
    /// Empty the cart and forget all shipping data.
    Clear,
    /// Replace the destination and start a new rate lookup.
    SetShippingAddress(ShippingAddress),
    /// Replace the candidate methods without a token check.
    SetAvailableShippingMethods(Vec<ShippingMethod>),
    /// Deliver the result of the lookup identified by `token`.
    ResolveShipping {
        token: ShippingRequestToken,
        quote: ShippingQuote,
    },
    /// Report that the lookup identified by `token` failed.
    FailShipping {
        token: ShippingRequestToken,
        reason: String,
    },
    /// Select one of the available methods by id.
    SelectShippingMethod(String),
    OpenCart,
    CloseCart,
    ToggleCart,
}

/// Cart aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CartState {
    currency: CurrencyCode,
    items: Vec<LineItem>,
    shipping_address: Option<ShippingAddress>,
    available_shipping_methods: Vec<ShippingMethod>,
    selected_shipping_method: Option<ShippingMethod>,
    /// Remembered across invalidations so a new quote can reselect it.
    preferred_method_id: Option<String>,
    restricted_products: Vec<LineItemKey>,
    shipping_status: ShippingStatus,
    last_token: ShippingRequestToken,
    is_open: bool,
}

/// Persisted subset of [`CartState`]. UI flags and the lookup status are
/// session-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartSnapshot {
    #[serde(default)]
    pub currency: CurrencyCode,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub available_shipping_methods: Vec<ShippingMethod>,
    #[serde(default)]
    pub selected_shipping_method: Option<ShippingMethod>,
    #[serde(default)]
    pub preferred_method_id: Option<String>,
    #[serde(default)]
    pub restricted_products: Vec<LineItemKey>,
}

impl CartState {
    /// An empty cart priced in `currency`.
    #[must_use]
    pub fn new(currency: CurrencyCode) -> Self {
        Self {
            currency,
            ..Self::default()
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Currency all line prices are in.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Look up a line by key.
    #[must_use]
    pub fn get_item(&self, key: &LineItemKey) -> Option<&LineItem> {
        self.items.iter().find(|item| item.key() == *key)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of unit price times quantity, rounded to the currency's minor
    /// units.
    #[must_use]
    pub fn total_price(&self) -> Price {
        let sum = self.items.iter().try_fold(Decimal::ZERO, |acc, item| {
            item.line_total()
                .and_then(|line| acc.checked_add(line.amount))
        });
        let Some(amount) = sum else {
            tracing::warn!(
                currency = %self.currency,
                lines = self.items.len(),
                "Cart total overflowed, reporting the maximum amount"
            );
            return Price::new(Decimal::MAX, self.currency);
        };
        Price::new(amount, self.currency).rounded()
    }

    /// Total price plus the selected shipping method's cost.
    #[must_use]
    pub fn total_with_shipping(&self) -> Price {
        let total = self.total_price();
        self.selected_shipping_method
            .as_ref()
            .and_then(|method| total.checked_add(&method.cost_price()))
            .map_or(total, |sum| sum.rounded())
    }

    /// Current destination, if set.
    #[must_use]
    pub const fn shipping_address(&self) -> Option<&ShippingAddress> {
        self.shipping_address.as_ref()
    }

    /// Candidate methods from the latest accepted quote.
    #[must_use]
    pub fn available_shipping_methods(&self) -> &[ShippingMethod] {
        &self.available_shipping_methods
    }

    /// Selected method. Always a member of the available methods.
    #[must_use]
    pub const fn selected_shipping_method(&self) -> Option<&ShippingMethod> {
        self.selected_shipping_method.as_ref()
    }

    /// Lines the latest quote marked as non-shippable.
    #[must_use]
    pub fn restricted_products(&self) -> &[LineItemKey] {
        &self.restricted_products
    }

    /// Whether any line cannot ship to the current address.
    #[must_use]
    pub fn has_restricted_products(&self) -> bool {
        !self.restricted_products.is_empty()
    }

    /// Where the shipping lookup stands.
    #[must_use]
    pub const fn shipping_status(&self) -> &ShippingStatus {
        &self.shipping_status
    }

    /// Whether a rate lookup is outstanding.
    #[must_use]
    pub const fn is_calculating_shipping(&self) -> bool {
        self.shipping_status.is_calculating()
    }

    /// Failure message from the last lookup, if it failed.
    #[must_use]
    pub fn shipping_error(&self) -> Option<&str> {
        match &self.shipping_status {
            ShippingStatus::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    /// Whether the cart panel is open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.is_open
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    fn add_item(
        &mut self,
        product: &Product,
        variation: Option<&ProductVariation>,
        quantity: i64,
    ) -> bool {
        let Some(quantity) = clamp_quantity(quantity) else {
            return false;
        };

        // The line is priced by the variation when one is given
        let unit_currency = variation.map_or(product.price, |v| v.price).currency_code;
        if unit_currency != self.currency {
            tracing::warn!(
                product_id = %product.id,
                variation_id = ?variation.map(|v| v.id),
                unit_currency = %unit_currency,
                cart_currency = %self.currency,
                "Ignoring item priced in a different currency"
            );
            return false;
        }

        let key = LineItemKey {
            product_id: product.id,
            variation_id: variation.map(|v| v.id),
        };

        if let Some(existing) = self.items.iter_mut().find(|item| item.key() == key) {
            let combined = existing
                .quantity
                .saturating_add(quantity)
                .min(MAX_LINE_QUANTITY);
            if combined == existing.quantity {
                return false;
            }
            existing.quantity = combined;
        } else {
            self.items
                .push(LineItem::from_product(product, variation, quantity));
        }

        self.invalidate_shipping();
        true
    }

    fn update_quantity(&mut self, key: &LineItemKey, quantity: i64) -> bool {
        let Some(index) = self.items.iter().position(|item| item.key() == *key) else {
            return false;
        };

        match clamp_quantity(quantity) {
            None => {
                self.items.remove(index);
            }
            Some(quantity) => {
                let Some(item) = self.items.get_mut(index) else {
                    return false;
                };
                if item.quantity == quantity {
                    return false;
                }
                item.quantity = quantity;
            }
        }

        self.invalidate_shipping();
        true
    }

    fn remove_item(&mut self, key: &LineItemKey) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.key() != *key);
        if self.items.len() == before {
            return false;
        }
        self.invalidate_shipping();
        true
    }

    fn clear(&mut self) -> bool {
        let cleared = Self {
            currency: self.currency,
            last_token: self.last_token,
            is_open: self.is_open,
            ..Self::default()
        };
        if *self == cleared {
            return false;
        }
        *self = cleared;
        true
    }

    fn set_shipping_address(&mut self, address: ShippingAddress) -> bool {
        self.shipping_address = Some(address);
        self.clear_quote();
        self.begin_lookup();
        true
    }

    fn apply_quote(&mut self, quote: ShippingQuote) {
        let mut seen = HashSet::new();
        let methods: Vec<ShippingMethod> = quote
            .methods
            .into_iter()
            .filter(|method| {
                if method.currency != self.currency {
                    tracing::warn!(
                        method_id = %method.method_id,
                        method_currency = %method.currency,
                        cart_currency = %self.currency,
                        "Dropping shipping method priced in a different currency"
                    );
                    return false;
                }
                seen.insert(method.method_id.clone())
            })
            .collect();

        let wanted = self
            .selected_shipping_method
            .as_ref()
            .map(|method| method.method_id.clone())
            .or_else(|| self.preferred_method_id.clone());

        self.selected_shipping_method = wanted.and_then(|id| {
            methods
                .iter()
                .find(|method| method.method_id == id)
                .cloned()
        });

        let in_cart: HashSet<LineItemKey> = self.items.iter().map(LineItem::key).collect();
        self.restricted_products = quote
            .restricted_products
            .into_iter()
            .filter(|key| in_cart.contains(key))
            .collect();

        self.available_shipping_methods = methods;
        self.shipping_status = ShippingStatus::Resolved;
    }

    fn resolve_shipping(&mut self, token: ShippingRequestToken, quote: ShippingQuote) -> bool {
        if !self.is_current(token) {
            tracing::debug!(%token, "Discarding stale shipping quote");
            return false;
        }
        self.apply_quote(quote);
        true
    }

    fn fail_shipping(&mut self, token: ShippingRequestToken, reason: String) -> bool {
        if !self.is_current(token) {
            tracing::debug!(%token, "Discarding stale shipping failure");
            return false;
        }
        self.clear_quote();
        self.shipping_status = ShippingStatus::Failed { reason };
        true
    }

    fn select_shipping_method(&mut self, method_id: &str) -> bool {
        let Some(method) = self
            .available_shipping_methods
            .iter()
            .find(|method| method.method_id == method_id)
        else {
            return false;
        };

        if self.selected_shipping_method.as_ref() == Some(method) {
            return false;
        }

        self.selected_shipping_method = Some(method.clone());
        self.preferred_method_id = Some(method.method_id.clone());
        true
    }

    fn set_open(&mut self, open: bool) -> bool {
        if self.is_open == open {
            return false;
        }
        self.is_open = open;
        true
    }

    /// Drop the current quote after a contents change and, when a quote is
    /// possible, start a new lookup.
    fn invalidate_shipping(&mut self) {
        self.clear_quote();
        if self.shipping_address.is_some() && !self.items.is_empty() {
            self.begin_lookup();
        } else {
            self.shipping_status = ShippingStatus::Idle;
        }
    }

    fn clear_quote(&mut self) {
        self.available_shipping_methods.clear();
        self.selected_shipping_method = None;
        self.restricted_products.clear();
    }

    fn begin_lookup(&mut self) {
        self.last_token = self.last_token.next();
        self.shipping_status = ShippingStatus::Calculating {
            token: self.last_token,
        };
    }

    fn is_current(&self, token: ShippingRequestToken) -> bool {
        self.shipping_status.pending_token() == Some(token)
    }
}

impl Reducer for CartState {
    const STORAGE_KEY: &'static str = CART_STORAGE_KEY;
    type Action = CartAction;
    type Snapshot = CartSnapshot;

    fn reduce(&mut self, action: Self::Action) -> bool {
        match action {
            CartAction::AddItem {
                product,
                variation,
                quantity,
            } => self.add_item(&product, variation.as_deref(), quantity),
            CartAction::UpdateQuantity { key, quantity } => self.update_quantity(&key, quantity),
            CartAction::RemoveItem { key } => self.remove_item(&key),
            CartAction::Clear => self.clear(),
            CartAction::SetShippingAddress(address) => self.set_shipping_address(address),
            CartAction::SetAvailableShippingMethods(methods) => {
                let before = self.clone();
                self.apply_quote(ShippingQuote {
                    methods,
                    restricted_products: Vec::new(),
                });
                *self != before
            }
            CartAction::ResolveShipping { token, quote } => self.resolve_shipping(token, quote),
            CartAction::FailShipping { token, reason } => self.fail_shipping(token, reason),
            CartAction::SelectShippingMethod(method_id) => self.select_shipping_method(&method_id),
            CartAction::OpenCart => self.set_open(true),
            CartAction::CloseCart => self.set_open(false),
            CartAction::ToggleCart => self.set_open(!self.is_open),
        }
    }

    fn snapshot(&self) -> Self::Snapshot {
        CartSnapshot {
            currency: self.currency,
            items: self.items.clone(),
            shipping_address: self.shipping_address.clone(),
            available_shipping_methods: self.available_shipping_methods.clone(),
            selected_shipping_method: self.selected_shipping_method.clone(),
            preferred_method_id: self.preferred_method_id.clone(),
            restricted_products: self.restricted_products.clone(),
        }
    }

    fn restore(snapshot: Self::Snapshot) -> Self {
        let mut items: Vec<LineItem> = Vec::with_capacity(snapshot.items.len());
        for item in snapshot.items {
            if item.quantity == 0 || item.unit_price.currency_code != snapshot.currency {
                continue;
            }
            if let Some(existing) = items.iter_mut().find(|i| i.key() == item.key()) {
                existing.quantity = existing
                    .quantity
                    .saturating_add(item.quantity)
                    .min(MAX_LINE_QUANTITY);
            } else {
                items.push(LineItem {
                    quantity: item.quantity.min(MAX_LINE_QUANTITY),
                    ..item
                });
            }
        }

        let mut state = Self {
            currency: snapshot.currency,
            items,
            shipping_address: snapshot.shipping_address,
            preferred_method_id: snapshot.preferred_method_id,
            selected_shipping_method: snapshot.selected_shipping_method,
            ..Self::default()
        };

        if !snapshot.available_shipping_methods.is_empty() {
            state.apply_quote(ShippingQuote {
                methods: snapshot.available_shipping_methods,
                restricted_products: snapshot.restricted_products,
            });
        } else {
            state.selected_shipping_method = None;
            // A persisted address without a quote needs a fresh lookup
            state.invalidate_shipping();
        }
        state
    }
}

/// Normalize a requested quantity: `None` for non-positive values, otherwise
/// clamped to [`MAX_LINE_QUANTITY`].
fn clamp_quantity(quantity: i64) -> Option<u32> {
    if quantity <= 0 {
        return None;
    }
    let capped = quantity.min(i64::from(MAX_LINE_QUANTITY));
    u32::try_from(capped).ok()
}
