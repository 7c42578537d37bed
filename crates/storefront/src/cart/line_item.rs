//! Cart line items.

use freshcart_core::{Image, Price, Product, ProductId, ProductVariation, StockStatus, VariationId};
use serde::{Deserialize, Serialize};

/// Upper bound on a single line's quantity. Larger requests are clamped.
pub const MAX_LINE_QUANTITY: u32 = 999;

/// Identity of a line: one line per product/variation pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineItemKey {
    pub product_id: ProductId,
    #[serde(default)]
    pub variation_id: Option<VariationId>,
}

impl LineItemKey {
    /// Key for a simple (non-variable) product.
    #[must_use]
    pub const fn product(product_id: ProductId) -> Self {
        Self {
            product_id,
            variation_id: None,
        }
    }

    /// Key for a specific variation of a product.
    #[must_use]
    pub const fn variation(product_id: ProductId, variation_id: VariationId) -> Self {
        Self {
            product_id,
            variation_id: Some(variation_id),
        }
    }
}

/// One product or variation in the cart.
///
/// Price and metadata are snapshots taken when the item was first added; they
/// are not refreshed when the catalog changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub variation_id: Option<VariationId>,
    /// Always at least 1 while the line exists.
    pub quantity: u32,
    pub unit_price: Price,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(default)]
    pub stock_status: StockStatus,
    /// Variation attributes joined for display (e.g., `"1 kg"`).
    #[serde(default)]
    pub variation_label: Option<String>,
}

impl LineItem {
    /// Snapshot a product (and optional variation) into a line.
    ///
    /// Variation price, image, and stock status win over the parent product's.
    #[must_use]
    pub fn from_product(
        product: &Product,
        variation: Option<&ProductVariation>,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product.id,
            variation_id: variation.map(|v| v.id),
            quantity,
            unit_price: variation.map_or(product.price, |v| v.price),
            name: product.name.clone(),
            slug: product.slug.clone(),
            image: variation
                .and_then(|v| v.image.clone())
                .or_else(|| product.primary_image().cloned()),
            stock_status: variation.map_or(product.stock_status, |v| v.stock_status),
            variation_label: variation.and_then(ProductVariation::label),
        }
    }

    /// The line's identity.
    #[must_use]
    pub const fn key(&self) -> LineItemKey {
        LineItemKey {
            product_id: self.product_id,
            variation_id: self.variation_id,
        }
    }

    /// Unit price times quantity. `None` on decimal overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<Price> {
        self.unit_price.checked_mul_quantity(self.quantity)
    }
}
