//! Catalog records as consumed by the cart and recently-viewed stores.
//!
//! The commerce backend returns loosely-typed JSON: prices are strings that may
//! be empty, most fields may be missing, and image lists may contain blanks.
//! The `*Payload` types describe that wire shape with explicit optional fields.
//! They are validated once into [`Product`] and [`ProductVariation`] so that
//! nothing downstream has to second-guess the shape.

use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId, VariationId};
use super::price::{CurrencyCode, Price, PriceError};
use super::status::StockStatus;

/// Errors that can occur when validating a catalog payload.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductError {
    /// IDs issued by the backend are always positive.
    #[error("invalid id: {0}")]
    InvalidId(i64),
    /// The product has no name.
    #[error("product {0} has an empty name")]
    EmptyName(i64),
    /// The product has no slug.
    #[error("product {0} has an empty slug")]
    EmptySlug(i64),
    /// No usable price field was present.
    #[error("product {0} has no price")]
    MissingPrice(i64),
    /// A price field could not be parsed.
    #[error("invalid {field} on {id}: {source}")]
    InvalidPrice {
        /// Catalog ID of the offending record.
        id: i64,
        /// Name of the price field.
        field: &'static str,
        /// Underlying parse error.
        #[source]
        source: PriceError,
    },
}

// =============================================================================
// Wire Payloads
// =============================================================================

/// Image as returned by the catalog service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ImagePayload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub alt: Option<String>,
}

/// Category reference as returned by the catalog service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPayload {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

/// Variation attribute (e.g., `Weight: 500 g`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributePayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub option: String,
}

/// Product record as returned by the catalog service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPayload {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub regular_price: Option<String>,
    #[serde(default)]
    pub sale_price: Option<String>,
    #[serde(default)]
    pub stock_status: Option<StockStatus>,
    #[serde(default)]
    pub images: Vec<ImagePayload>,
    #[serde(default)]
    pub categories: Vec<CategoryPayload>,
}

/// Product variation record as returned by the catalog service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationPayload {
    pub id: i64,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub regular_price: Option<String>,
    #[serde(default)]
    pub sale_price: Option<String>,
    #[serde(default)]
    pub stock_status: Option<StockStatus>,
    #[serde(default)]
    pub image: Option<ImagePayload>,
    #[serde(default)]
    pub attributes: Vec<AttributePayload>,
}

// =============================================================================
// Validated Records
// =============================================================================

/// A product or variation image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Image URL.
    pub src: String,
    /// Alt text for accessibility.
    pub alt: Option<String>,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// A selected variation attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationAttribute {
    pub name: String,
    pub option: String,
}

/// A validated catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    /// Effective selling price.
    pub price: Price,
    /// List price before any sale.
    pub regular_price: Option<Price>,
    /// Sale price when the product is on sale.
    pub sale_price: Option<Price>,
    pub stock_status: StockStatus,
    pub images: Vec<Image>,
    pub categories: Vec<Category>,
}

impl Product {
    /// Validate a catalog payload.
    ///
    /// The effective price falls back from `price` to `sale_price` to
    /// `regular_price`. Empty strings are treated as absent. Images without a
    /// URL are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is not positive, the name or slug is empty,
    /// or no valid price is present.
    pub fn from_payload(
        payload: ProductPayload,
        currency: CurrencyCode,
    ) -> Result<Self, ProductError> {
        let raw_id = payload.id;
        if raw_id <= 0 {
            return Err(ProductError::InvalidId(raw_id));
        }

        let name = payload.name.trim().to_string();
        if name.is_empty() {
            return Err(ProductError::EmptyName(raw_id));
        }

        let slug = payload.slug.trim().to_string();
        if slug.is_empty() {
            return Err(ProductError::EmptySlug(raw_id));
        }

        let fields = PriceFields::parse(
            raw_id,
            payload.price.as_deref(),
            payload.regular_price.as_deref(),
            payload.sale_price.as_deref(),
            currency,
        )?;

        Ok(Self {
            id: ProductId::new(raw_id),
            name,
            slug,
            price: fields.price,
            regular_price: fields.regular_price,
            sale_price: fields.sale_price,
            stock_status: payload.stock_status.unwrap_or_default(),
            images: payload.images.into_iter().filter_map(Image::from_payload).collect(),
            categories: payload
                .categories
                .into_iter()
                .filter(|c| c.id > 0)
                .map(|c| Category {
                    id: CategoryId::new(c.id),
                    name: c.name,
                    slug: c.slug,
                })
                .collect(),
        })
    }

    /// The first product image, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&Image> {
        self.images.first()
    }

    /// The first product category, if any.
    #[must_use]
    pub fn primary_category(&self) -> Option<&Category> {
        self.categories.first()
    }

    /// Whether a sale price below the regular price is active.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        match (&self.sale_price, &self.regular_price) {
            (Some(sale), Some(regular)) => sale.amount < regular.amount,
            _ => false,
        }
    }
}

impl TryFrom<ProductPayload> for Product {
    type Error = ProductError;

    fn try_from(payload: ProductPayload) -> Result<Self, Self::Error> {
        Self::from_payload(payload, CurrencyCode::default())
    }
}

/// A validated product variation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariation {
    pub id: VariationId,
    pub price: Price,
    pub regular_price: Option<Price>,
    pub sale_price: Option<Price>,
    pub stock_status: StockStatus,
    pub image: Option<Image>,
    pub attributes: Vec<VariationAttribute>,
}

impl ProductVariation {
    /// Validate a variation payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is not positive or no valid price is present.
    pub fn from_payload(
        payload: VariationPayload,
        currency: CurrencyCode,
    ) -> Result<Self, ProductError> {
        let raw_id = payload.id;
        if raw_id <= 0 {
            return Err(ProductError::InvalidId(raw_id));
        }

        let fields = PriceFields::parse(
            raw_id,
            payload.price.as_deref(),
            payload.regular_price.as_deref(),
            payload.sale_price.as_deref(),
            currency,
        )?;

        Ok(Self {
            id: VariationId::new(raw_id),
            price: fields.price,
            regular_price: fields.regular_price,
            sale_price: fields.sale_price,
            stock_status: payload.stock_status.unwrap_or_default(),
            image: payload.image.and_then(Image::from_payload),
            attributes: payload
                .attributes
                .into_iter()
                .filter(|a| !a.option.is_empty())
                .map(|a| VariationAttribute {
                    name: a.name,
                    option: a.option,
                })
                .collect(),
        })
    }

    /// Human-readable label built from the attribute options (e.g., `"500 g"`).
    #[must_use]
    pub fn label(&self) -> Option<String> {
        if self.attributes.is_empty() {
            return None;
        }
        Some(
            self.attributes
                .iter()
                .map(|a| a.option.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

impl TryFrom<VariationPayload> for ProductVariation {
    type Error = ProductError;

    fn try_from(payload: VariationPayload) -> Result<Self, Self::Error> {
        Self::from_payload(payload, CurrencyCode::default())
    }
}

impl Image {
    fn from_payload(payload: ImagePayload) -> Option<Self> {
        let src = payload.src.trim();
        if src.is_empty() {
            return None;
        }
        Some(Self {
            src: src.to_string(),
            alt: payload.alt.filter(|a| !a.is_empty()),
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

struct PriceFields {
    price: Price,
    regular_price: Option<Price>,
    sale_price: Option<Price>,
}

impl PriceFields {
    fn parse(
        id: i64,
        price: Option<&str>,
        regular_price: Option<&str>,
        sale_price: Option<&str>,
        currency: CurrencyCode,
    ) -> Result<Self, ProductError> {
        let price = parse_optional(id, "price", price, currency)?;
        let regular_price = parse_optional(id, "regular_price", regular_price, currency)?;
        let sale_price = parse_optional(id, "sale_price", sale_price, currency)?;

        let effective = price
            .or(sale_price)
            .or(regular_price)
            .ok_or(ProductError::MissingPrice(id))?;

        Ok(Self {
            price: effective,
            regular_price,
            sale_price,
        })
    }
}

/// Parse an optional price string, treating blank strings as absent.
fn parse_optional(
    id: i64,
    field: &'static str,
    value: Option<&str>,
    currency: CurrencyCode,
) -> Result<Option<Price>, ProductError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => Price::parse(raw, currency)
            .map(Some)
            .map_err(|source| ProductError::InvalidPrice { id, field, source }),
    }
}
