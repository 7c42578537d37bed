//! Core types for FreshCart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod product;
pub mod status;

pub use id::*;
pub use price::{CurrencyCode, Price, PriceError};
pub use product::{
    AttributePayload, Category, CategoryPayload, Image, ImagePayload, Product, ProductError,
    ProductPayload, ProductVariation, VariationAttribute, VariationPayload,
};
pub use status::*;
