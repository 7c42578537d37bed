//! FreshCart Core - Shared types library.
//!
//! This crate provides common types used across all FreshCart components:
//! - `storefront` - Cart and recently-viewed state stores
//! - `cli` - Command-line tools for inspecting persisted state
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, stock statuses,
//!   and validated catalog records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
