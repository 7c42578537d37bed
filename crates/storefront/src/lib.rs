//! FreshCart Storefront library.
//!
//! Client-side session state for the grocery storefront: the shopping cart and
//! the recently-viewed list, each held in a persisted, reactive [`Store`].
//!
//! # Architecture
//!
//! - [`store`] - generic `get_state` / `subscribe` / `dispatch` container with
//!   write-through persistence
//! - [`cart`] - cart state, line items, and the shipping lookup state machine
//! - [`recently_viewed`] - bounded viewing history
//! - [`storage`] - durable client storage backends
//! - [`shipping`] - shipping-rate service client
//! - [`config`] - environment configuration
//!
//! Page rendering, routing, and catalog fetching live elsewhere; this crate
//! only consumes validated catalog records from `freshcart-core`.
//!
//! [`Store`]: store::Store

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod recently_viewed;
pub mod shipping;
pub mod storage;
pub mod store;

pub use cart::{CartAction, CartState};
pub use recently_viewed::{RecentProduct, RecentlyViewed};
pub use store::Store;
