//! Business logic services for storefront.
//!
//! # Services
//!
//! - `cart` - Cart validation, stock checks, pruning and totals

pub mod cart;

pub use cart::{CartError, CartService};
