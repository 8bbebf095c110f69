//! Sugarloaf Core - Shared types library.
//!
//! This crate provides common types used across all Sugarloaf components:
//! - `storefront` - Cart and catalog JSON API
//! - `cli` - Command-line tools for migrations
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Image normalization lives here because both the product
//! repository and the cart formatting depend on it and neither should own it.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, prices, image records, products, and cart types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
