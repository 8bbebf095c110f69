//! Sugarloaf Storefront library.
//!
//! Cart and product JSON API. The binary in `main.rs` wires these modules to
//! `PostgreSQL`; the library is also used directly by the integration tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
