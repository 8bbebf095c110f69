//! Database operations for storefront `PostgreSQL`.
//!
//! # Database: `sugarloaf`
//!
//! ## Tables (schema `storefront`)
//!
//! - `product` - Catalog products (read-only from this service)
//! - `cart` - One row per user
//! - `cart_item` - Cart lines, unique per `(cart_id, product_id)`
//! - `tower_sessions.session` - Session storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p sugarloaf-cli -- migrate
//! ```
//!
//! # Repositories
//!
//! The cart service depends on the [`ProductRepository`] and [`CartRepository`]
//! traits rather than on `PostgreSQL` directly. The `Pg*` types are the
//! production implementations; [`memory::MemoryStore`] (feature
//! `test-support`) is an in-process implementation for tests.

pub mod carts;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod products;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::{CartRepository, PgCartRepository};
pub use products::{PgProductRepository, ProductRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Incrementing a cart line would overflow its stored quantity.
    #[error("cart line quantity overflow")]
    QuantityOverflow,
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
