//! Cart error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during cart operations.
///
/// Display strings are returned verbatim to API clients.
#[derive(Debug, Error)]
pub enum CartError {
    /// The caller's identity is blank or a missing-value marker.
    #[error("Invalid user")]
    InvalidUser,

    #[error("Product ID is required")]
    ProductIdRequired,

    #[error("Quantity is required")]
    QuantityRequired,

    #[error("Quantity must be greater than 0")]
    QuantityMustBePositive,

    /// Live stock is below the requested quantity.
    #[error("Insufficient stock")]
    InsufficientStock,

    #[error("Product not found")]
    ProductNotFound,

    #[error("Cart not found")]
    CartNotFound,

    #[error("Item not found in cart")]
    ItemNotFoundInCart,

    /// The line's quantity would exceed what a cart line can hold.
    #[error("Quantity exceeds the maximum allowed")]
    QuantityTooLarge,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
