//! Core types for Sugarloaf.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod image;
pub mod price;
pub mod product;

pub use cart::{
    AddToCartRequest, Cart, CartItem, CartLine, CartResponse, CartView, PopulatedCart,
    PopulatedCartItem, RemoveFromCartRequest, UpdateCartItemRequest,
};
pub use id::{IdError, ProductId, UserId};
pub use image::{
    DEFAULT_PLACEHOLDER_URL, ImageFormats, ImageMetadata, ImageNormalizer, ImageRecord,
    ImageVariants, RawImage,
};
pub use price::{NegativePrice, Price};
pub use product::Product;
