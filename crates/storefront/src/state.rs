//! Application state shared across handlers.

use std::sync::Arc;

use crate::db::{CartRepository, PgCartRepository, PgProductRepository, ProductRepository};
use crate::services::CartService;

/// Application state shared across all handlers.
///
/// Generic over the repositories so the same router runs against
/// `PostgreSQL` in production and an in-memory store in tests. Cheaply
/// cloneable via `Arc`.
pub struct AppState<P = PgProductRepository, C = PgCartRepository> {
    inner: Arc<AppStateInner<P, C>>,
}

struct AppStateInner<P, C> {
    products: P,
    cart: CartService<P, C>,
}

impl<P, C> AppState<P, C>
where
    P: ProductRepository + Clone,
    C: CartRepository,
{
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `products` - Product lookups, shared by the product API and the cart service
    /// * `carts` - Cart persistence
    #[must_use]
    pub fn new(products: P, carts: C) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                cart: CartService::new(products.clone(), carts),
                products,
            }),
        }
    }

    /// Get a reference to the product repository.
    #[must_use]
    pub fn products(&self) -> &P {
        &self.inner.products
    }

    /// Get a reference to the cart service.
    #[must_use]
    pub fn cart(&self) -> &CartService<P, C> {
        &self.inner.cart
    }
}

impl<P, C> Clone for AppState<P, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
