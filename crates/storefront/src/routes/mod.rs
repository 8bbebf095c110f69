//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! # Cart (JSON, requires auth)
//! GET  /api/cart               - Current cart
//! GET  /api/cart/count         - Cart count badge
//! POST /api/cart/add           - Add to cart
//! PUT  /api/cart/update        - Set line quantity (0 removes)
//! POST /api/cart/remove        - Remove line
//! POST /api/cart/clear         - Remove all lines
//!
//! # Products (JSON)
//! GET  /api/products/{id}      - Product with normalized images
//! ```
//!
//! `/health` and `/health/ready` are mounted by the binary.

pub mod cart;
pub mod products;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::db::{CartRepository, ProductRepository};
use crate::middleware::load_current_user;
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes<P, C>() -> Router<AppState<P, C>>
where
    P: ProductRepository + Clone,
    C: CartRepository,
{
    Router::new()
        .route("/", get(cart::show::<P, C>))
        .route("/count", get(cart::count::<P, C>))
        .route("/add", post(cart::add::<P, C>))
        .route("/update", put(cart::update::<P, C>))
        .route("/remove", post(cart::remove::<P, C>))
        .route("/clear", post(cart::clear::<P, C>))
}

/// Create the product routes router.
pub fn product_routes<P, C>() -> Router<AppState<P, C>>
where
    P: ProductRepository + Clone,
    C: CartRepository,
{
    Router::new().route("/{id}", get(products::show::<P, C>))
}

/// Create all routes for the storefront.
pub fn routes<P, C>() -> Router<AppState<P, C>>
where
    P: ProductRepository + Clone,
    C: CartRepository,
{
    Router::new()
        .nest("/api/cart", cart_routes())
        .nest("/api/products", product_routes())
}

/// Build the API with its state applied.
///
/// Sessions are not included; the caller layers a session manager on top (or,
/// in tests, a `CurrentUser` extension).
pub fn router<P, C>(state: AppState<P, C>) -> Router
where
    P: ProductRepository + Clone,
    C: CartRepository,
{
    routes()
        .layer(axum::middleware::from_fn(load_current_user))
        .with_state(state)
}
