//! Cart route handlers.
//!
//! JSON API over [`crate::services::CartService`]. Every handler requires an
//! authenticated user; the cart is always the caller's own.

use axum::{Json, extract::State};
use serde::Serialize;
use sugarloaf_core::{
    AddToCartRequest, CartResponse, RemoveFromCartRequest, UpdateCartItemRequest,
};
use tracing::instrument;

use crate::db::{CartRepository, ProductRepository};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Item count for the cart badge.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCountResponse {
    pub item_count: i64,
}

/// Show the current user's cart.
#[instrument(skip_all)]
pub async fn show<P, C>(
    State(state): State<AppState<P, C>>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartResponse>>
where
    P: ProductRepository + Clone,
    C: CartRepository,
{
    let cart = state.cart().get_cart(&user.id).await?;
    Ok(Json(CartResponse::read(cart)))
}

/// Get cart item count (for header badge).
#[instrument(skip_all)]
pub async fn count<P, C>(
    State(state): State<AppState<P, C>>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartCountResponse>>
where
    P: ProductRepository + Clone,
    C: CartRepository,
{
    let item_count = state.cart().item_count(&user.id).await?;
    Ok(Json(CartCountResponse { item_count }))
}

/// Add item to cart.
#[instrument(skip_all)]
pub async fn add<P, C>(
    State(state): State<AppState<P, C>>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartResponse>>
where
    P: ProductRepository + Clone,
    C: CartRepository,
{
    let cart = state.cart().add_to_cart(&user.id, &request).await?;
    Ok(Json(CartResponse::with_message("Item added to cart", cart)))
}

/// Update cart line quantity.
#[instrument(skip_all)]
pub async fn update<P, C>(
    State(state): State<AppState<P, C>>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<UpdateCartItemRequest>,
) -> Result<Json<CartResponse>>
where
    P: ProductRepository + Clone,
    C: CartRepository,
{
    let cart = state.cart().update_cart_item(&user.id, &request).await?;
    Ok(Json(CartResponse::with_message("Cart updated", cart)))
}

/// Remove item from cart.
#[instrument(skip_all)]
pub async fn remove<P, C>(
    State(state): State<AppState<P, C>>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<Json<CartResponse>>
where
    P: ProductRepository + Clone,
    C: CartRepository,
{
    let cart = state.cart().remove_from_cart(&user.id, &request).await?;
    Ok(Json(CartResponse::with_message("Item removed from cart", cart)))
}

/// Empty the cart.
#[instrument(skip_all)]
pub async fn clear<P, C>(
    State(state): State<AppState<P, C>>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartResponse>>
where
    P: ProductRepository + Clone,
    C: CartRepository,
{
    let cart = state.cart().clear_cart(&user.id).await?;
    Ok(Json(CartResponse::with_message("Cart cleared", cart)))
}
