//! Product route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use sugarloaf_core::{Product, ProductId};

use crate::db::{CartRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Product detail with normalized images.
pub async fn show<P, C>(
    State(state): State<AppState<P, C>>,
    Path(id): Path<String>,
) -> Result<Json<Product>>
where
    P: ProductRepository + Clone,
    C: CartRepository,
{
    let not_found = || AppError::NotFound("Product not found".to_string());

    let id = ProductId::parse(&id).map_err(|_| not_found())?;
    let product = state.products().find_by_id(&id).await?.ok_or_else(not_found)?;

    Ok(Json(product))
}
