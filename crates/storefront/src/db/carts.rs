//! Cart persistence.
//!
//! Every mutation is a single SQL statement so that concurrent requests for
//! the same user never lose an update: adding an item is an upsert that
//! increments the stored quantity in place rather than a read followed by a
//! write. [`CartRepository::save`], used for pruning lines whose product no
//! longer exists, only deletes the named lines, so a pruning decision made
//! from a stale read can never restore or rewrite a line.

use std::future::Future;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;
use sugarloaf_core::{
    Cart, CartItem, ImageNormalizer, PopulatedCart, PopulatedCartItem, Price, ProductId, UserId,
};
use tracing::{debug, instrument};

use super::RepositoryError;
use super::products::product_from_parts;

/// Snapshot of a product taken when it is added to a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartLine {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub image: String,
    pub quantity: i32,
}

/// Persistence boundary for the cart aggregate.
pub trait CartRepository: Send + Sync + 'static {
    /// Load a user's cart.
    fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Option<Cart>, RepositoryError>> + Send;

    /// Load a user's cart with every line joined to its current product.
    fn find_by_user_id_with_populate(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Option<PopulatedCart>, RepositoryError>> + Send;

    /// Add a line, creating the cart if needed. If the product is already in
    /// the cart its quantity is incremented by `line.quantity`.
    ///
    /// Fails with [`RepositoryError::QuantityOverflow`], leaving the line
    /// untouched, if the incremented quantity would not fit in an `i32`.
    fn atomic_add_to_cart(
        &self,
        user_id: &UserId,
        line: NewCartLine,
    ) -> impl Future<Output = Result<Cart, RepositoryError>> + Send;

    /// Set a line's quantity. A quantity `<= 0` deletes the line.
    /// Returns `None` if the user has no cart.
    fn atomic_update_cart_item(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: i32,
    ) -> impl Future<Output = Result<Option<Cart>, RepositoryError>> + Send;

    /// Remove a line. Returns `None` if the user has no cart.
    fn atomic_remove_from_cart(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<Option<Cart>, RepositoryError>> + Send;

    /// Remove every line. Returns `None` if the user has no cart.
    fn atomic_clear_cart(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Option<Cart>, RepositoryError>> + Send;

    /// Persist a pruning of the user's cart by deleting the `pruned` lines.
    ///
    /// Never inserts a line or rewrites a quantity. Lines already gone, or a
    /// missing cart, are not an error.
    fn save(
        &self,
        user_id: &UserId,
        pruned: &[ProductId],
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

// =============================================================================
// Row Types
// =============================================================================

/// One row of the cart ⟕ `cart_item` ⟕ product join.
///
/// Line columns are NULL for an empty cart; product columns are NULL when
/// the line's product has been deleted (or when the query doesn't populate).
#[derive(Debug, sqlx::FromRow)]
struct CartJoinRow {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    product_id: Option<String>,
    item_name: Option<String>,
    item_price: Option<Decimal>,
    item_image: Option<String>,
    quantity: Option<i32>,
    p_id: Option<String>,
    p_name: Option<String>,
    p_price: Option<Decimal>,
    p_stock: Option<i32>,
    p_images: Option<Json<Value>>,
}

const SELECT_CART: &str = r"
    SELECT c.created_at, c.updated_at,
           ci.product_id, ci.name AS item_name, ci.price AS item_price,
           ci.image AS item_image, ci.quantity,
           NULL::text AS p_id, NULL::text AS p_name, NULL::numeric AS p_price,
           NULL::int4 AS p_stock, NULL::jsonb AS p_images
    FROM storefront.cart c
    LEFT JOIN storefront.cart_item ci ON ci.cart_id = c.id
    WHERE c.user_id = $1
    ORDER BY ci.added_at, ci.product_id
";

const SELECT_POPULATED_CART: &str = r"
    SELECT c.created_at, c.updated_at,
           ci.product_id, ci.name AS item_name, ci.price AS item_price,
           ci.image AS item_image, ci.quantity,
           p.id AS p_id, p.name AS p_name, p.price AS p_price,
           p.stock AS p_stock, p.images AS p_images
    FROM storefront.cart c
    LEFT JOIN storefront.cart_item ci ON ci.cart_id = c.id
    LEFT JOIN storefront.product p ON p.id = ci.product_id
    WHERE c.user_id = $1
    ORDER BY ci.added_at, ci.product_id
";

fn line_from_row(row: &mut CartJoinRow) -> Result<Option<CartItem>, RepositoryError> {
    let Some(product_id) = row.product_id.take() else {
        return Ok(None);
    };

    let price = Price::new(row.item_price.unwrap_or_default()).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid cart line price for {product_id}: {e}"))
    })?;

    Ok(Some(CartItem {
        product_id: ProductId::from(product_id),
        name: row.item_name.take().unwrap_or_default(),
        price,
        image: row.item_image.take().unwrap_or_default(),
        quantity: row.quantity.unwrap_or_default(),
    }))
}

fn populated_from_rows(
    user_id: &UserId,
    rows: Vec<CartJoinRow>,
    normalizer: &ImageNormalizer,
) -> Result<Option<PopulatedCart>, RepositoryError> {
    let Some(first) = rows.first() else {
        return Ok(None);
    };

    let mut cart = PopulatedCart {
        user_id: user_id.clone(),
        items: Vec::with_capacity(rows.len()),
        created_at: first.created_at,
        updated_at: first.updated_at,
    };

    for mut row in rows {
        let Some(item) = line_from_row(&mut row)? else {
            continue;
        };

        let product = match (row.p_id, row.p_name, row.p_price, row.p_stock) {
            (Some(id), Some(name), Some(price), Some(stock)) => Some(product_from_parts(
                id,
                name,
                price,
                stock,
                row.p_images.as_ref().map(|json| &json.0),
                normalizer,
            )?),
            _ => None,
        };

        cart.items.push(PopulatedCartItem { item, product });
    }

    Ok(Some(cart))
}

// =============================================================================
// PostgreSQL Implementation
// =============================================================================

/// `PostgreSQL`-backed cart repository.
#[derive(Debug, Clone)]
pub struct PgCartRepository {
    pool: PgPool,
    normalizer: ImageNormalizer,
}

impl PgCartRepository {
    /// Create a new cart repository.
    ///
    /// The normalizer is applied to product images when populating carts.
    #[must_use]
    pub const fn new(pool: PgPool, normalizer: ImageNormalizer) -> Self {
        Self { pool, normalizer }
    }

    async fn fetch_rows(&self, sql: &str, user_id: &UserId) -> Result<Vec<CartJoinRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartJoinRow>(sql)
            .bind(user_id.as_str())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

impl CartRepository for PgCartRepository {
    #[instrument(skip_all, fields(user_id = %user_id))]
    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<Cart>, RepositoryError> {
        let rows = self.fetch_rows(SELECT_CART, user_id).await?;
        Ok(populated_from_rows(user_id, rows, &self.normalizer)?.map(PopulatedCart::into_cart))
    }

    #[instrument(skip_all, fields(user_id = %user_id))]
    async fn find_by_user_id_with_populate(
        &self,
        user_id: &UserId,
    ) -> Result<Option<PopulatedCart>, RepositoryError> {
        let rows = self.fetch_rows(SELECT_POPULATED_CART, user_id).await?;
        populated_from_rows(user_id, rows, &self.normalizer)
    }

    #[instrument(skip_all, fields(user_id = %user_id, product_id = %line.product_id, quantity = line.quantity))]
    async fn atomic_add_to_cart(
        &self,
        user_id: &UserId,
        line: NewCartLine,
    ) -> Result<Cart, RepositoryError> {
        let result = sqlx::query(
            r"
            WITH upserted_cart AS (
                INSERT INTO storefront.cart (user_id)
                VALUES ($1)
                ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()
                RETURNING id
            )
            INSERT INTO storefront.cart_item (cart_id, product_id, name, price, image, quantity)
            SELECT id, $2, $3, $4, $5, $6 FROM upserted_cart
            ON CONFLICT (cart_id, product_id)
            DO UPDATE SET quantity = storefront.cart_item.quantity + EXCLUDED.quantity
            WHERE storefront.cart_item.quantity <= 2147483647 - EXCLUDED.quantity
            ",
        )
        .bind(user_id.as_str())
        .bind(line.product_id.as_str())
        .bind(&line.name)
        .bind(line.price.amount())
        .bind(&line.image)
        .bind(line.quantity)
        .execute(&self.pool)
        .await?;

        // The guarded upsert touches no row when the sum would overflow.
        if result.rows_affected() == 0 {
            return Err(RepositoryError::QuantityOverflow);
        }

        debug!("Upserted cart line");

        self.find_by_user_id(user_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    #[instrument(skip_all, fields(user_id = %user_id, product_id = %product_id, quantity = quantity))]
    async fn atomic_update_cart_item(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: i32,
    ) -> Result<Option<Cart>, RepositoryError> {
        if quantity <= 0 {
            return self.atomic_remove_from_cart(user_id, product_id).await;
        }

        sqlx::query(
            r"
            WITH touched AS (
                UPDATE storefront.cart SET updated_at = NOW()
                WHERE user_id = $1
                RETURNING id
            )
            UPDATE storefront.cart_item SET quantity = $3
            WHERE cart_id IN (SELECT id FROM touched) AND product_id = $2
            ",
        )
        .bind(user_id.as_str())
        .bind(product_id.as_str())
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        self.find_by_user_id(user_id).await
    }

    #[instrument(skip_all, fields(user_id = %user_id, product_id = %product_id))]
    async fn atomic_remove_from_cart(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
    ) -> Result<Option<Cart>, RepositoryError> {
        sqlx::query(
            r"
            WITH touched AS (
                UPDATE storefront.cart SET updated_at = NOW()
                WHERE user_id = $1
                RETURNING id
            )
            DELETE FROM storefront.cart_item
            WHERE cart_id IN (SELECT id FROM touched) AND product_id = $2
            ",
        )
        .bind(user_id.as_str())
        .bind(product_id.as_str())
        .execute(&self.pool)
        .await?;

        self.find_by_user_id(user_id).await
    }

    #[instrument(skip_all, fields(user_id = %user_id))]
    async fn atomic_clear_cart(&self, user_id: &UserId) -> Result<Option<Cart>, RepositoryError> {
        let result = sqlx::query(
            r"
            WITH touched AS (
                UPDATE storefront.cart SET updated_at = NOW()
                WHERE user_id = $1
                RETURNING id
            )
            DELETE FROM storefront.cart_item
            WHERE cart_id IN (SELECT id FROM touched)
            ",
        )
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await?;

        debug!(removed = result.rows_affected(), "Cleared cart");

        self.find_by_user_id(user_id).await
    }

    #[instrument(skip_all, fields(user_id = %user_id, pruned = pruned.len()))]
    async fn save(&self, user_id: &UserId, pruned: &[ProductId]) -> Result<(), RepositoryError> {
        if pruned.is_empty() {
            return Ok(());
        }

        let ids: Vec<String> = pruned.iter().map(|id| id.as_str().to_owned()).collect();
        let result = sqlx::query(
            r"
            WITH touched AS (
                UPDATE storefront.cart SET updated_at = NOW()
                WHERE user_id = $1
                RETURNING id
            )
            DELETE FROM storefront.cart_item
            WHERE cart_id IN (SELECT id FROM touched) AND product_id = ANY($2)
            ",
        )
        .bind(user_id.as_str())
        .bind(&ids)
        .execute(&self.pool)
        .await?;

        debug!(removed = result.rows_affected(), "Pruned cart lines");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(product_id: Option<&str>, with_product: bool) -> CartJoinRow {
        let now = Utc::now();
        CartJoinRow {
            created_at: now,
            updated_at: now,
            product_id: product_id.map(str::to_owned),
            item_name: product_id.map(|_| "Snapshot Name".to_owned()),
            item_price: product_id.map(|_| Decimal::new(1000, 2)),
            item_image: product_id.map(|_| "snap.jpg".to_owned()),
            quantity: product_id.map(|_| 2),
            p_id: with_product.then(|| product_id.unwrap_or_default().to_owned()),
            p_name: with_product.then(|| "Live Name".to_owned()),
            p_price: with_product.then(|| Decimal::new(1200, 2)),
            p_stock: with_product.then_some(7),
            p_images: with_product.then(|| Json(json!(["live.jpg"]))),
        }
    }

    #[test]
    fn test_no_rows_means_no_cart() {
        let cart = populated_from_rows(&UserId::from("u1"), Vec::new(), &ImageNormalizer::default())
            .unwrap();
        assert!(cart.is_none());
    }

    #[test]
    fn test_empty_cart_row_has_no_items() {
        let cart = populated_from_rows(
            &UserId::from("u1"),
            vec![row(None, false)],
            &ImageNormalizer::default(),
        )
        .unwrap()
        .unwrap();
        assert!(cart.items.is_empty());
    }

    #[test]
    fn test_rows_join_products_and_keep_dangling_lines() {
        let cart = populated_from_rows(
            &UserId::from("u1"),
            vec![row(Some("p1"), true), row(Some("gone"), false)],
            &ImageNormalizer::default(),
        )
        .unwrap()
        .unwrap();

        assert_eq!(cart.items.len(), 2);

        let live = &cart.items[0];
        assert_eq!(live.item.name, "Snapshot Name");
        let product = live.product.as_ref().unwrap();
        assert_eq!(product.name, "Live Name");
        assert_eq!(product.stock, 7);
        assert_eq!(product.display_image_url(), "live.jpg");

        assert_eq!(cart.items[1].item.product_id, ProductId::from("gone"));
        assert!(cart.items[1].product.is_none());
    }
}
