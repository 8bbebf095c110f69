//! Product lookups for cart operations.
//!
//! The catalog owns products; this module only reads them. Images are
//! normalized here so nothing downstream ever sees a legacy image shape.

use std::future::Future;

use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;
use sugarloaf_core::{ImageNormalizer, Price, Product, ProductId};
use tracing::instrument;

use super::RepositoryError;

/// Read access to catalog products.
pub trait ProductRepository: Send + Sync + 'static {
    /// Find a product by ID. Returns `None` if it does not exist.
    fn find_by_id(
        &self,
        id: &ProductId,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;
}

/// A product row as stored, before image normalization.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub images: Option<Json<Value>>,
}

impl ProductRow {
    /// Convert to a domain product, normalizing the stored images.
    pub(crate) fn into_product(
        self,
        normalizer: &ImageNormalizer,
    ) -> Result<Product, RepositoryError> {
        product_from_parts(
            self.id,
            self.name,
            self.price,
            self.stock,
            self.images.as_ref().map(|json| &json.0),
            normalizer,
        )
    }
}

/// Build a product from raw column values.
pub(crate) fn product_from_parts(
    id: String,
    name: String,
    price: Decimal,
    stock: i32,
    images: Option<&Value>,
    normalizer: &ImageNormalizer,
) -> Result<Product, RepositoryError> {
    let price = Price::new(price).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid price for product {id}: {e}"))
    })?;
    if stock < 0 {
        return Err(RepositoryError::DataCorruption(format!(
            "negative stock for product {id}: {stock}"
        )));
    }

    Ok(Product {
        id: ProductId::from(id),
        name,
        price,
        stock,
        images: normalizer.normalize_images(images),
    })
}

/// `PostgreSQL`-backed product repository.
#[derive(Debug, Clone)]
pub struct PgProductRepository {
    pool: PgPool,
    normalizer: ImageNormalizer,
}

impl PgProductRepository {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: PgPool, normalizer: ImageNormalizer) -> Self {
        Self { pool, normalizer }
    }
}

impl ProductRepository for PgProductRepository {
    #[instrument(skip_all, fields(product_id = %id))]
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, price, stock, images
            FROM storefront.product
            WHERE id = $1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_product(&self.normalizer)).transpose()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_product_from_parts_normalizes_images() {
        let product = product_from_parts(
            "p1".to_string(),
            "Gummy Bears".to_string(),
            Decimal::new(499, 2),
            12,
            Some(&json!(["https://cdn.test/gummy.jpg"])),
            &ImageNormalizer::default(),
        )
        .unwrap();

        assert_eq!(product.price, Price::from_cents(499));
        assert_eq!(product.images.len(), 1);
        assert_eq!(product.display_image_url(), "https://cdn.test/gummy.jpg");
    }

    #[test]
    fn test_product_from_parts_without_images_gets_placeholder() {
        let normalizer = ImageNormalizer::new("https://cdn.test/none.png");
        let product = product_from_parts(
            "p2".to_string(),
            "Mystery Bag".to_string(),
            Decimal::ZERO,
            0,
            None,
            &normalizer,
        )
        .unwrap();

        assert_eq!(product.images, vec![normalizer.placeholder()]);
    }

    #[test]
    fn test_product_from_parts_rejects_corrupt_rows() {
        let normalizer = ImageNormalizer::default();
        let negative_price = product_from_parts(
            "p3".to_string(),
            "Bad".to_string(),
            Decimal::new(-100, 2),
            1,
            None,
            &normalizer,
        );
        assert!(matches!(
            negative_price,
            Err(RepositoryError::DataCorruption(_))
        ));

        let negative_stock = product_from_parts(
            "p3".to_string(),
            "Bad".to_string(),
            Decimal::ONE,
            -1,
            None,
            &normalizer,
        );
        assert!(matches!(
            negative_stock,
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
