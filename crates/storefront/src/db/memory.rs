//! In-process product and cart store.
//!
//! Implements both [`ProductRepository`] and [`CartRepository`] over a single
//! `RwLock`, so each operation is atomic in the same sense as the SQL
//! statements in [`super::carts`]. Products are stored with their raw
//! `images` JSON and normalized on read, exactly like the `PostgreSQL` path.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::Value;
use sugarloaf_core::{
    Cart, CartItem, ImageNormalizer, PopulatedCart, PopulatedCartItem, Product, ProductId, UserId,
};
use tokio::sync::RwLock;

use super::RepositoryError;
use super::carts::{CartRepository, NewCartLine};
use super::products::{ProductRepository, product_from_parts};

#[derive(Debug, Clone)]
struct StoredProduct {
    name: String,
    price: Decimal,
    stock: i32,
    images: Value,
}

#[derive(Debug, Default)]
struct Inner {
    products: HashMap<ProductId, StoredProduct>,
    carts: HashMap<UserId, Cart>,
    saves: usize,
}

/// Shared in-memory store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
    normalizer: ImageNormalizer,
}

impl MemoryStore {
    /// Create an empty store using the given image normalizer.
    #[must_use]
    pub fn new(normalizer: ImageNormalizer) -> Self {
        Self {
            inner: Arc::default(),
            normalizer,
        }
    }

    /// Insert or replace a catalog product. `images` may be in any stored shape.
    pub async fn put_product(
        &self,
        id: &str,
        name: &str,
        price: Decimal,
        stock: i32,
        images: Value,
    ) {
        self.inner.write().await.products.insert(
            ProductId::from(id),
            StoredProduct {
                name: name.to_owned(),
                price,
                stock,
                images,
            },
        );
    }

    /// Change a product's stock level.
    pub async fn set_stock(&self, id: &str, stock: i32) {
        if let Some(product) = self.inner.write().await.products.get_mut(&ProductId::from(id)) {
            product.stock = stock;
        }
    }

    /// Delete a product from the catalog, leaving any cart lines dangling.
    pub async fn delete_product(&self, id: &str) {
        self.inner.write().await.products.remove(&ProductId::from(id));
    }

    /// The stored cart for a user, if one was ever created.
    pub async fn stored_cart(&self, user_id: &str) -> Option<Cart> {
        self.inner.read().await.carts.get(&UserId::from(user_id)).cloned()
    }

    /// Number of times [`CartRepository::save`] has been called.
    pub async fn save_count(&self) -> usize {
        self.inner.read().await.saves
    }

    fn product(&self, inner: &Inner, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        inner
            .products
            .get(id)
            .map(|stored| {
                product_from_parts(
                    id.as_str().to_owned(),
                    stored.name.clone(),
                    stored.price,
                    stored.stock,
                    Some(&stored.images),
                    &self.normalizer,
                )
            })
            .transpose()
    }
}

impl ProductRepository for MemoryStore {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let inner = self.inner.read().await;
        self.product(&inner, id)
    }
}

impl CartRepository for MemoryStore {
    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.inner.read().await.carts.get(user_id).cloned())
    }

    async fn find_by_user_id_with_populate(
        &self,
        user_id: &UserId,
    ) -> Result<Option<PopulatedCart>, RepositoryError> {
        let inner = self.inner.read().await;
        let Some(cart) = inner.carts.get(user_id) else {
            return Ok(None);
        };

        let items = cart
            .items
            .iter()
            .map(|item| -> Result<PopulatedCartItem, RepositoryError> {
                Ok(PopulatedCartItem {
                    item: item.clone(),
                    product: self.product(&inner, &item.product_id)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(PopulatedCart {
            user_id: cart.user_id.clone(),
            items,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        }))
    }

    async fn atomic_add_to_cart(
        &self,
        user_id: &UserId,
        line: NewCartLine,
    ) -> Result<Cart, RepositoryError> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let cart = inner.carts.entry(user_id.clone()).or_insert_with(|| Cart {
            user_id: user_id.clone(),
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        });

        match cart
            .items
            .iter_mut()
            .find(|item| item.product_id == line.product_id)
        {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(line.quantity)
                    .ok_or(RepositoryError::QuantityOverflow)?;
            }
            None => cart.items.push(CartItem {
                product_id: line.product_id,
                name: line.name,
                price: line.price,
                image: line.image,
                quantity: line.quantity,
            }),
        }
        cart.updated_at = now;

        Ok(cart.clone())
    }

    async fn atomic_update_cart_item(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: i32,
    ) -> Result<Option<Cart>, RepositoryError> {
        let mut inner = self.inner.write().await;
        let Some(cart) = inner.carts.get_mut(user_id) else {
            return Ok(None);
        };

        if quantity <= 0 {
            cart.items.retain(|item| &item.product_id != product_id);
        } else if let Some(item) = cart
            .items
            .iter_mut()
            .find(|item| &item.product_id == product_id)
        {
            item.quantity = quantity;
        }
        cart.updated_at = Utc::now();

        Ok(Some(cart.clone()))
    }

    async fn atomic_remove_from_cart(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
    ) -> Result<Option<Cart>, RepositoryError> {
        self.atomic_update_cart_item(user_id, product_id, 0).await
    }

    async fn atomic_clear_cart(&self, user_id: &UserId) -> Result<Option<Cart>, RepositoryError> {
        let mut inner = self.inner.write().await;
        let Some(cart) = inner.carts.get_mut(user_id) else {
            return Ok(None);
        };
        cart.items.clear();
        cart.updated_at = Utc::now();
        Ok(Some(cart.clone()))
    }

    async fn save(&self, user_id: &UserId, pruned: &[ProductId]) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        inner.saves += 1;
        if let Some(stored) = inner.carts.get_mut(user_id) {
            stored.items.retain(|item| !pruned.contains(&item.product_id));
            stored.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use sugarloaf_core::Price;

    use super::*;

    fn line(product_id: &str, quantity: i32) -> NewCartLine {
        NewCartLine {
            product_id: ProductId::from(product_id),
            name: "Licorice".to_string(),
            price: Price::from_cents(300),
            image: String::new(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_concurrent_adds_do_not_lose_increments() {
        let store = MemoryStore::default();
        let user = UserId::from("u1");

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let store = store.clone();
                let user = user.clone();
                tokio::spawn(async move { store.atomic_add_to_cart(&user, line("p1", 1)).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let cart = store.stored_cart("u1").await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 20);
    }

    #[tokio::test]
    async fn test_mutations_without_cart_return_none() {
        let store = MemoryStore::default();
        let user = UserId::from("nobody");
        let p1 = ProductId::from("p1");

        assert!(store.atomic_update_cart_item(&user, &p1, 3).await.unwrap().is_none());
        assert!(store.atomic_remove_from_cart(&user, &p1).await.unwrap().is_none());
        assert!(store.atomic_clear_cart(&user).await.unwrap().is_none());
        assert!(store.stored_cart("nobody").await.is_none());
    }

    #[tokio::test]
    async fn test_populate_marks_deleted_products() {
        let store = MemoryStore::default();
        store
            .put_product("p1", "Licorice", Decimal::new(300, 2), 4, json!(["l.jpg"]))
            .await;
        let user = UserId::from("u1");
        store.atomic_add_to_cart(&user, line("p1", 1)).await.unwrap();
        store.atomic_add_to_cart(&user, line("p2", 1)).await.unwrap();

        let cart = store.find_by_user_id_with_populate(&user).await.unwrap().unwrap();
        assert!(cart.items[0].product.is_some());
        assert!(cart.items[1].product.is_none());
    }

    #[tokio::test]
    async fn test_add_overflow_leaves_line_unchanged() {
        let store = MemoryStore::default();
        let user = UserId::from("u1");
        store.atomic_add_to_cart(&user, line("p1", i32::MAX)).await.unwrap();

        let result = store.atomic_add_to_cart(&user, line("p1", 1)).await;

        assert!(matches!(result, Err(RepositoryError::QuantityOverflow)));
        assert_eq!(store.stored_cart("u1").await.unwrap().items[0].quantity, i32::MAX);
    }

    #[tokio::test]
    async fn test_save_after_clear_does_not_restore_lines() {
        let store = MemoryStore::default();
        let user = UserId::from("u1");
        store.atomic_add_to_cart(&user, line("p1", 1)).await.unwrap();
        store.atomic_add_to_cart(&user, line("p2", 1)).await.unwrap();

        // Pruning decided from a read taken before the clear.
        let stale = store.find_by_user_id(&user).await.unwrap().unwrap();
        assert_eq!(stale.items.len(), 2);
        store.atomic_clear_cart(&user).await.unwrap();
        store.save(&user, &[ProductId::from("p2")]).await.unwrap();

        assert!(store.stored_cart("u1").await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_save_keeps_concurrent_increments() {
        let store = MemoryStore::default();
        let user = UserId::from("u1");
        store.atomic_add_to_cart(&user, line("p1", 1)).await.unwrap();
        store.atomic_add_to_cart(&user, line("gone", 1)).await.unwrap();

        store.atomic_add_to_cart(&user, line("p1", 2)).await.unwrap();
        store.atomic_add_to_cart(&user, line("p3", 1)).await.unwrap();
        store.save(&user, &[ProductId::from("gone")]).await.unwrap();

        let cart = store.stored_cart("u1").await.unwrap();
        assert_eq!(cart.item(&ProductId::from("p1")).unwrap().quantity, 3);
        assert!(cart.contains(&ProductId::from("p3")));
        assert!(!cart.contains(&ProductId::from("gone")));
    }

    #[tokio::test]
    async fn test_save_without_cart_is_a_no_op() {
        let store = MemoryStore::default();
        store.save(&UserId::from("nobody"), &[ProductId::from("p1")]).await.unwrap();
        assert!(store.stored_cart("nobody").await.is_none());
    }
}
