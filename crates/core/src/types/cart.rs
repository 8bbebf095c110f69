//! Cart aggregate, its populated read model, and the JSON wire types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ProductId, UserId};
use super::price::Price;
use super::product::Product;

// =============================================================================
// Aggregate
// =============================================================================

/// A persisted cart line.
///
/// `name`, `price`, and `image` are snapshots taken when the product was
/// first added. `product_id` is a weak reference and may outlive the product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub image: String,
    /// Always positive for a stored line.
    pub quantity: i32,
}

/// A user's cart. There is at most one per user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    pub user_id: UserId,
    /// Unique by `product_id`.
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Find the line for a product.
    #[must_use]
    pub fn item(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    /// Whether the cart has a line for a product.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.item(product_id).is_some()
    }
}

/// A cart line joined with the product it references.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulatedCartItem {
    pub item: CartItem,
    /// `None` when the product has been deleted from the catalog.
    pub product: Option<Product>,
}

/// A cart whose lines have been joined with current product data.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulatedCart {
    pub user_id: UserId,
    pub items: Vec<PopulatedCartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PopulatedCart {
    /// Drop the product join, keeping only the stored lines.
    #[must_use]
    pub fn into_cart(self) -> Cart {
        Cart {
            user_id: self.user_id,
            items: self.items.into_iter().map(|line| line.item).collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

// =============================================================================
// Wire Types
// =============================================================================

/// A cart line as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub image: String,
    pub quantity: i32,
}

impl CartLine {
    /// `price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Cart contents with derived totals.
///
/// Totals are always computed from `items`; there is no way to build a view
/// with a stale total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    items: Vec<CartLine>,
    total_amount: Price,
    item_count: i64,
}

impl CartView {
    /// An empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_amount: Price::ZERO,
            item_count: 0,
        }
    }

    /// Build a view and compute its totals.
    #[must_use]
    pub fn from_lines(items: Vec<CartLine>) -> Self {
        let total_amount = items.iter().map(CartLine::line_total).sum();
        let item_count = items.iter().map(|line| i64::from(line.quantity)).sum();
        Self {
            items,
            total_amount,
            item_count,
        }
    }

    #[must_use]
    pub fn items(&self) -> &[CartLine] {
        &self.items
    }

    #[must_use]
    pub const fn total_amount(&self) -> Price {
        self.total_amount
    }

    #[must_use]
    pub const fn item_count(&self) -> i64 {
        self.item_count
    }
}

impl Default for CartView {
    fn default() -> Self {
        Self::empty()
    }
}

/// Response envelope for cart endpoints. Reads omit `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub cart: CartView,
}

impl CartResponse {
    #[must_use]
    pub const fn read(cart: CartView) -> Self {
        Self {
            message: None,
            cart,
        }
    }

    #[must_use]
    pub fn with_message(message: impl Into<String>, cart: CartView) -> Self {
        Self {
            message: Some(message.into()),
            cart,
        }
    }
}

/// Body of an add-to-cart request.
///
/// Fields are optional on the wire so that missing values surface as
/// validation errors with specific messages rather than as parse failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    #[serde(default)]
    pub product_id: Option<String>,
    /// Defaults to 1 when absent.
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// Body of an update-quantity request. A quantity of zero removes the line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartItemRequest {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// Body of a remove-line request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartRequest {
    #[serde(default)]
    pub product_id: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn line(id: &str, cents: i64, quantity: i32) -> CartLine {
        CartLine {
            product_id: ProductId::from(id),
            name: format!("Product {id}"),
            price: Price::from_cents(cents),
            image: String::new(),
            quantity,
        }
    }

    #[test]
    fn test_totals_are_derived() {
        let view = CartView::from_lines(vec![line("p1", 1000, 2), line("p2", 250, 4)]);
        assert_eq!(view.total_amount(), Price::from_cents(3000));
        assert_eq!(view.item_count(), 6);
    }

    #[test]
    fn test_zero_priced_line_counts_items_but_not_total() {
        let view = CartView::from_lines(vec![line("p1", 1000, 1), line("p2", 0, 3)]);
        assert_eq!(view.total_amount(), Price::from_cents(1000));
        assert_eq!(view.item_count(), 4);
    }

    #[test]
    fn test_empty_wire_shape() {
        let json = serde_json::to_value(CartResponse::read(CartView::empty())).unwrap();
        assert_eq!(
            json,
            json!({ "cart": { "items": [], "totalAmount": 0.0, "itemCount": 0 } })
        );
    }

    #[test]
    fn test_line_wire_shape() {
        let response = CartResponse::with_message(
            "Item added to cart",
            CartView::from_lines(vec![line("p1", 1000, 2)]),
        );
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["message"], "Item added to cart");
        assert_eq!(json["cart"]["items"][0]["productId"], "p1");
        assert_eq!(json["cart"]["items"][0]["price"], 10.0);
        assert_eq!(json["cart"]["totalAmount"], 20.0);
    }

    #[test]
    fn test_request_fields_are_optional() {
        let req: UpdateCartItemRequest = serde_json::from_value(json!({ "quantity": 0 })).unwrap();
        assert_eq!(req.product_id, None);
        assert_eq!(req.quantity, Some(0));

        let req: AddToCartRequest = serde_json::from_value(json!({ "productId": "p1" })).unwrap();
        assert_eq!(req.product_id.as_deref(), Some("p1"));
        assert_eq!(req.quantity, None);
    }
}
