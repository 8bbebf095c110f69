//! Catalog product as seen by the cart.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::image::ImageRecord;
use super::price::Price;

/// A catalog product.
///
/// Owned by the catalog; the cart only reads it to check existence, price,
/// and stock. `images` is always normalized by the time a `Product` exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    /// Units on hand. Never negative.
    pub stock: i32,
    pub images: Vec<ImageRecord>,
}

impl Product {
    /// Whether at least one unit is on hand.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Whether current stock covers a request for `quantity` units.
    #[must_use]
    pub const fn has_stock_for(&self, quantity: i32) -> bool {
        self.stock >= quantity
    }

    /// The first image, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&ImageRecord> {
        self.images.first()
    }

    /// Display URL of the first image, or an empty string.
    #[must_use]
    pub fn display_image_url(&self) -> &str {
        self.primary_image().map_or("", ImageRecord::display_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::image::ImageNormalizer;

    fn product(stock: i32) -> Product {
        Product {
            id: ProductId::from("p1"),
            name: "Sea Salt Caramels".to_string(),
            price: Price::from_cents(1000),
            stock,
            images: ImageNormalizer::default()
                .normalize_images(Some(&serde_json::json!([{ "full": "f.jpg", "thumb": "t.jpg" }]))),
        }
    }

    #[test]
    fn test_stock_checks() {
        assert!(product(5).has_stock_for(5));
        assert!(!product(3).has_stock_for(5));
        assert!(product(1).in_stock());
        assert!(!product(0).in_stock());
    }

    #[test]
    fn test_display_image_url() {
        assert_eq!(product(1).display_image_url(), "t.jpg");

        let mut bare = product(1);
        bare.images.clear();
        assert_eq!(bare.display_image_url(), "");
    }
}
