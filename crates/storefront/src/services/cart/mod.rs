//! Cart service.
//!
//! Owns every business rule for carts: request validation, stock checks,
//! pruning of lines whose product was deleted, and shaping the
//! [`CartView`] returned to clients. Persistence goes through the
//! [`ProductRepository`] and [`CartRepository`] traits.

mod error;

pub use error::CartError;

use sugarloaf_core::{
    AddToCartRequest, CartLine, CartView, PopulatedCart, PopulatedCartItem, Price, Product,
    ProductId, RemoveFromCartRequest, UpdateCartItemRequest, UserId,
};
use tracing::{debug, instrument};

use crate::db::carts::NewCartLine;
use crate::db::{CartRepository, ProductRepository, RepositoryError};

/// Quantity used by add-to-cart when the request omits one.
const DEFAULT_ADD_QUANTITY: i64 = 1;

/// Cart service.
pub struct CartService<P, C> {
    products: P,
    carts: C,
}

impl<P, C> CartService<P, C>
where
    P: ProductRepository,
    C: CartRepository,
{
    /// Create a new cart service.
    #[must_use]
    pub const fn new(products: P, carts: C) -> Self {
        Self { products, carts }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get a user's cart.
    ///
    /// A user with no cart gets an empty view; nothing is persisted. Lines
    /// whose product has been deleted are dropped, and the pruned cart is
    /// saved back.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidUser` if the user ID is blank or a
    /// missing-value marker.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn get_cart(&self, user_id: &UserId) -> Result<CartView, CartError> {
        ensure_valid_user(user_id)?;

        match self.carts.find_by_user_id_with_populate(user_id).await? {
            Some(cart) => self.present(cart).await,
            None => Ok(CartView::empty()),
        }
    }

    /// Total units in a user's cart, for the header badge.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_cart`].
    pub async fn item_count(&self, user_id: &UserId) -> Result<i64, CartError> {
        Ok(self.get_cart(user_id).await?.item_count())
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a product to the cart, creating the cart on first use.
    ///
    /// Adding a product that is already in the cart increments its quantity.
    /// Stock is checked against the requested quantity only, not against the
    /// quantity already in the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductIdRequired` if no product ID was given.
    /// Returns `CartError::QuantityMustBePositive` if `quantity <= 0`.
    /// Returns `CartError::ProductNotFound` if the product does not exist.
    /// Returns `CartError::InsufficientStock` if stock is below `quantity`.
    /// Returns `CartError::QuantityTooLarge` if the line's total quantity
    /// would overflow.
    #[instrument(skip_all, fields(user_id = %user_id, product_id = ?request.product_id))]
    pub async fn add_to_cart(
        &self,
        user_id: &UserId,
        request: &AddToCartRequest,
    ) -> Result<CartView, CartError> {
        ensure_valid_user(user_id)?;
        let product_id = required_product_id(request.product_id.as_deref())?;
        let quantity = request.quantity.unwrap_or(DEFAULT_ADD_QUANTITY);
        if quantity <= 0 {
            return Err(CartError::QuantityMustBePositive);
        }
        let quantity = clamp_quantity(quantity);

        let product = self.available_product(&product_id, quantity).await?;
        self.carts
            .atomic_add_to_cart(
                user_id,
                NewCartLine {
                    image: product.display_image_url().to_owned(),
                    product_id,
                    name: product.name,
                    price: product.price,
                    quantity,
                },
            )
            .await
            .map_err(|e| match e {
                RepositoryError::QuantityOverflow => CartError::QuantityTooLarge,
                other => CartError::Repository(other),
            })?;

        self.reload(user_id).await
    }

    /// Set the quantity of a line already in the cart. Zero removes it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductIdRequired` or `CartError::QuantityRequired`
    /// if either field is absent.
    /// Returns `CartError::CartNotFound` if the user has no cart.
    /// Returns `CartError::ItemNotFoundInCart` if the product is not in the
    /// cart; the product itself is not looked up in that case.
    /// Returns `CartError::ProductNotFound` or `CartError::InsufficientStock`
    /// for a positive quantity the catalog cannot satisfy.
    #[instrument(skip_all, fields(user_id = %user_id, product_id = ?request.product_id))]
    pub async fn update_cart_item(
        &self,
        user_id: &UserId,
        request: &UpdateCartItemRequest,
    ) -> Result<CartView, CartError> {
        ensure_valid_user(user_id)?;
        let product_id = required_product_id(request.product_id.as_deref())?;
        let quantity = request.quantity.ok_or(CartError::QuantityRequired)?;

        self.existing_line(user_id, &product_id).await?;

        let quantity = clamp_quantity(quantity);
        if quantity > 0 {
            self.available_product(&product_id, quantity).await?;
        }

        self.carts
            .atomic_update_cart_item(user_id, &product_id, quantity)
            .await?
            .ok_or(CartError::CartNotFound)?;

        self.reload(user_id).await
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductIdRequired` if no product ID was given.
    /// Returns `CartError::CartNotFound` if the user has no cart.
    /// Returns `CartError::ItemNotFoundInCart` if the product is not in the cart.
    #[instrument(skip_all, fields(user_id = %user_id, product_id = ?request.product_id))]
    pub async fn remove_from_cart(
        &self,
        user_id: &UserId,
        request: &RemoveFromCartRequest,
    ) -> Result<CartView, CartError> {
        ensure_valid_user(user_id)?;
        let product_id = required_product_id(request.product_id.as_deref())?;

        self.existing_line(user_id, &product_id).await?;

        self.carts
            .atomic_remove_from_cart(user_id, &product_id)
            .await?
            .ok_or(CartError::CartNotFound)?;

        self.reload(user_id).await
    }

    /// Remove every line from the cart. The cart itself is kept.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` if the user has no cart.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn clear_cart(&self, user_id: &UserId) -> Result<CartView, CartError> {
        ensure_valid_user(user_id)?;

        self.carts
            .atomic_clear_cart(user_id)
            .await?
            .ok_or(CartError::CartNotFound)?;

        self.reload(user_id).await
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Look up a product and check it can supply `quantity` units.
    async fn available_product(
        &self,
        product_id: &ProductId,
        quantity: i32,
    ) -> Result<Product, CartError> {
        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or(CartError::ProductNotFound)?;

        if !product.has_stock_for(quantity) {
            return Err(CartError::InsufficientStock);
        }
        Ok(product)
    }

    /// Require that the user has a cart containing `product_id`.
    async fn existing_line(&self, user_id: &UserId, product_id: &ProductId) -> Result<(), CartError> {
        let cart = self
            .carts
            .find_by_user_id(user_id)
            .await?
            .ok_or(CartError::CartNotFound)?;

        if !cart.contains(product_id) {
            return Err(CartError::ItemNotFoundInCart);
        }
        Ok(())
    }

    /// Re-read the stored cart after a mutation.
    async fn reload(&self, user_id: &UserId) -> Result<CartView, CartError> {
        let cart = self
            .carts
            .find_by_user_id_with_populate(user_id)
            .await?
            .ok_or(CartError::CartNotFound)?;
        self.present(cart).await
    }

    /// Format a populated cart, pruning dangling lines from storage.
    async fn present(&self, cart: PopulatedCart) -> Result<CartView, CartError> {
        let (live, dangling): (Vec<_>, Vec<_>) = cart
            .items
            .into_iter()
            .partition(|line| !is_dangling_reference(line));

        if !dangling.is_empty() {
            debug!(
                user_id = %cart.user_id,
                pruned = dangling.len(),
                "pruning cart lines for deleted products"
            );
            let pruned: Vec<ProductId> = dangling
                .into_iter()
                .map(|line| line.item.product_id)
                .collect();
            self.carts.save(&cart.user_id, &pruned).await?;
        }

        Ok(CartView::from_lines(
            live.iter().filter_map(format_cart_item).collect(),
        ))
    }
}

/// Whether a cart line points at a product that no longer exists.
#[must_use]
pub const fn is_dangling_reference(line: &PopulatedCartItem) -> bool {
    line.product.is_none()
}

/// Format a cart line for clients from its current product.
///
/// Out-of-stock products are shown at a price of zero so they do not count
/// towards the total. Returns `None` for a dangling line.
#[must_use]
pub fn format_cart_item(line: &PopulatedCartItem) -> Option<CartLine> {
    let product = line.product.as_ref()?;

    Some(CartLine {
        product_id: line.item.product_id.clone(),
        name: product.name.clone(),
        price: if product.in_stock() {
            product.price
        } else {
            Price::ZERO
        },
        image: product.display_image_url().to_owned(),
        quantity: line.item.quantity,
    })
}

fn ensure_valid_user(user_id: &UserId) -> Result<(), CartError> {
    if user_id.is_valid() {
        Ok(())
    } else {
        Err(CartError::InvalidUser)
    }
}

fn required_product_id(raw: Option<&str>) -> Result<ProductId, CartError> {
    raw.and_then(|raw| ProductId::parse(raw).ok())
        .ok_or(CartError::ProductIdRequired)
}

/// Narrow a wire quantity to the stored width. Negative values become zero.
fn clamp_quantity(quantity: i64) -> i32 {
    i32::try_from(quantity.max(0)).unwrap_or(i32::MAX)
}
