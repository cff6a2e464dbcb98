//! Cart ledger operations.
//!
//! Every mutation returns a fresh [`CartSnapshot`], so totals always come
//! from the lines as they are after the write.

use tracing::instrument;

use luxuffy_core::pricing::{CartMergePolicy, MAX_QUANTITY};
use luxuffy_core::{CartItemId, ProductId, UserId};

use super::ServiceError;
use crate::models::{Cart, CartSnapshot};
use crate::store::CommerceStore;

const INVALID_QUANTITY: &str = "Invalid quantity";

/// Parse a requested quantity; anything outside `1..=MAX_QUANTITY` is rejected.
fn parse_quantity(requested: i64) -> Result<u32, ServiceError> {
    u32::try_from(requested)
        .ok()
        .filter(|q| (1..=MAX_QUANTITY).contains(q))
        .ok_or_else(|| ServiceError::invalid_field("quantity", INVALID_QUANTITY))
}

pub struct CartService<'a> {
    store: &'a dyn CommerceStore,
    policy: CartMergePolicy,
}

impl<'a> CartService<'a> {
    /// A cart service using [`CartMergePolicy::Replace`].
    #[must_use]
    pub fn new(store: &'a dyn CommerceStore) -> Self {
        Self {
            store,
            policy: CartMergePolicy::default(),
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: CartMergePolicy) -> Self {
        self.policy = policy;
        self
    }

    async fn cart(&self, user_id: UserId) -> Result<Cart, ServiceError> {
        Ok(self.store.get_or_create_cart(user_id).await?)
    }

    async fn snapshot(&self, cart: Cart) -> Result<CartSnapshot, ServiceError> {
        let lines = self.store.cart_lines(cart.id).await?;
        Ok(CartSnapshot::new(cart, lines))
    }

    /// The user's cart, created on first access.
    ///
    /// # Errors
    ///
    /// `Store` on storage failure.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: UserId) -> Result<CartSnapshot, ServiceError> {
        let cart = self.cart(user_id).await?;
        self.snapshot(cart).await
    }

    /// Add a product or, if it is already in the cart, merge per the policy.
    ///
    /// A new line snapshots the current product price. An existing line keeps
    /// its original price.
    ///
    /// # Errors
    ///
    /// `Validation` if `quantity < 1`, `NotFound` for an unknown product.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
        is_wishlist_item: bool,
    ) -> Result<CartSnapshot, ServiceError> {
        let quantity = parse_quantity(quantity)?;
        let cart = self.cart(user_id).await?;
        let product = self
            .store
            .product_by_id(product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product"))?;

        self.store
            .upsert_cart_line(cart.id, &product, quantity, is_wishlist_item, self.policy)
            .await?;
        self.snapshot(cart).await
    }

    /// Change a line's quantity and, if given, its wishlist flag.
    ///
    /// # Errors
    ///
    /// `NotFound` if the line is not in the user's cart, `Validation` if
    /// `quantity < 1`.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: Option<i64>,
        is_wishlist_item: Option<bool>,
    ) -> Result<CartSnapshot, ServiceError> {
        let cart = self.cart(user_id).await?;
        let not_found = || ServiceError::not_found("Cart item");

        // Foreign lines are reported as missing before the quantity is looked at.
        let owned = self
            .store
            .cart_lines(cart.id)
            .await?
            .iter()
            .any(|line| line.id == item_id);
        if !owned {
            return Err(not_found());
        }
        let quantity = quantity
            .ok_or_else(|| ServiceError::invalid_field("quantity", INVALID_QUANTITY))
            .and_then(parse_quantity)?;

        self.store
            .update_cart_line(cart.id, item_id, quantity, is_wishlist_item)
            .await?
            .ok_or_else(not_found)?;
        self.snapshot(cart).await
    }

    /// # Errors
    ///
    /// `NotFound` if the line is not in the user's cart.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<(), ServiceError> {
        let cart = self.cart(user_id).await?;
        if self.store.delete_cart_line(cart.id, item_id).await? {
            Ok(())
        } else {
            Err(ServiceError::not_found("Cart item"))
        }
    }

    /// Delete every line. Clearing an empty cart is not an error.
    ///
    /// # Errors
    ///
    /// `Store` on storage failure.
    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: UserId) -> Result<(), ServiceError> {
        let cart = self.cart(user_id).await?;
        let removed = self.store.clear_cart(cart.id).await?;
        tracing::debug!(cart_id = %cart.id, removed, "Cleared cart");
        Ok(())
    }

    /// Flag every line as a wishlist item. Lines stay in the cart.
    ///
    /// # Errors
    ///
    /// `Store` on storage failure.
    #[instrument(skip(self))]
    pub async fn move_all_to_wishlist(&self, user_id: UserId) -> Result<CartSnapshot, ServiceError> {
        let cart = self.cart(user_id).await?;
        self.store.mark_all_wishlist(cart.id).await?;
        self.snapshot(cart).await
    }
}
