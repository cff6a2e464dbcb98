//! Cart repository.
//!
//! `cart_items` has a `UNIQUE (cart_id, product_id)` constraint; adding a
//! product that is already in the cart goes through `ON CONFLICT` so there
//! is never a second row for the pair.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use luxuffy_core::pricing::CartMergePolicy;
use luxuffy_core::{CartId, CartItemId, ProductId, UserId};

use super::{RepositoryError, to_i32, to_u32};
use crate::models::{Cart, CartLine, Product};

const LINE_SELECT: &str = r"
    SELECT ci.id, ci.cart_id, ci.product_id,
           p.name AS product_name, p.slug AS product_slug,
           ci.quantity, ci.unit_price, ci.discount, ci.tax, ci.is_wishlist_item,
           ci.created_at, ci.updated_at,
           p.stock_quantity AS product_stock, p.is_active AS product_active
    FROM cart_items ci
    JOIN products p ON p.id = ci.product_id
";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: i64,
    user_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Self {
            id: CartId::new(row.id),
            user_id: UserId::new(row.user_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: i64,
    cart_id: i64,
    product_id: i64,
    product_name: String,
    product_slug: String,
    quantity: i32,
    unit_price: Decimal,
    discount: Decimal,
    tax: Decimal,
    is_wishlist_item: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    product_stock: i32,
    product_active: bool,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CartItemId::new(row.id),
            cart_id: CartId::new(row.cart_id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            product_slug: row.product_slug,
            quantity: to_u32(row.quantity, "quantity")?,
            unit_price: row.unit_price,
            discount: row.discount,
            tax: row.tax,
            is_wishlist_item: row.is_wishlist_item,
            created_at: row.created_at,
            updated_at: row.updated_at,
            product_stock: to_u32(row.product_stock, "stock_quantity")?,
            product_active: row.product_active,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for carts and cart lines.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the user's cart, creating it on first access.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            INSERT INTO carts (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING id, user_id, created_at, updated_at
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// All lines of a cart in the order they were added.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(&format!(
            "{LINE_SELECT} WHERE ci.cart_id = $1 ORDER BY ci.created_at, ci.id"
        ))
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// One line of a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn line(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let row = sqlx::query_as::<_, CartLineRow>(&format!(
            "{LINE_SELECT} WHERE ci.cart_id = $1 AND ci.id = $2"
        ))
        .bind(cart_id)
        .bind(item_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert a line, or merge into the existing line for the same product.
    ///
    /// A new line snapshots the product's current price. A merged line keeps
    /// its original snapshot and takes the requested wishlist flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn upsert_line(
        &self,
        cart_id: CartId,
        product: &Product,
        quantity: u32,
        is_wishlist_item: bool,
        policy: CartMergePolicy,
    ) -> Result<CartLine, RepositoryError> {
        let accumulate = matches!(policy, CartMergePolicy::Accumulate);
        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO cart_items (cart_id, product_id, quantity, unit_price, is_wishlist_item)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (cart_id, product_id) DO UPDATE SET
                quantity = CASE
                    WHEN $6 THEN LEAST(cart_items.quantity::BIGINT + EXCLUDED.quantity, 2147483647)::INTEGER
                    ELSE EXCLUDED.quantity
                END,
                is_wishlist_item = EXCLUDED.is_wishlist_item,
                updated_at = NOW()
            RETURNING id
            ",
        )
        .bind(cart_id)
        .bind(product.id)
        .bind(to_i32(quantity, "quantity")?)
        .bind(product.price)
        .bind(is_wishlist_item)
        .bind(accumulate)
        .fetch_one(self.pool)
        .await?;

        self.line(cart_id, CartItemId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Set a line's quantity and, when given, its wishlist flag.
    ///
    /// Returns `None` if the line is not in this cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn update_line(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
        quantity: u32,
        is_wishlist_item: Option<bool>,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let updated = sqlx::query(
            r"
            UPDATE cart_items
            SET quantity = $3,
                is_wishlist_item = COALESCE($4, is_wishlist_item),
                updated_at = NOW()
            WHERE cart_id = $1 AND id = $2
            ",
        )
        .bind(cart_id)
        .bind(item_id)
        .bind(to_i32(quantity, "quantity")?)
        .bind(is_wishlist_item)
        .execute(self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.line(cart_id, item_id).await
    }

    /// Delete one line. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn delete_line(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND id = $2")
            .bind(cart_id)
            .bind(item_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every line of a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn clear(&self, cart_id: CartId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Flag every line of a cart as a wishlist item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn mark_all_wishlist(&self, cart_id: CartId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE cart_items
            SET is_wishlist_item = TRUE, updated_at = NOW()
            WHERE cart_id = $1 AND NOT is_wishlist_item
            ",
        )
        .bind(cart_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
