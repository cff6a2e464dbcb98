//! Order repository.
//!
//! Placing an order is one transaction: conditional stock decrements, the
//! order row, its item snapshots and clearing the user's cart. A decrement
//! that matches no row aborts the transaction with
//! `RepositoryError::InsufficientStock`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use luxuffy_core::{
    OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus, ProductId, UserId,
};

use super::{RepositoryError, to_i32, to_u32};
use crate::models::{NewOrder, Order, OrderItem};

const ORDER_COLUMNS: &str = "id, user_id, status, payment_status, shipping_address, \
                             billing_address, shipping_method, payment_method, subtotal_amount, \
                             tax_amount, discount_amount, total_amount, created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, order_id, product_id, product_name, quantity, price, discount, tax, total_price";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    status: OrderStatus,
    payment_status: PaymentStatus,
    shipping_address: String,
    billing_address: String,
    shipping_method: String,
    payment_method: PaymentMethod,
    subtotal_amount: Decimal,
    tax_amount: Decimal,
    discount_amount: Decimal,
    total_amount: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            status: self.status,
            payment_status: self.payment_status,
            shipping_address: self.shipping_address,
            billing_address: self.billing_address,
            shipping_method: self.shipping_method,
            payment_method: self.payment_method,
            subtotal_amount: self.subtotal_amount,
            tax_amount: self.tax_amount,
            discount_amount: self.discount_amount,
            total_amount: self.total_amount,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i64,
    order_id: i64,
    product_id: i64,
    product_name: String,
    quantity: i32,
    price: Decimal,
    discount: Decimal,
    tax: Decimal,
    total_price: Decimal,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            quantity: to_u32(row.quantity, "quantity")?,
            price: row.price,
            discount: row.discount,
            tax: row.tax,
            total_price: row.total_price,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for orders and order items.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a priced order atomically and empty the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InsufficientStock` if any product cannot
    /// cover its quantity (nothing is written).
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self, order), fields(lines = order.quote.lines.len()))]
    pub async fn place(&self, user_id: UserId, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for (product_id, quantity) in order.quote.quantities() {
            decrement_stock(&mut tx, product_id, quantity).await?;
        }

        let quote = &order.quote;
        let order_row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO orders (user_id, shipping_address, billing_address, shipping_method,
                                payment_method, subtotal_amount, tax_amount, discount_amount,
                                total_amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(&order.shipping_address)
        .bind(&order.billing_address)
        .bind(&order.shipping_method)
        .bind(order.payment_method)
        .bind(quote.subtotal_amount)
        .bind(quote.tax_amount)
        .bind(quote.discount_amount)
        .bind(quote.total_amount)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(quote.lines.len());
        for line in &quote.lines {
            let row = sqlx::query_as::<_, OrderItemRow>(&format!(
                r"
                INSERT INTO order_items (order_id, product_id, product_name, quantity, price,
                                         discount, tax, total_price)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING {ITEM_COLUMNS}
                "
            ))
            .bind(order_row.id)
            .bind(line.product_id)
            .bind(&line.product_name)
            .bind(to_i32(line.amounts.quantity, "quantity")?)
            .bind(line.amounts.unit_price)
            .bind(line.amounts.discount_total())
            .bind(line.amounts.tax)
            .bind(line.total_price())
            .fetch_one(&mut *tx)
            .await?;
            items.push(row.try_into()?);
        }

        sqlx::query(
            r"
            DELETE FROM cart_items ci
            USING carts c
            WHERE c.id = ci.cart_id AND c.user_id = $1
            ",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(order_row.into_order(items))
    }

    /// All orders of a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut items = self.items_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let order_items = items.remove(&row.id).unwrap_or_default();
                row.into_order(order_items)
            })
            .collect())
    }

    /// One order of a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2"
        ))
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        self.with_items(row).await
    }

    /// Move an order from `expected` to `next`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order is no longer in
    /// `expected` status.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE orders
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order_id)
        .bind(expected)
        .bind(next)
        .fetch_optional(self.pool)
        .await?;

        if row.is_none() {
            return Err(RepositoryError::Conflict(format!(
                "order {order_id} is no longer {}",
                expected.label()
            )));
        }
        self.with_items(row).await?.ok_or(RepositoryError::NotFound)
    }

    async fn with_items(&self, row: Option<OrderRow>) -> Result<Option<Order>, RepositoryError> {
        let Some(row) = row else {
            return Ok(None);
        };
        let items = self.items_for(&[row.id]).await?.remove(&row.id).unwrap_or_default();
        Ok(Some(row.into_order(items)))
    }

    async fn items_for(
        &self,
        order_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<OrderItem>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, OrderItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY id"
        ))
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<i64, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let order_id = row.order_id;
            grouped.entry(order_id).or_default().push(row.try_into()?);
        }
        Ok(grouped)
    }
}

/// Take `quantity` units out of stock, or fail if stock cannot cover them.
async fn decrement_stock(
    tx: &mut Transaction<'_, Postgres>,
    product_id: ProductId,
    quantity: u32,
) -> Result<(), RepositoryError> {
    // Stock is an `integer`, so it can never cover more than `i32::MAX`.
    let Ok(quantity) = i32::try_from(quantity) else {
        return Err(RepositoryError::InsufficientStock(product_id));
    };
    let result = sqlx::query(
        r"
        UPDATE products
        SET stock_quantity = stock_quantity - $2, updated_at = NOW()
        WHERE id = $1 AND is_active AND stock_quantity >= $2
        ",
    )
    .bind(product_id)
    .bind(quantity)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::InsufficientStock(product_id));
    }
    Ok(())
}
