//! Checkout and the order lifecycle.
//!
//! Checkout re-prices every item from the live catalog; whatever the cart
//! said about prices is ignored. The store commits the stock decrements,
//! the order and the cart clear-out as one unit.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::instrument;

use luxuffy_core::pricing::{CheckoutQuote, MAX_QUANTITY, PricedItem};
use luxuffy_core::{OrderId, OrderStatus, PaymentMethod, ProductId, UserId};

use super::{ServiceError, Violations};
use crate::db::RepositoryError;
use crate::models::order::DEFAULT_SHIPPING_METHOD;
use crate::models::{NewOrder, Order, Product};
use crate::store::CommerceStore;

const INVALID_ORDER: &str = "Invalid order data";
const NOT_CANCELLABLE: &str = "Order cannot be cancelled";
const BLANK: &str = "This field may not be blank.";

/// One requested line of a new order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// A checkout request as submitted by the customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreateOrder {
    #[serde(default)]
    pub items: Vec<OrderLineRequest>,
    #[serde(default)]
    pub shipping_address: String,
    /// Defaults to the shipping address.
    #[serde(default)]
    pub billing_address: Option<String>,
    /// Defaults to `standard`.
    #[serde(default)]
    pub shipping_method: Option<String>,
    #[serde(default)]
    pub payment_method: String,
}

/// Shape checks that need no store access.
fn validate(request: &CreateOrder) -> Result<(PaymentMethod, Vec<(ProductId, u32)>), ServiceError> {
    let mut violations = Violations::default();

    if request.items.is_empty() {
        violations.add("items", "At least one item is required.");
    }
    let mut lines = Vec::with_capacity(request.items.len());
    for item in &request.items {
        match u32::try_from(item.quantity).ok() {
            Some(quantity) if (1..=MAX_QUANTITY).contains(&quantity) => {
                lines.push((item.product_id, quantity));
            }
            Some(quantity) if quantity > MAX_QUANTITY => violations.add(
                "items",
                format!(
                    "Quantity for product {} must be at most {MAX_QUANTITY}.",
                    item.product_id
                ),
            ),
            _ => violations.add(
                "items",
                format!("Quantity for product {} must be at least 1.", item.product_id),
            ),
        }
    }

    if request.shipping_address.trim().is_empty() {
        violations.add("shipping_address", BLANK);
    }

    let payment_method = request.payment_method.trim().parse::<PaymentMethod>();
    if payment_method.is_err() {
        violations.add(
            "payment_method",
            format!("\"{}\" is not a valid choice.", request.payment_method),
        );
    }

    violations.check(INVALID_ORDER)?;
    let payment_method = payment_method.map_err(ServiceError::validation)?;
    Ok((payment_method, lines))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

pub struct OrderService<'a> {
    store: &'a dyn CommerceStore,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn CommerceStore) -> Self {
        Self { store }
    }

    /// Price the requested lines at the current catalog price.
    async fn quote(&self, lines: &[(ProductId, u32)]) -> Result<CheckoutQuote, ServiceError> {
        let mut ids: Vec<ProductId> = lines.iter().map(|(id, _)| *id).collect();
        ids.sort_unstable();
        ids.dedup();

        let products: HashMap<ProductId, Product> = self
            .store
            .products_by_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut violations = Violations::default();
        let mut items = Vec::with_capacity(lines.len());
        for &(product_id, quantity) in lines {
            match products.get(&product_id) {
                None => violations.add("items", format!("Product {product_id} does not exist.")),
                Some(product) if !product.is_active => violations.add(
                    "items",
                    format!("Product {product_id} is not available."),
                ),
                Some(product) => items.push(PricedItem {
                    product_id,
                    product_name: product.name.clone(),
                    unit_price: product.price,
                    quantity,
                }),
            }
        }
        violations.check(INVALID_ORDER)?;

        CheckoutQuote::build(items).map_err(|e| ServiceError::invalid_field("items", e.to_string()))
    }

    /// Place an order for the requested items.
    ///
    /// On success the user's cart is empty and stock has been decremented.
    /// On failure nothing has changed.
    ///
    /// # Errors
    ///
    /// `Validation` for malformed input, unknown or inactive products and
    /// insufficient stock.
    #[instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn create_order(
        &self,
        user_id: UserId,
        request: &CreateOrder,
    ) -> Result<Order, ServiceError> {
        let (payment_method, lines) = validate(request)?;
        let quote = self.quote(&lines).await?;

        let shipping_address = request.shipping_address.trim().to_owned();
        let new_order = NewOrder {
            billing_address: non_blank(request.billing_address.as_deref())
                .unwrap_or_else(|| shipping_address.clone()),
            shipping_method: non_blank(request.shipping_method.as_deref())
                .unwrap_or_else(|| DEFAULT_SHIPPING_METHOD.to_owned()),
            shipping_address,
            payment_method,
            quote,
        };

        let order = self
            .store
            .place_order(user_id, &new_order)
            .await
            .map_err(|e| match e {
                RepositoryError::InsufficientStock(product_id) => ServiceError::invalid_field(
                    "items",
                    format!("Insufficient stock for product {product_id}."),
                ),
                other => other.into(),
            })?;

        tracing::info!(
            order_id = %order.id,
            total = %order.total_amount,
            "Order placed"
        );
        Ok(order)
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// `Store` on storage failure.
    pub async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, ServiceError> {
        Ok(self.store.orders_for_user(user_id).await?)
    }

    /// # Errors
    ///
    /// `NotFound` if the order is missing or belongs to another user.
    pub async fn get_order(&self, user_id: UserId, order_id: OrderId) -> Result<Order, ServiceError> {
        self.store
            .order_for_user(user_id, order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order"))
    }

    /// Cancel a pending or processing order. No refund is started.
    ///
    /// # Errors
    ///
    /// `NotFound` if the order is not the user's, `Validation` if its status
    /// no longer allows cancellation.
    #[instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Order, ServiceError> {
        let order = self.get_order(user_id, order_id).await?;
        if !order.status.can_transition_to(OrderStatus::Cancelled) {
            return Err(ServiceError::validation(NOT_CANCELLABLE));
        }

        let cancelled = self
            .store
            .update_order_status(order.id, order.status, OrderStatus::Cancelled)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => ServiceError::validation(NOT_CANCELLABLE),
                other => other.into(),
            })?;

        tracing::info!(order_id = %cancelled.id, from = order.status.label(), "Order cancelled");
        Ok(cancelled)
    }
}
