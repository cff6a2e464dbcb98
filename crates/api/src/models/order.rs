//! Order ledger types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use luxuffy_core::pricing::CheckoutQuote;
use luxuffy_core::{
    OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus, ProductId, UserId,
};

/// Shipping method used when the client does not choose one.
pub const DEFAULT_SHIPPING_METHOD: &str = "standard";

/// A placed order with its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_address: String,
    pub billing_address: String,
    pub shipping_method: String,
    pub payment_method: PaymentMethod,
    pub subtotal_amount: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// An immutable snapshot of one purchased product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    /// Unit price at purchase.
    pub price: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub total_price: Decimal,
}

/// A validated, priced order ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub shipping_address: String,
    pub billing_address: String,
    pub shipping_method: String,
    pub payment_method: PaymentMethod,
    pub quote: CheckoutQuote,
}
