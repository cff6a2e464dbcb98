//! Cart ledger types.
//!
//! A [`CartLine`] stores the price snapshot taken when the product was added.
//! Totals are never stored; [`CartSnapshot`] derives them from the lines on
//! every read.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use luxuffy_core::pricing::{LedgerTotals, LineAmounts};
use luxuffy_core::{CartId, CartItemId, ProductId, UserId};

/// A user's cart. Exactly one per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of a cart, joined with the product fields needed for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_slug: String,
    pub quantity: u32,
    /// Unit price captured at add time.
    pub unit_price: Decimal,
    /// Discount per unit.
    pub discount: Decimal,
    /// Tax for the whole line.
    pub tax: Decimal,
    pub is_wishlist_item: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub product_stock: u32,
    #[serde(skip)]
    pub product_active: bool,
}

impl CartLine {
    #[must_use]
    pub const fn amounts(&self) -> LineAmounts {
        LineAmounts {
            unit_price: self.unit_price,
            quantity: self.quantity,
            discount: self.discount,
            tax: self.tax,
        }
    }

    /// `(unit_price - discount) * quantity + tax`.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.amounts().total()
    }

    /// Product is active and its stock covers this line.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.product_active && self.product_stock >= self.quantity
    }
}

/// A line together with its derived fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItemView {
    #[serde(flatten)]
    pub line: CartLine,
    pub total_price: Decimal,
    pub is_available: bool,
}

impl From<CartLine> for CartItemView {
    fn from(line: CartLine) -> Self {
        Self {
            total_price: line.total_price(),
            is_available: line.is_available(),
            line,
        }
    }
}

/// The cart as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSnapshot {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartItemView>,
    pub item_count: usize,
    pub total_amount: Decimal,
    pub total_discount: Decimal,
    pub total_tax: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartSnapshot {
    /// Build a snapshot, computing totals from `lines`.
    #[must_use]
    pub fn new(cart: Cart, lines: Vec<CartLine>) -> Self {
        let amounts: Vec<LineAmounts> = lines.iter().map(CartLine::amounts).collect();
        let totals: LedgerTotals = amounts.iter().collect();
        let items: Vec<CartItemView> = lines.into_iter().map(CartItemView::from).collect();

        Self {
            id: cart.id,
            user_id: cart.user_id,
            item_count: items.len(),
            items,
            total_amount: totals.total_amount,
            total_discount: totals.total_discount,
            total_tax: totals.total_tax,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        }
    }
}
