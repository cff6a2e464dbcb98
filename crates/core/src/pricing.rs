//! Pricing arithmetic for cart lines, cart totals and checkout quotes.
//!
//! Two pricing policies coexist and must not be confused:
//!
//! - **Cart lines** keep the unit price captured when the product was first
//!   added. Later catalog price changes do not touch an existing line.
//! - **Checkout** re-quotes every item from the live catalog price. The
//!   totals of the resulting order never depend on what the cart said.
//!
//! Discounts are per unit; tax is per line.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;
use crate::types::money::round_money;

/// Largest quantity a line can hold. Quantities are stored as Postgres
/// `integer` columns.
pub const MAX_QUANTITY: u32 = i32::MAX.unsigned_abs();

/// What happens when a product that is already in the cart is added again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartMergePolicy {
    /// The new quantity overwrites the old one (last write wins).
    #[default]
    Replace,
    /// The new quantity is added to the old one.
    Accumulate,
}

impl CartMergePolicy {
    /// Quantity of the merged line, capped at [`MAX_QUANTITY`].
    #[must_use]
    pub const fn merge(self, existing: u32, requested: u32) -> u32 {
        let merged = match self {
            Self::Replace => requested,
            Self::Accumulate => existing.saturating_add(requested),
        };
        if merged > MAX_QUANTITY { MAX_QUANTITY } else { merged }
    }
}

/// The amounts that make up one priced line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAmounts {
    pub unit_price: Decimal,
    pub quantity: u32,
    /// Discount per unit.
    pub discount: Decimal,
    /// Tax for the whole line.
    pub tax: Decimal,
}

impl LineAmounts {
    /// A line with no discount and no tax.
    #[must_use]
    pub const fn plain(unit_price: Decimal, quantity: u32) -> Self {
        Self {
            unit_price,
            quantity,
            discount: Decimal::ZERO,
            tax: Decimal::ZERO,
        }
    }

    /// `unit_price * quantity`, before discount and tax.
    #[must_use]
    pub fn gross(&self) -> Decimal {
        round_money(self.unit_price * Decimal::from(self.quantity))
    }

    /// Discount across every unit of the line.
    #[must_use]
    pub fn discount_total(&self) -> Decimal {
        round_money(self.discount * Decimal::from(self.quantity))
    }

    /// `(unit_price - discount) * quantity + tax`.
    #[must_use]
    pub fn total(&self) -> Decimal {
        round_money((self.unit_price - self.discount) * Decimal::from(self.quantity) + self.tax)
    }
}

/// Aggregates over a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedgerTotals {
    pub total_amount: Decimal,
    pub total_discount: Decimal,
    pub total_tax: Decimal,
}

impl<'a> FromIterator<&'a LineAmounts> for LedgerTotals {
    fn from_iter<I: IntoIterator<Item = &'a LineAmounts>>(iter: I) -> Self {
        iter.into_iter().fold(Self::default(), |acc, line| Self {
            total_amount: acc.total_amount + line.total(),
            total_discount: acc.total_discount + line.discount_total(),
            total_tax: acc.total_tax + line.tax,
        })
    }
}

/// Errors building a checkout quote.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuoteError {
    #[error("at least one item is required")]
    Empty,
    #[error("quantity for product {0} must be greater than 0")]
    InvalidQuantity(ProductId),
}

/// A catalog product priced at its current price, ready to be quoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

/// One line of a checkout quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotedLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub amounts: LineAmounts,
}

impl QuotedLine {
    /// Total price of the line.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.amounts.total()
    }
}

/// Priced checkout: the lines and order-level amounts of a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutQuote {
    pub lines: Vec<QuotedLine>,
    pub subtotal_amount: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
}

impl CheckoutQuote {
    /// Price every item at its current unit price.
    ///
    /// ```
    /// use luxuffy_core::ProductId;
    /// use luxuffy_core::pricing::{CheckoutQuote, PricedItem};
    /// use rust_decimal::Decimal;
    ///
    /// let quote = CheckoutQuote::build(vec![PricedItem {
    ///     product_id: ProductId::new(1),
    ///     product_name: "Ankara tote".into(),
    ///     unit_price: Decimal::new(1000, 2),
    ///     quantity: 3,
    /// }])
    /// .unwrap();
    /// assert_eq!(quote.subtotal_amount, Decimal::new(3000, 2));
    /// assert_eq!(quote.total_amount, Decimal::new(3000, 2));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`QuoteError::Empty`] for no items and
    /// [`QuoteError::InvalidQuantity`] for a zero quantity.
    pub fn build(items: Vec<PricedItem>) -> Result<Self, QuoteError> {
        if items.is_empty() {
            return Err(QuoteError::Empty);
        }
        if let Some(bad) = items.iter().find(|item| item.quantity == 0) {
            return Err(QuoteError::InvalidQuantity(bad.product_id));
        }

        let lines: Vec<QuotedLine> = items
            .into_iter()
            .map(|item| QuotedLine {
                product_id: item.product_id,
                product_name: item.product_name,
                amounts: LineAmounts::plain(item.unit_price, item.quantity),
            })
            .collect();

        let subtotal_amount = lines.iter().map(|l| l.amounts.gross()).sum::<Decimal>();
        let discount_amount = lines
            .iter()
            .map(|l| l.amounts.discount_total())
            .sum::<Decimal>();
        let tax_amount = lines.iter().map(|l| l.amounts.tax).sum::<Decimal>();

        Ok(Self {
            lines,
            subtotal_amount,
            discount_amount,
            tax_amount,
            total_amount: subtotal_amount - discount_amount + tax_amount,
        })
    }

    /// Total quantity requested per product, for stock checks.
    #[must_use]
    pub fn quantities(&self) -> Vec<(ProductId, u32)> {
        let mut out: Vec<(ProductId, u32)> = Vec::new();
        for line in &self.lines {
            match out.iter_mut().find(|(id, _)| *id == line.product_id) {
                Some((_, qty)) => *qty = qty.saturating_add(line.amounts.quantity),
                None => out.push((line.product_id, line.amounts.quantity)),
            }
        }
        out
    }
}
