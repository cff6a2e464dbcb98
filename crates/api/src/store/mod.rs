//! Storage seam between the services and persistence.
//!
//! Services only see [`CommerceStore`]. [`PgStore`] backs it with the
//! `PostgreSQL` repositories in [`crate::db`]; [`MemoryStore`] keeps
//! everything in process for tests and local runs.

mod memory;
mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;

use luxuffy_core::pricing::CartMergePolicy;
use luxuffy_core::{
    CartId, CartItemId, Email, OrderId, OrderStatus, PaymentId, ProductId, RefundId, UserId,
};

use crate::db::RepositoryError;
use crate::models::{
    Cart, CartLine, Category, NewCategory, NewOrder, NewPayment, NewProduct, NewRefund, Order,
    Page, Payment, PaymentRefund, PaymentSettlement, Product, ProductFilter, RefundSettlement,
    User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Everything the services need to read and write.
///
/// Each method is atomic on its own. `place_order` additionally guarantees
/// that stock decrements, the order, its items and clearing the cart commit
/// together or not at all.
#[async_trait]
pub trait CommerceStore: Send + Sync {
    /// Check the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    // --- Accounts -----------------------------------------------------------

    async fn user_for_token(&self, token_hash: &str) -> Result<Option<User>, RepositoryError>;
    async fn upsert_user(&self, email: &Email) -> Result<User, RepositoryError>;
    async fn create_token(&self, user_id: UserId, token_hash: &str)
    -> Result<(), RepositoryError>;

    // --- Catalog ------------------------------------------------------------

    async fn list_products(&self, filter: &ProductFilter)
    -> Result<Page<Product>, RepositoryError>;
    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError>;
    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;
    async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError>;
    async fn create_category(&self, new: &NewCategory) -> Result<Category, RepositoryError>;
    async fn create_product(&self, new: &NewProduct) -> Result<Product, RepositoryError>;

    // --- Cart ---------------------------------------------------------------

    async fn get_or_create_cart(&self, user_id: UserId) -> Result<Cart, RepositoryError>;
    async fn cart_lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError>;
    async fn upsert_cart_line(
        &self,
        cart_id: CartId,
        product: &Product,
        quantity: u32,
        is_wishlist_item: bool,
        policy: CartMergePolicy,
    ) -> Result<CartLine, RepositoryError>;
    /// `None` when the line is not in this cart.
    async fn update_cart_line(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
        quantity: u32,
        is_wishlist_item: Option<bool>,
    ) -> Result<Option<CartLine>, RepositoryError>;
    /// Whether a line was removed.
    async fn delete_cart_line(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<bool, RepositoryError>;
    async fn clear_cart(&self, cart_id: CartId) -> Result<u64, RepositoryError>;
    async fn mark_all_wishlist(&self, cart_id: CartId) -> Result<u64, RepositoryError>;

    // --- Orders -------------------------------------------------------------

    async fn place_order(&self, user_id: UserId, order: &NewOrder)
    -> Result<Order, RepositoryError>;
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;
    async fn order_for_user(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Option<Order>, RepositoryError>;
    /// Compare-and-set on the order status.
    async fn update_order_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order, RepositoryError>;

    // --- Payments -----------------------------------------------------------

    async fn payment_for_order(&self, order_id: OrderId)
    -> Result<Option<Payment>, RepositoryError>;
    async fn payment_by_reference(
        &self,
        user_id: UserId,
        reference: &str,
    ) -> Result<Option<Payment>, RepositoryError>;
    async fn payment_for_user(
        &self,
        user_id: UserId,
        payment_id: PaymentId,
    ) -> Result<Option<Payment>, RepositoryError>;
    async fn create_payment(&self, new: &NewPayment) -> Result<Payment, RepositoryError>;
    async fn delete_payment(&self, payment_id: PaymentId) -> Result<(), RepositoryError>;
    /// Mark the payment successful and its order paid.
    async fn settle_payment(
        &self,
        payment_id: PaymentId,
        settlement: &PaymentSettlement,
    ) -> Result<Payment, RepositoryError>;
    /// Sum of the refunds recorded against a payment, pending ones included.
    async fn refunded_total(&self, payment_id: PaymentId) -> Result<Decimal, RepositoryError>;
    async fn create_refund(&self, new: &NewRefund) -> Result<PaymentRefund, RepositoryError>;
    async fn delete_refund(&self, refund_id: RefundId) -> Result<(), RepositoryError>;
    async fn settle_refund(
        &self,
        refund_id: RefundId,
        settlement: &RefundSettlement,
    ) -> Result<PaymentRefund, RepositoryError>;
}
