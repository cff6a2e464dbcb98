//! [`CommerceStore`] over the `PostgreSQL` repositories.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use luxuffy_core::pricing::CartMergePolicy;
use luxuffy_core::{
    CartId, CartItemId, Email, OrderId, OrderStatus, PaymentId, ProductId, RefundId, UserId,
};

use super::CommerceStore;
use crate::db::{
    CartRepository, CatalogRepository, OrderRepository, PaymentRepository, RepositoryError,
    UserRepository,
};
use crate::models::{
    Cart, CartLine, Category, NewCategory, NewOrder, NewPayment, NewProduct, NewRefund, Order,
    Page, Payment, PaymentRefund, PaymentSettlement, Product, ProductFilter, RefundSettlement,
    User,
};

/// Postgres-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    const fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.pool)
    }

    const fn catalog(&self) -> CatalogRepository<'_> {
        CatalogRepository::new(&self.pool)
    }

    const fn carts(&self) -> CartRepository<'_> {
        CartRepository::new(&self.pool)
    }

    const fn orders(&self) -> OrderRepository<'_> {
        OrderRepository::new(&self.pool)
    }

    const fn payments(&self) -> PaymentRepository<'_> {
        PaymentRepository::new(&self.pool)
    }
}

#[async_trait]
impl CommerceStore for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn user_for_token(&self, token_hash: &str) -> Result<Option<User>, RepositoryError> {
        self.users().find_by_token_hash(token_hash).await
    }

    async fn upsert_user(&self, email: &Email) -> Result<User, RepositoryError> {
        self.users().upsert(email).await
    }

    async fn create_token(
        &self,
        user_id: UserId,
        token_hash: &str,
    ) -> Result<(), RepositoryError> {
        self.users().create_token(user_id, token_hash).await
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Page<Product>, RepositoryError> {
        self.catalog().list_products(filter).await
    }

    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        self.catalog().product_by_slug(slug).await
    }

    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.catalog().product_by_id(id).await
    }

    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        self.catalog().products_by_ids(ids).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        self.catalog().list_categories().await
    }

    async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        self.catalog().category_by_slug(slug).await
    }

    async fn create_category(&self, new: &NewCategory) -> Result<Category, RepositoryError> {
        self.catalog().create_category(new).await
    }

    async fn create_product(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        self.catalog().create_product(new).await
    }

    async fn get_or_create_cart(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        self.carts().get_or_create(user_id).await
    }

    async fn cart_lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        self.carts().lines(cart_id).await
    }

    async fn upsert_cart_line(
        &self,
        cart_id: CartId,
        product: &Product,
        quantity: u32,
        is_wishlist_item: bool,
        policy: CartMergePolicy,
    ) -> Result<CartLine, RepositoryError> {
        self.carts()
            .upsert_line(cart_id, product, quantity, is_wishlist_item, policy)
            .await
    }

    async fn update_cart_line(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
        quantity: u32,
        is_wishlist_item: Option<bool>,
    ) -> Result<Option<CartLine>, RepositoryError> {
        self.carts()
            .update_line(cart_id, item_id, quantity, is_wishlist_item)
            .await
    }

    async fn delete_cart_line(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<bool, RepositoryError> {
        self.carts().delete_line(cart_id, item_id).await
    }

    async fn clear_cart(&self, cart_id: CartId) -> Result<u64, RepositoryError> {
        self.carts().clear(cart_id).await
    }

    async fn mark_all_wishlist(&self, cart_id: CartId) -> Result<u64, RepositoryError> {
        self.carts().mark_all_wishlist(cart_id).await
    }

    async fn place_order(
        &self,
        user_id: UserId,
        order: &NewOrder,
    ) -> Result<Order, RepositoryError> {
        self.orders().place(user_id, order).await
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        self.orders().list_for_user(user_id).await
    }

    async fn order_for_user(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        self.orders().get_for_user(user_id, order_id).await
    }

    async fn update_order_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        self.orders().update_status(order_id, expected, next).await
    }

    async fn payment_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Payment>, RepositoryError> {
        self.payments().for_order(order_id).await
    }

    async fn payment_by_reference(
        &self,
        user_id: UserId,
        reference: &str,
    ) -> Result<Option<Payment>, RepositoryError> {
        self.payments().by_reference(user_id, reference).await
    }

    async fn payment_for_user(
        &self,
        user_id: UserId,
        payment_id: PaymentId,
    ) -> Result<Option<Payment>, RepositoryError> {
        self.payments().for_user(user_id, payment_id).await
    }

    async fn create_payment(&self, new: &NewPayment) -> Result<Payment, RepositoryError> {
        self.payments().create(new).await
    }

    async fn delete_payment(&self, payment_id: PaymentId) -> Result<(), RepositoryError> {
        self.payments().delete(payment_id).await
    }

    async fn settle_payment(
        &self,
        payment_id: PaymentId,
        settlement: &PaymentSettlement,
    ) -> Result<Payment, RepositoryError> {
        self.payments().settle(payment_id, settlement).await
    }

    async fn refunded_total(&self, payment_id: PaymentId) -> Result<Decimal, RepositoryError> {
        self.payments().refunded_total(payment_id).await
    }

    async fn create_refund(&self, new: &NewRefund) -> Result<PaymentRefund, RepositoryError> {
        self.payments().create_refund(new).await
    }

    async fn delete_refund(&self, refund_id: RefundId) -> Result<(), RepositoryError> {
        self.payments().delete_refund(refund_id).await
    }

    async fn settle_refund(
        &self,
        refund_id: RefundId,
        settlement: &RefundSettlement,
    ) -> Result<PaymentRefund, RepositoryError> {
        self.payments().settle_refund(refund_id, settlement).await
    }
}
