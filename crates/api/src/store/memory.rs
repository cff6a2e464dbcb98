//! In-process [`CommerceStore`].
//!
//! All state sits behind one `tokio::sync::Mutex`, so every trait method is
//! atomic. `place_order` checks every stock level before it writes anything.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use luxuffy_core::pricing::CartMergePolicy;
use luxuffy_core::slug::{slugify, unique_slug};
use luxuffy_core::{
    CartId, CartItemId, CategoryId, Email, OrderId, OrderItemId, OrderStatus, PaymentId,
    PaymentStatus, ProductId, RefundId, TransactionStatus, UserId,
};

use super::CommerceStore;
use crate::db::RepositoryError;
use crate::models::{
    Cart, CartLine, Category, NewCategory, NewOrder, NewPayment, NewProduct, NewRefund, Order,
    OrderItem, Page, Payment, PaymentRefund, PaymentSettlement, Product, ProductFilter,
    RefundSettlement, User,
};

#[derive(Debug, Clone)]
struct StoredLine {
    id: CartItemId,
    cart_id: CartId,
    product_id: ProductId,
    quantity: u32,
    unit_price: Decimal,
    discount: Decimal,
    tax: Decimal,
    is_wishlist_item: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    users: Vec<User>,
    tokens: HashMap<String, UserId>,
    categories: Vec<Category>,
    products: Vec<Product>,
    carts: Vec<Cart>,
    lines: Vec<StoredLine>,
    orders: Vec<Order>,
    payments: Vec<Payment>,
    refunds: Vec<PaymentRefund>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    fn join_line(&self, line: &StoredLine) -> Result<CartLine, RepositoryError> {
        let product = self.product(line.product_id).ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "cart line {} references missing product {}",
                line.id, line.product_id
            ))
        })?;

        Ok(CartLine {
            id: line.id,
            cart_id: line.cart_id,
            product_id: line.product_id,
            product_name: product.name.clone(),
            product_slug: product.slug.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            discount: line.discount,
            tax: line.tax,
            is_wishlist_item: line.is_wishlist_item,
            created_at: line.created_at,
            updated_at: line.updated_at,
            product_stock: product.stock_quantity,
            product_active: product.is_active,
        })
    }

    fn line_for(&self, cart_id: CartId, item_id: CartItemId) -> Option<&StoredLine> {
        self.lines
            .iter()
            .find(|l| l.cart_id == cart_id && l.id == item_id)
    }
}

/// Store that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of refund rows, for assertions on compensating deletes.
    pub async fn refund_count(&self) -> usize {
        self.state.lock().await.refunds.len()
    }

    /// Current stock of a product.
    pub async fn stock_of(&self, id: ProductId) -> Option<u32> {
        self.state.lock().await.product(id).map(|p| p.stock_quantity)
    }
}

#[async_trait]
impl CommerceStore for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn user_for_token(&self, token_hash: &str) -> Result<Option<User>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .tokens
            .get(token_hash)
            .and_then(|id| state.users.iter().find(|u| u.id == *id))
            .cloned())
    }

    async fn upsert_user(&self, email: &Email) -> Result<User, RepositoryError> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.iter().find(|u| u.email == *email) {
            return Ok(user.clone());
        }
        let user = User {
            id: UserId::new(state.next_id()),
            email: email.clone(),
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn create_token(
        &self,
        user_id: UserId,
        token_hash: &str,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if !state.users.iter().any(|u| u.id == user_id) {
            return Err(RepositoryError::NotFound);
        }
        if state.tokens.contains_key(token_hash) {
            return Err(RepositoryError::Conflict("token already exists".to_string()));
        }
        state.tokens.insert(token_hash.to_owned(), user_id);
        Ok(())
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Page<Product>, RepositoryError> {
        let state = self.state.lock().await;
        let category_id = match &filter.category_slug {
            Some(slug) => match state.categories.iter().find(|c| &c.slug == slug) {
                Some(category) => Some(category.id),
                None => {
                    return Ok(Page {
                        items: Vec::new(),
                        page: filter.page,
                        per_page: filter.per_page,
                        total: 0,
                    });
                }
            },
            None => None,
        };

        let mut matching: Vec<&Product> = state
            .products
            .iter()
            .filter(|p| p.is_active)
            .filter(|p| category_id.is_none_or(|id| p.category_id == Some(id)))
            .filter(|p| filter.matches_search(p))
            .collect();
        matching.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        let total = matching.len() as u64;
        let offset = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
        let items = matching
            .into_iter()
            .skip(offset)
            .take(filter.per_page as usize)
            .cloned()
            .collect();

        Ok(Page {
            items,
            page: filter.page,
            per_page: filter.per_page,
            total,
        })
    }

    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.products.iter().find(|p| p.slug == slug).cloned())
    }

    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.state.lock().await.product(id).cloned())
    }

    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let mut categories = self.state.lock().await.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.categories.iter().find(|c| c.slug == slug).cloned())
    }

    async fn create_category(&self, new: &NewCategory) -> Result<Category, RepositoryError> {
        let mut state = self.state.lock().await;
        let slug = unique_slug(&slugify(&new.name), |candidate| {
            state.categories.iter().any(|c| c.slug == candidate)
        });
        let category = Category {
            id: CategoryId::new(state.next_id()),
            name: new.name.clone(),
            slug,
            description: new.description.clone(),
            parent_id: new.parent_id,
            created_at: Utc::now(),
        };
        state.categories.push(category.clone());
        Ok(category)
    }

    async fn create_product(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let mut state = self.state.lock().await;
        let slug = unique_slug(&slugify(&new.name), |candidate| {
            state.products.iter().any(|p| p.slug == candidate)
        });
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(state.next_id()),
            category_id: new.category_id,
            name: new.name.clone(),
            slug,
            description: new.description.clone(),
            price: new.price,
            stock_quantity: new.stock_quantity,
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };
        state.products.push(product.clone());
        Ok(product)
    }

    async fn get_or_create_cart(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let mut state = self.state.lock().await;
        if let Some(cart) = state.carts.iter().find(|c| c.user_id == user_id) {
            return Ok(cart.clone());
        }
        let now = Utc::now();
        let cart = Cart {
            id: CartId::new(state.next_id()),
            user_id,
            created_at: now,
            updated_at: now,
        };
        state.carts.push(cart.clone());
        Ok(cart)
    }

    async fn cart_lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let state = self.state.lock().await;
        state
            .lines
            .iter()
            .filter(|l| l.cart_id == cart_id)
            .map(|l| state.join_line(l))
            .collect()
    }

    async fn upsert_cart_line(
        &self,
        cart_id: CartId,
        product: &Product,
        quantity: u32,
        is_wishlist_item: bool,
        policy: CartMergePolicy,
    ) -> Result<CartLine, RepositoryError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        if let Some(line) = state
            .lines
            .iter_mut()
            .find(|l| l.cart_id == cart_id && l.product_id == product.id)
        {
            line.quantity = policy.merge(line.quantity, quantity);
            line.is_wishlist_item = is_wishlist_item;
            line.updated_at = now;
            let stored = line.clone();
            return state.join_line(&stored);
        }

        let stored = StoredLine {
            id: CartItemId::new(state.next_id()),
            cart_id,
            product_id: product.id,
            quantity,
            unit_price: product.price,
            discount: Decimal::ZERO,
            tax: Decimal::ZERO,
            is_wishlist_item,
            created_at: now,
            updated_at: now,
        };
        state.lines.push(stored.clone());

        state.join_line(&stored)
    }

    async fn update_cart_line(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
        quantity: u32,
        is_wishlist_item: Option<bool>,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let mut state = self.state.lock().await;
        let Some(line) = state
            .lines
            .iter_mut()
            .find(|l| l.cart_id == cart_id && l.id == item_id)
        else {
            return Ok(None);
        };
        line.quantity = quantity;
        if let Some(flag) = is_wishlist_item {
            line.is_wishlist_item = flag;
        }
        line.updated_at = Utc::now();

        let stored = line.clone();
        state.join_line(&stored).map(Some)
    }

    async fn delete_cart_line(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.line_for(cart_id, item_id).is_none() {
            return Ok(false);
        }
        state
            .lines
            .retain(|l| !(l.cart_id == cart_id && l.id == item_id));
        Ok(true)
    }

    async fn clear_cart(&self, cart_id: CartId) -> Result<u64, RepositoryError> {
        let mut state = self.state.lock().await;
        let before = state.lines.len();
        state.lines.retain(|l| l.cart_id != cart_id);
        Ok((before - state.lines.len()) as u64)
    }

    async fn mark_all_wishlist(&self, cart_id: CartId) -> Result<u64, RepositoryError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let mut changed = 0;
        for line in state
            .lines
            .iter_mut()
            .filter(|l| l.cart_id == cart_id && !l.is_wishlist_item)
        {
            line.is_wishlist_item = true;
            line.updated_at = now;
            changed += 1;
        }
        Ok(changed)
    }

    async fn place_order(
        &self,
        user_id: UserId,
        order: &NewOrder,
    ) -> Result<Order, RepositoryError> {
        let mut state = self.state.lock().await;
        let quantities = order.quote.quantities();

        // Validate every decrement before touching anything.
        for &(product_id, quantity) in &quantities {
            let supplied = state
                .product(product_id)
                .is_some_and(|p| p.can_supply(quantity));
            if !supplied {
                return Err(RepositoryError::InsufficientStock(product_id));
            }
        }

        let now = Utc::now();
        for (product_id, quantity) in quantities {
            if let Some(product) = state.products.iter_mut().find(|p| p.id == product_id) {
                product.stock_quantity -= quantity;
                product.updated_at = now;
            }
        }

        let order_id = OrderId::new(state.next_id());
        let mut items = Vec::with_capacity(order.quote.lines.len());
        for line in &order.quote.lines {
            items.push(OrderItem {
                id: OrderItemId::new(state.next_id()),
                order_id,
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                quantity: line.amounts.quantity,
                price: line.amounts.unit_price,
                discount: line.amounts.discount_total(),
                tax: line.amounts.tax,
                total_price: line.total_price(),
            });
        }

        let placed = Order {
            id: order_id,
            user_id,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            shipping_address: order.shipping_address.clone(),
            billing_address: order.billing_address.clone(),
            shipping_method: order.shipping_method.clone(),
            payment_method: order.payment_method,
            subtotal_amount: order.quote.subtotal_amount,
            tax_amount: order.quote.tax_amount,
            discount_amount: order.quote.discount_amount,
            total_amount: order.quote.total_amount,
            created_at: now,
            updated_at: now,
            items,
        };
        state.orders.push(placed.clone());

        let cart_ids: Vec<CartId> = state
            .carts
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| c.id)
            .collect();
        state.lines.retain(|l| !cart_ids.contains(&l.cart_id));

        Ok(placed)
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let state = self.state.lock().await;
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(orders)
    }

    async fn order_for_user(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .iter()
            .find(|o| o.id == order_id && o.user_id == user_id)
            .cloned())
    }

    async fn update_order_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut state = self.state.lock().await;
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or(RepositoryError::NotFound)?;
        if order.status != expected {
            return Err(RepositoryError::Conflict(format!(
                "order {order_id} is no longer {}",
                expected.label()
            )));
        }
        order.status = next;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn payment_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Payment>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .payments
            .iter()
            .find(|p| p.order_id == order_id)
            .cloned())
    }

    async fn payment_by_reference(
        &self,
        user_id: UserId,
        reference: &str,
    ) -> Result<Option<Payment>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .payments
            .iter()
            .find(|p| p.reference == reference && p.user_id == user_id)
            .cloned())
    }

    async fn payment_for_user(
        &self,
        user_id: UserId,
        payment_id: PaymentId,
    ) -> Result<Option<Payment>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .payments
            .iter()
            .find(|p| p.id == payment_id && p.user_id == user_id)
            .cloned())
    }

    async fn create_payment(&self, new: &NewPayment) -> Result<Payment, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.payments.iter().any(|p| p.order_id == new.order_id) {
            return Err(RepositoryError::Conflict(
                "payment for this order already exists".to_string(),
            ));
        }
        if state.payments.iter().any(|p| p.reference == new.reference) {
            return Err(RepositoryError::Conflict(
                "payment reference already exists".to_string(),
            ));
        }

        let id = PaymentId::new(state.next_id());
        let now = Utc::now();
        let payment = Payment {
            id,
            order_id: new.order_id,
            user_id: new.user_id,
            amount: new.amount,
            reference: new.reference.clone(),
            gateway_reference: None,
            status: TransactionStatus::Pending,
            payment_method: new.payment_method,
            currency: new.currency.code().to_string(),
            gateway_response: None,
            metadata: Payment::metadata_for(new.order_id, id),
            created_at: now,
            updated_at: now,
            paid_at: None,
        };
        state.payments.push(payment.clone());
        Ok(payment)
    }

    async fn delete_payment(&self, payment_id: PaymentId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state.payments.retain(|p| p.id != payment_id);
        state.refunds.retain(|r| r.payment_id != payment_id);
        Ok(())
    }

    async fn settle_payment(
        &self,
        payment_id: PaymentId,
        settlement: &PaymentSettlement,
    ) -> Result<Payment, RepositoryError> {
        let mut state = self.state.lock().await;
        let payment = state
            .payments
            .iter_mut()
            .find(|p| p.id == payment_id)
            .ok_or(RepositoryError::NotFound)?;
        payment.status = TransactionStatus::Success;
        payment.gateway_reference.clone_from(&settlement.gateway_reference);
        payment.gateway_response = Some(settlement.gateway_response.clone());
        payment.paid_at = Some(settlement.paid_at);
        payment.updated_at = Utc::now();
        let settled = payment.clone();

        if let Some(order) = state.orders.iter_mut().find(|o| o.id == settled.order_id) {
            order.payment_status = PaymentStatus::Paid;
            order.updated_at = settled.updated_at;
        }
        Ok(settled)
    }

    async fn refunded_total(&self, payment_id: PaymentId) -> Result<Decimal, RepositoryError> {
        Ok(self
            .state
            .lock()
            .await
            .refunds
            .iter()
            .filter(|r| {
                r.payment_id == payment_id
                    && matches!(r.status, TransactionStatus::Pending | TransactionStatus::Success)
            })
            .map(|r| r.amount)
            .sum())
    }

    async fn create_refund(&self, new: &NewRefund) -> Result<PaymentRefund, RepositoryError> {
        let mut state = self.state.lock().await;
        if !state.payments.iter().any(|p| p.id == new.payment_id) {
            return Err(RepositoryError::NotFound);
        }
        if state.refunds.iter().any(|r| r.reference == new.reference) {
            return Err(RepositoryError::Conflict(
                "refund reference already exists".to_string(),
            ));
        }
        let refund = PaymentRefund {
            id: RefundId::new(state.next_id()),
            payment_id: new.payment_id,
            amount: new.amount,
            reference: new.reference.clone(),
            gateway_reference: None,
            status: TransactionStatus::Pending,
            reason: new.reason.clone(),
            gateway_response: None,
            created_at: Utc::now(),
            processed_at: None,
        };
        state.refunds.push(refund.clone());
        Ok(refund)
    }

    async fn delete_refund(&self, refund_id: RefundId) -> Result<(), RepositoryError> {
        self.state
            .lock()
            .await
            .refunds
            .retain(|r| r.id != refund_id);
        Ok(())
    }

    async fn settle_refund(
        &self,
        refund_id: RefundId,
        settlement: &RefundSettlement,
    ) -> Result<PaymentRefund, RepositoryError> {
        let mut state = self.state.lock().await;
        let refund = state
            .refunds
            .iter_mut()
            .find(|r| r.id == refund_id)
            .ok_or(RepositoryError::NotFound)?;
        refund.status = TransactionStatus::Success;
        refund.gateway_reference.clone_from(&settlement.gateway_reference);
        refund.gateway_response = Some(settlement.gateway_response.clone());
        refund.processed_at = Some(settlement.processed_at);
        Ok(refund.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use luxuffy_core::PaymentMethod;
    use luxuffy_core::pricing::{CheckoutQuote, PricedItem};

    async fn seeded() -> (MemoryStore, Product, Product) {
        let store = MemoryStore::new();
        let tote = store
            .create_product(&NewProduct {
                category_id: None,
                name: "Ankara Tote".into(),
                description: String::new(),
                price: Decimal::new(1000, 2),
                stock_quantity: 5,
                is_active: true,
            })
            .await
            .unwrap();
        let scarf = store
            .create_product(&NewProduct {
                category_id: None,
                name: "Silk Scarf".into(),
                description: String::new(),
                price: Decimal::new(2500, 2),
                stock_quantity: 1,
                is_active: true,
            })
            .await
            .unwrap();
        (store, tote, scarf)
    }

    fn new_order(lines: &[(&Product, u32)]) -> NewOrder {
        let quote = CheckoutQuote::build(
            lines
                .iter()
                .map(|(p, q)| PricedItem {
                    product_id: p.id,
                    product_name: p.name.clone(),
                    unit_price: p.price,
                    quantity: *q,
                })
                .collect(),
        )
        .unwrap();
        NewOrder {
            shipping_address: "12 Allen Avenue, Ikeja".into(),
            billing_address: "12 Allen Avenue, Ikeja".into(),
            shipping_method: "standard".into(),
            payment_method: PaymentMethod::Card,
            quote,
        }
    }

    #[tokio::test]
    async fn test_duplicate_product_names_get_suffixed_slugs() {
        let (store, tote, _) = seeded().await;
        let again = store
            .create_product(&NewProduct {
                category_id: None,
                name: "Ankara  tote!".into(),
                description: String::new(),
                price: Decimal::ONE,
                stock_quantity: 0,
                is_active: true,
            })
            .await
            .unwrap();
        assert_eq!(tote.slug, "ankara-tote");
        assert_eq!(again.slug, "ankara-tote-2");
    }

    #[tokio::test]
    async fn test_place_order_is_all_or_nothing() {
        let (store, tote, scarf) = seeded().await;
        let user = store
            .upsert_user(&Email::parse("ada@example.ng").unwrap())
            .await
            .unwrap();
        let cart = store.get_or_create_cart(user.id).await.unwrap();
        store
            .upsert_cart_line(cart.id, &tote, 1, false, CartMergePolicy::Replace)
            .await
            .unwrap();

        let err = store
            .place_order(user.id, &new_order(&[(&tote, 2), (&scarf, 2)]))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InsufficientStock(id) if id == scarf.id));
        assert_eq!(store.stock_of(tote.id).await, Some(5));
        assert_eq!(store.cart_lines(cart.id).await.unwrap().len(), 1);
        assert!(store.orders_for_user(user.id).await.unwrap().is_empty());

        let order = store
            .place_order(user.id, &new_order(&[(&tote, 2), (&scarf, 1)]))
            .await
            .unwrap();
        assert_eq!(order.items.len(), 2);
        assert_eq!(store.stock_of(tote.id).await, Some(3));
        assert_eq!(store.stock_of(scarf.id).await, Some(0));
        assert!(store.cart_lines(cart.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_order_status_compare_and_set() {
        let (store, tote, _) = seeded().await;
        let user = store
            .upsert_user(&Email::parse("ada@example.ng").unwrap())
            .await
            .unwrap();
        let order = store
            .place_order(user.id, &new_order(&[(&tote, 1)]))
            .await
            .unwrap();

        store
            .update_order_status(order.id, OrderStatus::Pending, OrderStatus::Processing)
            .await
            .unwrap();
        let err = store
            .update_order_status(order.id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_one_payment_per_order() {
        let (store, tote, _) = seeded().await;
        let user = store
            .upsert_user(&Email::parse("ada@example.ng").unwrap())
            .await
            .unwrap();
        let order = store
            .place_order(user.id, &new_order(&[(&tote, 1)]))
            .await
            .unwrap();
        let new = NewPayment {
            order_id: order.id,
            user_id: user.id,
            amount: order.total_amount,
            reference: "ref-1".into(),
            payment_method: PaymentMethod::Card,
            currency: luxuffy_core::Currency::NGN,
        };
        let payment = store.create_payment(&new).await.unwrap();
        assert_eq!(payment.metadata["payment_id"], payment.id.as_i64());

        let again = NewPayment {
            reference: "ref-2".into(),
            ..new
        };
        assert!(matches!(
            store.create_payment(&again).await,
            Err(RepositoryError::Conflict(_))
        ));
    }
}
