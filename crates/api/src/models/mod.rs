//! Domain models for the commerce API.
//!
//! These are validated domain objects. Database rows are mapped into them by
//! the repositories in [`crate::db`]; the in-memory store builds them directly.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod payment;
pub mod user;

pub use cart::{Cart, CartItemView, CartLine, CartSnapshot};
pub use catalog::{
    Category, NewCategory, NewProduct, Page, Product, ProductAvailability, ProductFilter,
};
pub use order::{NewOrder, Order, OrderItem};
pub use payment::{
    NewPayment, NewRefund, Payment, PaymentInitialization, PaymentRefund, PaymentSettlement,
    RefundReceipt, RefundSettlement,
};
pub use user::User;
