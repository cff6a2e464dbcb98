//! Business logic for the commerce API.
//!
//! # Services
//!
//! - `auth` - API tokens: issue, hash and resolve to a user
//! - `catalog` - Read-only product and category views, seeding
//! - `cart` - Cart ledger operations and the derived snapshot
//! - `orders` - Checkout, order history and cancellation
//! - `payments` - Paystack initialize, verify and refund
//!
//! Services borrow a [`CommerceStore`](crate::store::CommerceStore) and,
//! for payments, a [`PaymentGateway`](crate::paystack::PaymentGateway).
//! They never see HTTP types.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod payments;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::db::RepositoryError;

pub use auth::AuthService;
pub use cart::CartService;
pub use catalog::CatalogService;
pub use orders::{CreateOrder, OrderLineRequest, OrderService};
pub use payments::PaymentService;

/// Field name to the reasons it was rejected.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Errors surfaced by the services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was understood but breaks a business rule.
    #[error("{message}")]
    Validation { message: String, errors: FieldErrors },

    /// The resource does not exist or belongs to someone else.
    #[error("{0}")]
    NotFound(String),

    /// The payment gateway refused or could not be reached.
    #[error("{0}")]
    Gateway(String),

    /// Storage failed.
    #[error("store error: {0}")]
    Store(#[from] RepositoryError),
}

impl ServiceError {
    /// A validation failure with no per-field detail.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            errors: FieldErrors::new(),
        }
    }

    /// A validation failure pinned to one field.
    pub fn invalid_field(field: &str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let mut errors = FieldErrors::new();
        errors.insert(field.to_owned(), vec![reason.clone()]);
        Self::Validation {
            message: reason,
            errors,
        }
    }

    /// `"{what} not found"`.
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }
}

/// Accumulates field errors before failing once.
#[derive(Debug, Default)]
pub(crate) struct Violations(FieldErrors);

impl Violations {
    pub(crate) fn add(&mut self, field: &str, reason: impl Into<String>) {
        self.0.entry(field.to_owned()).or_default().push(reason.into());
    }

    pub(crate) fn check(self, message: &str) -> Result<(), ServiceError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation {
                message: message.to_owned(),
                errors: self.0,
            })
        }
    }
}
