//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::paystack::PaymentGateway;
use crate::services::{
    AuthService, CartService, CatalogService, OrderService, PaymentService,
};
use crate::store::CommerceStore;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The store and gateway are trait objects so
/// the same router runs against Postgres and Paystack in production and
/// against in-memory fakes in tests.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    store: Arc<dyn CommerceStore>,
    gateway: Arc<dyn PaymentGateway>,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: ApiConfig,
        store: Arc<dyn CommerceStore>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                gateway,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &dyn CommerceStore {
        self.inner.store.as_ref()
    }

    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.store())
    }

    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(self.store())
    }

    #[must_use]
    pub fn carts(&self) -> CartService<'_> {
        CartService::new(self.store())
    }

    #[must_use]
    pub fn orders(&self) -> OrderService<'_> {
        OrderService::new(self.store())
    }

    #[must_use]
    pub fn payments(&self) -> PaymentService<'_> {
        let config = self.config();
        PaymentService::new(self.store(), self.inner.gateway.as_ref(), config.currency)
            .with_callback_url(config.paystack.callback_url.as_deref())
    }
}
