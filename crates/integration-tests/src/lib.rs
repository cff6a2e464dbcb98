//! Integration tests for the Luxuffy API.
//!
//! Every test drives the real router with `tower::ServiceExt::oneshot`
//! against a [`MemoryStore`] and a [`ScriptedGateway`], so no database or
//! network is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p luxuffy-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use luxuffy_api::config::{ApiConfig, PaystackConfig};
use luxuffy_api::models::{Category, NewCategory, NewProduct, Product};
use luxuffy_api::paystack::testing::ScriptedGateway;
use luxuffy_api::routes;
use luxuffy_api::services::AuthService;
use luxuffy_api::state::AppState;
use luxuffy_api::store::{CommerceStore, MemoryStore};
use luxuffy_core::Currency;

pub use serde_json::json;

/// A response with its status, headers and decoded JSON body. Empty bodies
/// decode to `Value::Null`.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The envelope's `data` field.
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

/// The router wired to in-memory fakes, with one signed-in customer.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<ScriptedGateway>,
    /// Bearer token of the default customer.
    pub token: String,
}

/// Configuration that never touches the environment.
#[must_use]
pub fn test_config() -> ApiConfig {
    ApiConfig {
        database_url: SecretString::from("postgres://localhost/luxuffy_test"),
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://localhost:8000".to_string(),
        currency: Currency::NGN,
        cors_origins: vec!["http://localhost:3000".to_string()],
        paystack: PaystackConfig {
            secret_key: SecretString::from("sk_test_4f9c2a7be13d08e6a5b9c1f2d7e4038a6b5c9d1e"),
            base_url: "http://127.0.0.1:9".to_string(),
            callback_url: Some("http://localhost:3000/checkout/complete".to_string()),
            timeout: Duration::from_secs(1),
            max_retries: 0,
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_traces_sample_rate: 0.0,
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let gateway = Arc::new(ScriptedGateway::new());
        let state = AppState::new(test_config(), store.clone(), gateway.clone());
        let token = Self::issue_token(&store, "ada@example.com").await;

        Self {
            router: routes::app(state),
            store,
            gateway,
            token,
        }
    }

    async fn issue_token(store: &MemoryStore, email: &str) -> String {
        let (_, token) = AuthService::new(store).issue_token(email).await.unwrap();
        token
    }

    /// A token for another customer.
    pub async fn other_customer(&self) -> String {
        Self::issue_token(&self.store, "bayo@example.com").await
    }

    pub async fn category(&self, name: &str) -> Category {
        self.store
            .create_category(&NewCategory {
                name: name.to_owned(),
                description: None,
                parent_id: None,
            })
            .await
            .unwrap()
    }

    /// An active product. The price is given in hundredths, so
    /// `product("Tote", 1000, 5)` costs 10.00 with five in stock.
    pub async fn product(&self, name: &str, cents: i64, stock: u32) -> Product {
        self.product_in(None, name, cents, stock).await
    }

    pub async fn product_in(
        &self,
        category: Option<&Category>,
        name: &str,
        cents: i64,
        stock: u32,
    ) -> Product {
        self.store
            .create_product(&NewProduct {
                category_id: category.map(|c| c.id),
                name: name.to_owned(),
                description: format!("{name} description"),
                price: Decimal::new(cents, 2),
                stock_quantity: stock,
                is_active: true,
            })
            .await
            .unwrap()
    }

    /// Send a request as the default customer.
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        self.send_as(Some(&self.token), method, uri, body).await
    }

    /// Send a request with an explicit token, or none.
    pub async fn send_as(
        &self,
        token: Option<&str>,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        // Plain-text bodies (the health checks) come back as a JSON string.
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    /// Add `quantity` of a product to the default customer's cart.
    pub async fn add_to_cart(&self, product: &Product, quantity: i64) -> TestResponse {
        self.post(
            "/api/cart/add/",
            json!({ "product_id": product.id, "quantity": quantity }),
        )
        .await
    }

    /// Place an order for the given `(product, quantity)` pairs and return
    /// the response.
    pub async fn place_order(&self, lines: &[(&Product, i64)]) -> TestResponse {
        let items: Vec<Value> = lines
            .iter()
            .map(|(product, quantity)| json!({ "product_id": product.id, "quantity": quantity }))
            .collect();
        self.post(
            "/api/orders/create/",
            json!({
                "items": items,
                "shipping_address": "12 Admiralty Way, Lekki, Lagos",
                "payment_method": "card"
            }),
        )
        .await
    }
}

/// The `id` of an envelope's `data`, as `i64`.
#[must_use]
pub fn data_id(response: &TestResponse) -> i64 {
    response.data()["id"].as_i64().unwrap()
}
