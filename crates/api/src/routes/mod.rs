//! HTTP route handlers for the commerce API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                              - Liveness
//! GET    /health/ready                        - Store readiness
//!
//! # Catalog (public)
//! GET    /api/products/                       - Product listing (?category=&search=&page=&per_page=)
//! GET    /api/products/{slug}/                - Product detail
//! GET    /api/products/{slug}/availability/   - Stock view
//! GET    /api/categories/                     - Category listing
//! GET    /api/categories/{slug}/              - Category detail
//!
//! # Cart (requires auth)
//! GET    /api/cart/                           - Cart snapshot
//! POST   /api/cart/add/                       - Add or replace a line (201)
//! PUT    /api/cart/items/{id}/                - Update a line
//! DELETE /api/cart/items/{id}/remove/         - Remove a line (204)
//! POST   /api/cart/clear/                     - Remove every line (204)
//! POST   /api/cart/move-to-wishlist/          - Flag every line as wishlist
//!
//! # Orders (requires auth)
//! GET    /api/orders/                         - Order history
//! POST   /api/orders/create/                  - Checkout (201)
//! GET    /api/orders/{id}/                    - Order detail
//! POST   /api/orders/{id}/cancel/             - Cancel a pending or processing order
//!
//! # Payments (requires auth)
//! POST   /api/payments/initialize/            - Start a Paystack transaction
//! GET    /api/payments/verify/?reference=     - Verify a transaction
//! POST   /api/payments/refund/                - Request a refund
//! ```

mod cart;
mod catalog;
pub mod extract;
mod health;
mod orders;
mod payments;
pub mod response;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Public catalog routes.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/api/products/", get(catalog::list_products))
        .route("/api/products/{slug}/", get(catalog::product_detail))
        .route(
            "/api/products/{slug}/availability/",
            get(catalog::product_availability),
        )
        .route("/api/categories/", get(catalog::list_categories))
        .route("/api/categories/{slug}/", get(catalog::category_detail))
}

/// Cart routes.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/api/cart/", get(cart::show))
        .route("/api/cart/add/", post(cart::add_item))
        .route("/api/cart/items/{id}/", put(cart::update_item))
        .route("/api/cart/items/{id}/remove/", delete(cart::remove_item))
        .route("/api/cart/clear/", post(cart::clear))
        .route("/api/cart/move-to-wishlist/", post(cart::move_to_wishlist))
}

/// Order routes.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/api/orders/", get(orders::list))
        .route("/api/orders/create/", post(orders::create))
        .route("/api/orders/{id}/", get(orders::detail))
        .route("/api/orders/{id}/cancel/", post(orders::cancel))
}

/// Payment routes.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/api/payments/initialize/", post(payments::initialize))
        .route("/api/payments/verify/", get(payments::verify))
        .route("/api/payments/refund/", post(payments::refund))
}

/// All API routes, without state or layers.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(catalog_routes())
        .merge(cart_routes())
        .merge(order_routes())
        .merge(payment_routes())
}

/// CORS policy for the configured browser origins.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::HeaderName::from_static("x-request-id")])
}

/// The complete application: routes, state and middleware.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config().cors_origins);

    routes()
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(cors)
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
