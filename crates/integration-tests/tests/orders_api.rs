//! Integration tests for checkout and the order lifecycle.

use axum::http::StatusCode;
use luxuffy_core::ProductId;
use luxuffy_integration_tests::{TestApp, data_id, json};

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn test_create_order_reprices_decrements_stock_and_clears_cart() {
    let app = TestApp::new().await;
    let tote = app.product("Tote Bag", 1000, 5).await;
    app.add_to_cart(&tote, 1).await;

    let response = app.place_order(&[(&tote, 3)]).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["message"], "Order created successfully");

    let order = response.data();
    assert_eq!(order["status"], "pending");
    assert_eq!(order["payment_status"], "unpaid");
    assert_eq!(order["subtotal_amount"], "30.00");
    assert_eq!(order["total_amount"], "30.00");
    assert_eq!(order["billing_address"], order["shipping_address"]);
    assert_eq!(order["items"][0]["quantity"], 3);
    assert_eq!(order["items"][0]["total_price"], "30.00");

    assert_eq!(app.store.stock_of(tote.id).await, Some(2));
    assert_eq!(app.get("/api/cart/").await.data()["item_count"], 0);
}

#[tokio::test]
async fn test_create_order_validates_every_field() {
    let app = TestApp::new().await;

    let response = app
        .post(
            "/api/orders/create/",
            json!({ "items": [], "shipping_address": " ", "payment_method": "cheque" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Invalid order data");

    let errors = &response.body["errors"];
    assert!(errors["items"].is_array());
    assert!(errors["shipping_address"].is_array());
    assert!(errors["payment_method"].is_array());

    assert_eq!(app.get("/api/orders/").await.data(), &json!([]));
}

#[tokio::test]
async fn test_unknown_product_aborts_order_and_keeps_cart() {
    let app = TestApp::new().await;
    let tote = app.product("Tote Bag", 1000, 5).await;
    app.add_to_cart(&tote, 1).await;

    let ghost = luxuffy_api::models::Product {
        id: ProductId::new(999),
        ..tote.clone()
    };
    let response = app.place_order(&[(&tote, 1), (&ghost, 1)]).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["errors"]["items"].is_array());

    assert_eq!(app.store.stock_of(tote.id).await, Some(5));
    assert_eq!(app.get("/api/cart/").await.data()["item_count"], 1);
    assert_eq!(app.get("/api/orders/").await.data(), &json!([]));
}

#[tokio::test]
async fn test_insufficient_stock_leaves_stock_unchanged() {
    let app = TestApp::new().await;
    let tote = app.product("Tote Bag", 1000, 2).await;

    let response = app.place_order(&[(&tote, 3)]).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body["message"],
        format!("Insufficient stock for product {}.", tote.id)
    );
    assert_eq!(app.store.stock_of(tote.id).await, Some(2));
}

// ============================================================================
// History & detail
// ============================================================================

#[tokio::test]
async fn test_orders_are_private_to_their_owner() {
    let app = TestApp::new().await;
    let tote = app.product("Tote Bag", 1000, 5).await;
    let order_id = data_id(&app.place_order(&[(&tote, 1)]).await);

    let mine = app.get(&format!("/api/orders/{order_id}/")).await;
    assert_eq!(mine.status, StatusCode::OK);
    assert_eq!(mine.body["message"], "Order details retrieved successfully");

    let other = app.other_customer().await;
    let theirs = app
        .send_as(
            Some(&other),
            axum::http::Method::GET,
            &format!("/api/orders/{order_id}/"),
            None,
        )
        .await;
    assert_eq!(theirs.status, StatusCode::NOT_FOUND);
    assert_eq!(theirs.body["message"], "Order not found");
}

#[tokio::test]
async fn test_order_history_is_newest_first() {
    let app = TestApp::new().await;
    let tote = app.product("Tote Bag", 1000, 5).await;
    let first = data_id(&app.place_order(&[(&tote, 1)]).await);
    let second = data_id(&app.place_order(&[(&tote, 1)]).await);

    let list = app.get("/api/orders/").await;
    assert_eq!(list.body["message"], "Orders retrieved successfully");
    let ids: Vec<i64> = list
        .data()
        .as_array()
        .map(|orders| orders.iter().filter_map(|o| o["id"].as_i64()).collect())
        .unwrap_or_default();
    assert_eq!(ids, vec![second, first]);
}

#[tokio::test]
async fn test_non_numeric_order_id_is_400() {
    let app = TestApp::new().await;

    let response = app.get("/api/orders/latest/").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["errors"]["path"].is_array());
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancel_pending_order_once() {
    let app = TestApp::new().await;
    let tote = app.product("Tote Bag", 1000, 5).await;
    let order_id = data_id(&app.place_order(&[(&tote, 1)]).await);
    let uri = format!("/api/orders/{order_id}/cancel/");

    let cancelled = app.post(&uri, json!({})).await;
    assert_eq!(cancelled.status, StatusCode::OK);
    assert_eq!(cancelled.body["message"], "Order cancelled successfully");
    assert_eq!(cancelled.data()["status"], "cancelled");

    let again = app.post(&uri, json!({})).await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(again.body["message"], "Order cannot be cancelled");

    let detail = app.get(&format!("/api/orders/{order_id}/")).await;
    assert_eq!(detail.data()["status"], "cancelled");
}

#[tokio::test]
async fn test_cancel_unknown_order_is_404() {
    let app = TestApp::new().await;

    let response = app.post("/api/orders/42/cancel/", json!({})).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
