//! Integration tests for the cart endpoints.

use axum::http::{Method, StatusCode};
use luxuffy_integration_tests::{TestApp, json};
use rust_decimal::Decimal;

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_cart_requires_token() {
    let app = TestApp::new().await;

    let missing = app.send_as(None, Method::GET, "/api/cart/", None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        missing.body["message"],
        "Authentication credentials were not provided."
    );

    let invalid = app
        .send_as(Some("not-a-token"), Method::GET, "/api/cart/", None)
        .await;
    assert_eq!(invalid.status, StatusCode::UNAUTHORIZED);
    assert_eq!(invalid.body["message"], "Invalid token.");
}

// ============================================================================
// Adding & updating
// ============================================================================

#[tokio::test]
async fn test_add_item_returns_201_with_totals() {
    let app = TestApp::new().await;
    let tote = app.product("Tote Bag", 1000, 10).await;

    let response = app.add_to_cart(&tote, 3).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["message"], "Item added to cart successfully");

    let cart = response.data();
    assert_eq!(cart["item_count"], 1);
    assert_eq!(cart["items"][0]["quantity"], 3);
    assert_eq!(cart["items"][0]["total_price"], "30.00");
    assert_eq!(cart["total_amount"], "30.00");
}

#[tokio::test]
async fn test_adding_same_product_replaces_quantity() {
    let app = TestApp::new().await;
    let tote = app.product("Tote Bag", 1000, 10).await;

    app.add_to_cart(&tote, 2).await;
    let response = app.add_to_cart(&tote, 5).await;

    let cart = response.data();
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(cart["items"][0]["quantity"], 5);
    assert_eq!(cart["total_amount"], "50.00");
}

#[tokio::test]
async fn test_add_rejects_bad_quantity_and_unknown_product() {
    let app = TestApp::new().await;
    let tote = app.product("Tote Bag", 1000, 10).await;

    let zero = app.add_to_cart(&tote, 0).await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);
    assert_eq!(zero.body["message"], "Invalid quantity");
    assert!(zero.body["errors"]["quantity"].is_array());

    let huge = app.add_to_cart(&tote, 3_000_000_000).await;
    assert_eq!(huge.status, StatusCode::BAD_REQUEST);
    assert_eq!(huge.body["message"], "Invalid quantity");

    let unknown = app
        .post("/api/cart/add/", json!({ "product_id": 999, "quantity": 1 }))
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.body["message"], "Product not found");
}

#[tokio::test]
async fn test_malformed_body_is_400_envelope() {
    let app = TestApp::new().await;

    let response = app.post("/api/cart/add/", json!({ "quantity": 1 })).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Invalid request data");
    assert!(response.body["errors"]["body"].is_array());
}

#[tokio::test]
async fn test_update_item_quantity_and_wishlist_flag() {
    let app = TestApp::new().await;
    let tote = app.product("Tote Bag", 1000, 10).await;
    let added = app.add_to_cart(&tote, 1).await;
    let item_id = &added.data()["items"][0]["id"];

    let response = app
        .send(
            Method::PUT,
            &format!("/api/cart/items/{item_id}/"),
            Some(json!({ "quantity": 4, "is_wishlist_item": true })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Cart item updated successfully");
    assert_eq!(response.data()["items"][0]["quantity"], 4);
    assert_eq!(response.data()["items"][0]["is_wishlist_item"], true);
    assert_eq!(response.data()["total_amount"], "40.00");
}

#[tokio::test]
async fn test_update_foreign_item_is_404() {
    let app = TestApp::new().await;
    let tote = app.product("Tote Bag", 1000, 10).await;
    let added = app.add_to_cart(&tote, 1).await;
    let item_id = &added.data()["items"][0]["id"];

    let other = app.other_customer().await;
    let response = app
        .send_as(
            Some(&other),
            Method::PUT,
            &format!("/api/cart/items/{item_id}/"),
            Some(json!({ "quantity": 2 })),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["message"], "Cart item not found");
}

// ============================================================================
// Removing & clearing
// ============================================================================

#[tokio::test]
async fn test_remove_item_returns_204_then_404() {
    let app = TestApp::new().await;
    let tote = app.product("Tote Bag", 1000, 10).await;
    let added = app.add_to_cart(&tote, 1).await;
    let uri = format!("/api/cart/items/{}/remove/", added.data()["items"][0]["id"]);

    let removed = app.send(Method::DELETE, &uri, None).await;
    assert_eq!(removed.status, StatusCode::NO_CONTENT);
    assert!(removed.body.is_null());

    let again = app.send(Method::DELETE, &uri, None).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);

    let cart = app.get("/api/cart/").await;
    assert_eq!(cart.data()["item_count"], 0);
    let total: Option<Decimal> = cart.data()["total_amount"]
        .as_str()
        .and_then(|s| s.parse().ok());
    assert_eq!(total, Some(Decimal::ZERO));
}

#[tokio::test]
async fn test_clear_is_idempotent() {
    let app = TestApp::new().await;
    let tote = app.product("Tote Bag", 1000, 10).await;
    let scarf = app.product("Silk Scarf", 1500, 10).await;
    app.add_to_cart(&tote, 1).await;
    app.add_to_cart(&scarf, 2).await;

    let cleared = app.post("/api/cart/clear/", json!({})).await;
    assert_eq!(cleared.status, StatusCode::NO_CONTENT);

    let again = app.post("/api/cart/clear/", json!({})).await;
    assert_eq!(again.status, StatusCode::NO_CONTENT);

    assert_eq!(app.get("/api/cart/").await.data()["item_count"], 0);
}

#[tokio::test]
async fn test_move_to_wishlist_keeps_lines() {
    let app = TestApp::new().await;
    let tote = app.product("Tote Bag", 1000, 10).await;
    let scarf = app.product("Silk Scarf", 1500, 10).await;
    app.add_to_cart(&tote, 1).await;
    app.add_to_cart(&scarf, 1).await;

    let response = app.post("/api/cart/move-to-wishlist/", json!({})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["message"],
        "All items moved to wishlist successfully"
    );

    let items = response.data()["items"].as_array().cloned().unwrap_or_default();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| item["is_wishlist_item"] == true));
    assert_eq!(response.data()["total_amount"], "25.00");
}
