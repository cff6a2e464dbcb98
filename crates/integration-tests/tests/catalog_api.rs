//! Integration tests for the public catalog and the service endpoints.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use luxuffy_integration_tests::TestApp;
use tower::ServiceExt;

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new().await;

    let live = app.send_as(None, Method::GET, "/health", None).await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.body, "ok");

    let ready = app.send_as(None, Method::GET, "/health/ready", None).await;
    assert_eq!(ready.status, StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let app = TestApp::new().await;

    let response = app.send_as(None, Method::GET, "/api/products/", None).await;
    let generated = response.headers["x-request-id"].to_str().expect("ascii id");
    assert_eq!(generated.len(), 36);

    let request = Request::builder()
        .uri("/api/products/")
        .header("x-request-id", "edge-7f3a")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "edge-7f3a");

    let request = Request::builder()
        .uri("/api/products/")
        .header("x-request-id", "not an id")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    let replaced = response.headers()["x-request-id"].to_str().expect("ascii id");
    assert_ne!(replaced, "not an id");
    assert_eq!(replaced.len(), 36);
}

#[tokio::test]
async fn test_cors_allows_configured_origin_only() {
    let app = TestApp::new().await;

    let preflight = |origin: &'static str| {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/cart/add/")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap()
    };

    let allowed = app
        .router
        .clone()
        .oneshot(preflight("http://localhost:3000"))
        .await
        .unwrap();
    assert_eq!(
        allowed.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );

    let refused = app
        .router
        .clone()
        .oneshot(preflight("https://elsewhere.example"))
        .await
        .unwrap();
    assert!(
        !refused
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
    );
}

// ============================================================================
// Products
// ============================================================================

#[tokio::test]
async fn test_product_listing_is_public_and_paged() {
    let app = TestApp::new().await;
    for name in ["Tote Bag", "Clutch", "Weekender"] {
        app.product(name, 1000, 5).await;
    }

    let response = app
        .send_as(None, Method::GET, "/api/products/?per_page=2", None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Products retrieved successfully");

    let page = response.data();
    assert_eq!(page["total"], 3);
    assert_eq!(page["per_page"], 2);
    assert_eq!(page["items"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_product_listing_filters_by_category_and_search() {
    let app = TestApp::new().await;
    let bags = app.category("Bags").await;
    app.product_in(Some(&bags), "Leather Tote", 4500, 3).await;
    app.product_in(Some(&bags), "Canvas Tote", 2000, 3).await;
    app.product("Silk Scarf", 1500, 3).await;

    let by_category = app.get("/api/products/?category=bags").await;
    assert_eq!(by_category.data()["total"], 2);

    let by_search = app.get("/api/products/?category=bags&search=leather").await;
    assert_eq!(by_search.data()["total"], 1);
    assert_eq!(by_search.data()["items"][0]["slug"], "leather-tote");
}

#[tokio::test]
async fn test_product_detail_and_availability() {
    let app = TestApp::new().await;
    app.product("Tote Bag", 1000, 4).await;

    let detail = app.get("/api/products/tote-bag/").await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.data()["name"], "Tote Bag");
    assert_eq!(detail.data()["price"], "10.00");

    let availability = app.get("/api/products/tote-bag/availability/").await;
    assert_eq!(availability.status, StatusCode::OK);
    assert_eq!(availability.data()["stock_quantity"], 4);
    assert_eq!(availability.data()["in_stock"], true);
}

#[tokio::test]
async fn test_unknown_product_is_404_envelope() {
    let app = TestApp::new().await;

    let response = app.get("/api/products/missing/").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["status_code"], 404);
    assert_eq!(response.body["message"], "Product not found");
    assert!(response.body["data"].is_null());
}

#[tokio::test]
async fn test_malformed_query_is_400_envelope() {
    let app = TestApp::new().await;

    let response = app.get("/api/products/?page=first").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Invalid request data");
    assert!(response.body["errors"]["query"].is_array());
}

// ============================================================================
// Categories
// ============================================================================

#[tokio::test]
async fn test_category_list_and_detail() {
    let app = TestApp::new().await;
    app.category("Bags").await;
    app.category("Jewellery").await;

    let list = app.get("/api/categories/").await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.data().as_array().map(Vec::len), Some(2));

    let detail = app.get("/api/categories/jewellery/").await;
    assert_eq!(detail.data()["name"], "Jewellery");

    let missing = app.get("/api/categories/shoes/").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["message"], "Category not found");
}
