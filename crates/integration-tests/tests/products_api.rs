//! Product API tests: every stored image shape comes back canonical.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{Method, StatusCode};
use serde_json::json;
use sugarloaf_integration_tests::{PLACEHOLDER_URL, TestApp};

#[tokio::test]
async fn test_legacy_string_image() {
    let app = TestApp::new().await;

    let response = app.send(None, Method::GET, "/api/products/p1", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["name"], "Gummy Bears");
    assert_eq!(response.body["price"], 10.0);
    assert_eq!(
        response.body["images"],
        json!([{ "variants": { "original": "https://cdn.test/gummy.jpg" } }])
    );
}

#[tokio::test]
async fn test_dual_resolution_image() {
    let app = TestApp::new().await;

    let response = app.send(None, Method::GET, "/api/products/p2", None).await;

    let variants = &response.body["images"][0]["variants"];
    assert_eq!(variants["original"], "https://cdn.test/worms.jpg");
    assert_eq!(variants["thumb"], "https://cdn.test/worms-t.jpg");
}

#[tokio::test]
async fn test_canonical_image_gets_default_aspect_ratio() {
    let app = TestApp::new().await;

    let response = app.send(None, Method::GET, "/api/products/p3", None).await;

    let image = &response.body["images"][0];
    assert_eq!(image["publicId"], "sweets/caramels");
    assert_eq!(image["metadata"]["width"], 1200);
    assert_eq!(image["metadata"]["aspectRatio"], 1.0);
}

#[tokio::test]
async fn test_missing_images_become_placeholder() {
    let app = TestApp::new().await;

    let response = app.send(None, Method::GET, "/api/products/p4", None).await;

    let images = response.body["images"].as_array().unwrap();
    assert_eq!(images.len(), 1);
    for slot in ["micro", "thumb", "small", "medium", "large", "original"] {
        assert_eq!(images[0]["variants"][slot], PLACEHOLDER_URL, "{slot}");
    }
}

#[tokio::test]
async fn test_unknown_product_is_404() {
    let app = TestApp::new().await;

    let response = app.send(None, Method::GET, "/api/products/nope", None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.message(), Some("Product not found"));
}
