//! Integration tests for Sugarloaf.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process API tests (no database needed)
//! cargo test -p sugarloaf-integration-tests
//!
//! # Also exercise the PostgreSQL repositories
//! SUGARLOAF_TEST_DATABASE_URL=postgres://localhost/sugarloaf_test \
//!     cargo test -p sugarloaf-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_api` - Cart JSON API driven through the router with an in-memory store
//! - `products_api` - Product API and image normalization at the HTTP boundary
//! - `postgres_carts` - `PostgreSQL` repositories (skipped without a database URL)

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use sugarloaf_core::ImageNormalizer;
use sugarloaf_storefront::db::memory::MemoryStore;
use sugarloaf_storefront::models::CurrentUser;
use sugarloaf_storefront::routes;
use sugarloaf_storefront::state::AppState;
use tower::ServiceExt;

/// Placeholder URL used by the test catalog's normalizer.
pub const PLACEHOLDER_URL: &str = "https://cdn.test/placeholder.png";

/// A storefront API backed by an in-memory catalog and cart store.
pub struct TestApp {
    pub store: MemoryStore,
    state: AppState<MemoryStore, MemoryStore>,
}

/// Status and parsed JSON body of a response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    /// The `message` field of the body.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }
}

impl TestApp {
    /// Create an app with the standard test catalog:
    ///
    /// | id   | name               | price | stock | images               |
    /// |------|--------------------|-------|-------|----------------------|
    /// | `p1` | Gummy Bears        | 10.00 | 5     | legacy URL string    |
    /// | `p2` | Sour Worms         |  3.50 | 3     | `{full, thumb}`      |
    /// | `p3` | Sea Salt Caramels  |  8.00 | 0     | canonical record     |
    /// | `p4` | Mystery Bag        |  2.00 | 10    | none                 |
    pub async fn new() -> Self {
        let store = MemoryStore::new(ImageNormalizer::new(PLACEHOLDER_URL));

        store
            .put_product(
                "p1",
                "Gummy Bears",
                Decimal::new(1000, 2),
                5,
                json!(["https://cdn.test/gummy.jpg"]),
            )
            .await;
        store
            .put_product(
                "p2",
                "Sour Worms",
                Decimal::new(350, 2),
                3,
                json!([{ "full": "https://cdn.test/worms.jpg", "thumb": "https://cdn.test/worms-t.jpg" }]),
            )
            .await;
        store
            .put_product(
                "p3",
                "Sea Salt Caramels",
                Decimal::new(800, 2),
                0,
                json!([{
                    "publicId": "sweets/caramels",
                    "variants": {
                        "thumb": "https://cdn.test/caramels-150.jpg",
                        "original": "https://cdn.test/caramels.jpg"
                    },
                    "metadata": { "width": 1200, "height": 800 }
                }]),
            )
            .await;
        store
            .put_product("p4", "Mystery Bag", Decimal::new(200, 2), 10, Value::Null)
            .await;

        let state = AppState::new(store.clone(), store.clone());
        Self { store, state }
    }

    /// The API router with no authenticated user.
    #[must_use]
    pub fn anonymous(&self) -> Router {
        routes::router(self.state.clone())
    }

    /// The API router with `user_id` authenticated.
    #[must_use]
    pub fn as_user(&self, user_id: &str) -> Router {
        self.anonymous()
            .layer(axum::Extension(CurrentUser::new(user_id)))
    }

    /// Send one request as `user` (or anonymously) and parse the JSON response.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body is not JSON.
    pub async fn send(
        &self,
        user: Option<&str>,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> TestResponse {
        let router = match user {
            Some(id) => self.as_user(id),
            None => self.anonymous(),
        };

        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = router.oneshot(request).await.expect("Router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Response body is not JSON")
        };

        TestResponse { status, body }
    }

    /// `GET /api/cart` as `user`.
    pub async fn get_cart(&self, user: &str) -> TestResponse {
        self.send(Some(user), Method::GET, "/api/cart", None).await
    }

    /// `POST /api/cart/add` as `user`.
    pub async fn add(&self, user: &str, body: Value) -> TestResponse {
        self.send(Some(user), Method::POST, "/api/cart/add", Some(body))
            .await
    }

    /// `PUT /api/cart/update` as `user`.
    pub async fn update(&self, user: &str, body: Value) -> TestResponse {
        self.send(Some(user), Method::PUT, "/api/cart/update", Some(body))
            .await
    }

    /// `POST /api/cart/remove` as `user`.
    pub async fn remove(&self, user: &str, body: Value) -> TestResponse {
        self.send(Some(user), Method::POST, "/api/cart/remove", Some(body))
            .await
    }

    /// `POST /api/cart/clear` as `user`.
    pub async fn clear(&self, user: &str) -> TestResponse {
        self.send(Some(user), Method::POST, "/api/cart/clear", None)
            .await
    }
}
