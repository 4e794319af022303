//! The wizard driven over a real socket with a cookie-carrying client.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use lookout_integration_tests::{TIMEOUT, standard_shop};
use lookout_storefront::state::AppState;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tower_sessions::{MemoryStore, SessionManagerLayer};

struct TestServer {
    base: String,
    client: reqwest::Client,
}

impl TestServer {
    async fn start() -> Self {
        let state = AppState::new(
            Arc::new(standard_shop()),
            TIMEOUT,
            Duration::from_secs(600),
            None,
        );
        let sessions = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);
        let app = lookout_storefront::app(state, sessions);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::builder()
                .cookie_store(true)
                .build()
                .unwrap(),
        }
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let response = self
            .client
            .get(format!("{}{path}", self.base))
            .send()
            .await
            .unwrap();
        (response.status(), response.json().await.unwrap_or(Value::Null))
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let response = self
            .client
            .post(format!("{}{path}", self.base))
            .json(&body)
            .send()
            .await
            .unwrap();
        (response.status(), response.json().await.unwrap_or(Value::Null))
    }

    /// Poll until background lookups have landed.
    async fn settled_view(&self) -> Value {
        for _ in 0..100 {
            let (_, view) = self.get("/wizard").await;
            if view["loading"] == false && view["pending"].as_array().is_some_and(Vec::is_empty) {
                return view;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("wizard did not settle");
    }
}

#[tokio::test]
async fn test_order_over_http() {
    let server = TestServer::start().await;

    let (status, view) = server.get("/wizard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["step"], "category-select");
    assert_eq!(view["position"], 1);

    server
        .post("/wizard/category", json!({ "camera_type": "industrial" }))
        .await;
    server
        .post("/wizard/tier", json!({ "camera_level": "high" }))
        .await;
    let view = server.settled_view().await;
    assert_eq!(view["step"], "product-select");
    assert_eq!(view["products"][0]["name"], "Overwatch");

    let (status, view) = server
        .post(
            "/wizard/product",
            json!({
                "product_id": "gid://shopify/Product/4",
                "options": ["Graphite", "8K", "PoE"],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["step"], "addon-select");

    let view = server.settled_view().await;
    assert_eq!(view["products"].as_array().unwrap().len(), 2);

    let (status, view) = server.post("/wizard/advance", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["step"], "order-summary");
    assert_eq!(view["summary"]["items"][0]["quantity"], 1);
    assert_eq!(view["can_checkout"], true);

    let (status, body) = server.post("/wizard/checkout", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let url = body["checkout_url"].as_str().unwrap().to_string();
    assert!(url.starts_with("https://lookout-cameras.myshopify.com/cart/c/"));

    // Handoff page breaks out of any embedding frame
    let page = server
        .client
        .get(format!("{}/wizard/checkout", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(page.status(), StatusCode::OK);
    let html = page.text().await.unwrap();
    assert!(html.contains("window.top.location.href"));
    assert!(html.contains("id=\"checkout-link\""));
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let first = TestServer::start().await;
    first
        .post("/wizard/category", json!({ "camera_type": "rural" }))
        .await;

    let other = reqwest::Client::new();
    let view: Value = other
        .get(format!("{}/wizard", first.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["step"], "category-select");

    let (_, view) = first.get("/wizard").await;
    assert_eq!(view["step"], "tier-select");
}

#[tokio::test]
async fn test_out_of_order_gesture_is_conflict() {
    let server = TestServer::start().await;
    let (status, body) = server.post("/wizard/advance", json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (status, _) = server.post("/wizard/retreat", json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_notice_is_not_found() {
    let server = TestServer::start().await;
    let (status, _) = server
        .post("/wizard/notices/dismiss", json!({ "notice_id": 42 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = TestServer::start().await;
    let response = server
        .client
        .get(format!("{}/health", server.base))
        .header("x-request-id", "upstream-7")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "upstream-7"
    );
}
