//! Chaos toggle and gate, driven through the full server stack.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    middleware,
    routing::post,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use pizza_telemetry::chaos::chaos_gate;
use pizza_telemetry::{HttpServer, Telemetry};

mod common;
use common::{config_for, log_line, MockSink};

fn order_app(telemetry: &Telemetry) -> Router {
    Router::new()
        .route("/api/order", post(|| async { "{\"order\":{\"id\":1}}" }))
        .route_layer(middleware::from_fn_with_state(
            telemetry.chaos_state(),
            chaos_gate,
        ))
}

fn request(method: &str, uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap()
}

#[tokio::test]
async fn test_chaos_fails_orders_and_counts_once() {
    let sink = MockSink::start().await;
    let mut config = config_for(&sink);
    config.logging.enabled = false;
    config.metrics.enabled = false;
    config.chaos.failure_ratio = 1.0;

    let telemetry = Telemetry::from_config(config).unwrap();
    let app = HttpServer::new(telemetry.clone(), order_app(&telemetry)).router();

    let response = app
        .clone()
        .oneshot(request("POST", "/api/order", Some("Bearer diner")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request("PUT", "/api/order/chaos/true", Some("Bearer admin-key")))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!({ "chaos": true }));

    let response = app
        .clone()
        .oneshot(request("POST", "/api/order", Some("Bearer diner")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!({ "message": "Chaos monkey" }));
    assert_eq!(telemetry.aggregator().snapshot().creation_failures, 1);

    let response = app
        .clone()
        .oneshot(request("PUT", "/api/order/chaos/false", Some("Bearer admin-key")))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!({ "chaos": false }));

    let response = app
        .oneshot(request("POST", "/api/order", Some("Bearer diner")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(telemetry.aggregator().snapshot().creation_failures, 1);
}

#[tokio::test]
async fn test_toggle_requires_admin_key() {
    let sink = MockSink::start().await;
    let mut config = config_for(&sink);
    config.logging.enabled = false;
    config.metrics.enabled = false;

    let telemetry = Telemetry::from_config(config).unwrap();
    let app = HttpServer::new(telemetry.clone(), order_app(&telemetry)).router();

    let response = app
        .oneshot(request("PUT", "/api/order/chaos/true", Some("Bearer diner")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(!telemetry.chaos().is_enabled());
}

#[tokio::test]
async fn test_chaos_failure_reaches_error_log() {
    let mut sink = MockSink::start().await;
    let mut config = config_for(&sink);
    config.metrics.enabled = false;
    config.chaos.enabled = true;
    config.chaos.failure_ratio = 1.0;

    let telemetry = Telemetry::from_config(config).unwrap();
    let app = HttpServer::new(telemetry.clone(), order_app(&telemetry)).router();

    app.oneshot(request("POST", "/api/order", Some("Bearer diner")))
        .await
        .unwrap();

    let lines: Vec<Value> = sink.take(2).await.iter().map(log_line).collect();
    let error = lines
        .iter()
        .find(|l| l.get("message").is_some())
        .expect("error log");
    assert_eq!(error["message"], "Chaos monkey");
    assert_eq!(error["statusCode"], 500);
    assert!(lines.iter().any(|l| l["authorized"] == true));
}
