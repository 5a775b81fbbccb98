//! End-to-end tests for HTTP log shipping.

use std::time::Duration;

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{Request, StatusCode},
    routing::{get, put},
    Json, Router,
};
use futures_util::{stream, StreamExt};
use serde_json::{json, Value};
use tower::ServiceExt;

use pizza_telemetry::config::TelemetryConfig;
use pizza_telemetry::http::ApiError;
use pizza_telemetry::{HttpServer, Telemetry};

mod common;
use common::{config_for, log_line, MockSink};

fn app() -> Router {
    Router::new()
        .route(
            "/api/auth",
            put(|Json(body): Json<Value>| async move {
                Json(json!({ "user": { "email": body["email"] }, "token": "tttttt" }))
            }),
        )
        .route(
            "/api/franchise/{id}",
            get(|| async { Err::<String, _>(ApiError::new(403, "unable to get franchise")) }),
        )
        .route("/api/boom", get(boom))
        .route("/api/events", get(events))
        .route("/api/broken", get(broken))
        .route("/api/slow", get(slow))
}

async fn boom() -> &'static str {
    panic!("boom")
}

/// One chunk, then a stream that never ends.
async fn events() -> Body {
    let first = stream::once(async { Ok::<_, std::io::Error>(Bytes::from_static(b"first")) });
    Body::from_stream(first.chain(stream::pending()))
}

async fn broken() -> Body {
    Body::from_stream(stream::iter(vec![
        Ok(Bytes::from_static(b"{\"partial\":")),
        Err(std::io::Error::other("upstream reset")),
    ]))
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(3)).await;
    "late"
}

fn server(sink: &MockSink) -> Router {
    server_with(sink, |_| {})
}

fn server_with(sink: &MockSink, tweak: impl FnOnce(&mut TelemetryConfig)) -> Router {
    let mut config = config_for(sink);
    config.metrics.enabled = false;
    tweak(&mut config);
    HttpServer::new(Telemetry::from_config(config).unwrap(), app()).router()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap()
}

#[tokio::test]
async fn test_authorized_request_is_logged_and_response_untouched() {
    let mut sink = MockSink::start().await;
    let app = server(&sink);

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/auth")
                .header("content-type", "application/json")
                .header("authorization", "Bearer abc.def")
                .body(Body::from(r#"{"email":"d@jwt.com","password":"diner"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "user": { "email": "d@jwt.com" }, "token": "tttttt" })
    );

    let push = sink.next().await;
    assert_eq!(push.method, "POST");
    assert_eq!(push.path, "/loki/api/v1/push");
    assert_eq!(push.authorization(), Some("Bearer 1001:log-key"));
    assert_eq!(
        push.body["streams"][0]["stream"],
        json!({ "component": "jwt-pizza-service", "level": "info", "type": "http" })
    );

    let line = log_line(&push);
    assert_eq!(line["authorized"], true);
    assert_eq!(line["path"], "/api/auth");
    assert_eq!(line["method"], "PUT");
    assert_eq!(line["statusCode"], 200);

    let req: Value = serde_json::from_str(line["reqBody"].as_str().unwrap()).unwrap();
    assert_eq!(req, json!({ "email": "d@jwt.com", "password": "*****" }));
    let res: Value = serde_json::from_str(line["resBody"].as_str().unwrap()).unwrap();
    assert_eq!(res["token"], "tttttt");
}

#[tokio::test]
async fn test_password_never_leaves_the_process() {
    let mut sink = MockSink::start().await;
    let app = server(&sink);

    app.oneshot(
        Request::builder()
            .method("PUT")
            .uri("/api/auth")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"email":"a@jwt.com","password":"hunter2","nested":{"Password":"hunter2"}}"#,
            ))
            .unwrap(),
    )
    .await
    .unwrap();

    let push = sink.next().await;
    assert!(!push.body.to_string().contains("hunter2"));
    assert_eq!(log_line(&push)["authorized"], false);
}

#[tokio::test]
async fn test_unknown_endpoint_logs_warn_with_empty_request_body() {
    let mut sink = MockSink::start().await;
    let app = server(&sink);

    let response = app
        .oneshot(Request::builder().uri("/api/nope?x=1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    drop(response);

    let push = sink.next().await;
    assert_eq!(push.body["streams"][0]["stream"]["level"], "warn");
    let line = log_line(&push);
    assert_eq!(line["path"], "/api/nope?x=1");
    assert_eq!(line["reqBody"], "{}");
}

#[tokio::test]
async fn test_api_error_is_logged_twice() {
    let mut sink = MockSink::start().await;
    let app = server(&sink);

    let response = app
        .oneshot(Request::builder().uri("/api/franchise/7").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(response).await,
        json!({ "message": "unable to get franchise" })
    );

    let pushes = sink.take(2).await;
    let lines: Vec<Value> = pushes.iter().map(log_line).collect();

    let error = lines
        .iter()
        .find(|l| l.get("message").is_some())
        .expect("error log");
    assert_eq!(error["statusCode"], 403);
    assert_eq!(error["message"], "unable to get franchise");
    assert_eq!(error["path"], "/api/franchise/7");

    let http = lines.iter().find(|l| l.get("reqBody").is_some()).expect("http log");
    assert_eq!(http["statusCode"], 403);

    assert!(pushes
        .iter()
        .any(|p| p.body["streams"][0]["stream"]["level"] == "error"));
    sink.assert_quiet(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_panic_becomes_logged_500() {
    let mut sink = MockSink::start().await;
    let app = server(&sink);

    let response = app
        .oneshot(Request::builder().uri("/api/boom").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!({ "message": "boom" }));

    let lines: Vec<Value> = sink.take(2).await.iter().map(log_line).collect();
    assert!(lines.iter().any(|l| l["message"] == "boom" && l["statusCode"] == 500));
}

#[tokio::test]
async fn test_failing_sink_does_not_affect_response() {
    let mut sink = MockSink::start().await;
    sink.respond_with(500);
    let app = server(&sink);

    let response = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
    sink.next().await;
}

#[tokio::test]
async fn test_disabled_logging_sends_nothing() {
    let mut sink = MockSink::start().await;
    let mut config = config_for(&sink);
    config.logging.enabled = false;
    config.metrics.enabled = false;
    let app = HttpServer::new(Telemetry::from_config(config).unwrap(), app()).router();

    let response = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    sink.assert_quiet(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_streamed_response_is_not_held_back() {
    let mut sink = MockSink::start().await;
    let app = server(&sink);

    let response = tokio::time::timeout(
        Duration::from_secs(1),
        app.oneshot(Request::builder().uri("/api/events").body(Body::empty()).unwrap()),
    )
    .await
    .expect("headers before the body ends")
    .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut body = response.into_body().into_data_stream();
    let chunk = tokio::time::timeout(Duration::from_secs(1), body.next())
        .await
        .expect("first chunk delivered")
        .unwrap()
        .unwrap();
    assert_eq!(&chunk[..], b"first");
    sink.assert_quiet(Duration::from_millis(100)).await;

    // Client goes away mid-stream.
    drop(body);
    let line = log_line(&sink.next().await);
    assert_eq!(line["path"], "/api/events");
    assert_eq!(line["statusCode"], 200);
    assert_eq!(line["resBody"], "\"first\"");
}

#[tokio::test]
async fn test_oversized_request_reaches_handler_and_is_logged_as_truncated() {
    let mut sink = MockSink::start().await;
    let app = server_with(&sink, |config| config.listener.max_body_bytes = 16);

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/auth")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"email":"d@jwt.com","password":"correct horse battery"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["user"]["email"], "d@jwt.com");

    let push = sink.next().await;
    assert!(!push.body.to_string().contains("correct horse"));
    let line = log_line(&push);
    assert_eq!(line["statusCode"], 200);
    let req: Value = serde_json::from_str(line["reqBody"].as_str().unwrap()).unwrap();
    assert_eq!(req["truncated"], true);
    assert_eq!(req["bytes"], 56);
}

#[tokio::test]
async fn test_failed_response_body_is_still_logged() {
    let mut sink = MockSink::start().await;
    let app = server(&sink);

    let response = app
        .oneshot(Request::builder().uri("/api/broken").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(to_bytes(response.into_body(), usize::MAX).await.is_err());

    let line = log_line(&sink.next().await);
    assert_eq!(line["path"], "/api/broken");
    assert_eq!(line["statusCode"], 200);
    let res: Value = serde_json::from_str(line["resBody"].as_str().unwrap()).unwrap();
    assert_eq!(res["truncated"], true);
}

#[tokio::test]
async fn test_timed_out_request_is_logged() {
    let mut sink = MockSink::start().await;
    let app = server_with(&sink, |config| config.listener.request_timeout_secs = 1);

    let response = app
        .oneshot(Request::builder().uri("/api/slow").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    drop(response);

    let push = sink.next().await;
    assert_eq!(push.body["streams"][0]["stream"]["level"], "warn");
    let line = log_line(&push);
    assert_eq!(line["path"], "/api/slow");
    assert_eq!(line["statusCode"], 408);
}
