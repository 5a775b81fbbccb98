//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    Router,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use pizza_telemetry::config::TelemetryConfig;

/// One push received by the mock sink.
#[derive(Debug)]
pub struct Captured {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Value,
}

impl Captured {
    pub fn authorization(&self) -> Option<&str> {
        self.headers.get("authorization").and_then(|v| v.to_str().ok())
    }
}

#[derive(Clone)]
struct SinkState {
    tx: mpsc::UnboundedSender<Captured>,
    status: Arc<AtomicU16>,
}

/// A programmable log/metrics sink on an ephemeral port.
pub struct MockSink {
    pub addr: SocketAddr,
    rx: mpsc::UnboundedReceiver<Captured>,
    status: Arc<AtomicU16>,
}

async fn capture(
    State(state): State<SinkState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let _ = state.tx.send(Captured {
        method,
        path: uri.path().to_string(),
        headers,
        body,
    });
    StatusCode::from_u16(state.status.load(Ordering::SeqCst)).unwrap_or(StatusCode::OK)
}

impl MockSink {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let status = Arc::new(AtomicU16::new(204));

        let app = Router::new().fallback(capture).with_state(SinkState {
            tx,
            status: status.clone(),
        });
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, rx, status }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Status code returned to every subsequent push.
    pub fn respond_with(&self, status: u16) {
        self.status.store(status, Ordering::SeqCst);
    }

    /// Wait for the next push.
    pub async fn next(&mut self) -> Captured {
        tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
            .await
            .expect("timed out waiting for a push")
            .expect("sink closed")
    }

    /// Wait for `n` pushes, in arrival order.
    pub async fn take(&mut self, n: usize) -> Vec<Captured> {
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.next().await);
        }
        out
    }

    /// Assert nothing arrives for `window`.
    pub async fn assert_quiet(&mut self, window: Duration) {
        if let Ok(Some(c)) = tokio::time::timeout(window, self.rx.recv()).await {
            panic!("unexpected push to {}: {}", c.path, c.body);
        }
    }
}

/// Defaults with both sinks pointed at `sink`.
pub fn config_for(sink: &MockSink) -> TelemetryConfig {
    let mut config = TelemetryConfig::default();
    config.logging.enabled = true;
    config.logging.url = sink.url("/loki/api/v1/push");
    config.logging.user_id = "1001".into();
    config.logging.api_key = "log-key".into();
    config.metrics.enabled = true;
    config.metrics.url = sink.url("/otlp/v1/metrics");
    config.metrics.user_id = "2002".into();
    config.metrics.api_key = "metrics-key".into();
    config.admin.api_key = "admin-key".into();
    config
}

/// The sanitized line carried by a log push.
pub fn log_line(push: &Captured) -> Value {
    let line = push.body["streams"][0]["values"][0][1]
        .as_str()
        .expect("log line is a string");
    serde_json::from_str(line).expect("log line is JSON")
}
