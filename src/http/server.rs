//! HTTP server setup.
//!
//! # Responsibilities
//! - Merge the application routes with the health and chaos routes
//! - Wrap everything in the instrumentation hooks
//! - Wire up tower-http middleware (tracing, timeout, request ID)
//! - Run the host sampler alongside the server
//! - Drain in-flight emissions on shutdown

use std::time::Duration;

use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::http::telemetry::Telemetry;
use crate::lifecycle::Shutdown;

/// HTTP server for an instrumented application.
pub struct HttpServer {
    router: Router,
    telemetry: Telemetry,
}

impl HttpServer {
    /// `app` holds the application's own routes; they are served alongside
    /// `/api/health` and the chaos toggle.
    pub fn new(telemetry: Telemetry, app: Router) -> Self {
        let router = Self::build_router(&telemetry, app);
        Self { router, telemetry }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(telemetry: &Telemetry, app: Router) -> Router {
        let timeout = Duration::from_secs(telemetry.config().listener.request_timeout_secs);

        let routes = Router::new()
            .route("/api/health", get(health))
            .merge(telemetry.chaos_routes())
            .merge(app)
            .fallback(unknown_endpoint)
            .layer(TimeoutLayer::new(timeout));

        // Timeouts sit inside the hooks so a 408 is counted and logged.
        telemetry
            .instrument(routes)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// Serve until `shutdown` fires, then give pending emissions a bounded
    /// time to finish.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let sampler = self.telemetry.sampler().map(|sampler| {
            let rx = shutdown.subscribe();
            tokio::spawn(sampler.run(rx))
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");

        if let Some(handle) = sampler {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "System sampler task failed");
            }
        }

        let deadline = Duration::from_millis(self.telemetry.config().dispatch.drain_timeout_ms);
        if !self.telemetry.dispatcher().drain(deadline).await {
            tracing::warn!(
                pending = self.telemetry.dispatcher().in_flight(),
                "Abandoning undelivered telemetry"
            );
        }
        Ok(())
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn unknown_endpoint() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "unknown endpoint" })),
    )
}
