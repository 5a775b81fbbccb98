//! Chaos testing for the order pipeline.
//!
//! # Data Flow
//! ```text
//! PUT /api/order/chaos/{state}  (admin bearer key)
//!     → ChaosMonkey::set_enabled
//!
//! POST /api/order
//!     → chaos_gate
//!     → [tripped] creation failure recorded → 500 "Chaos monkey"
//!     → [passed]  order handler
//! ```

pub mod monkey;

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::put,
    Json, Router,
};
use serde_json::{json, Value};

use crate::config::AdminConfig;
use crate::http::auth::require_admin;
use crate::http::error::ApiError;
use crate::metrics::MetricsAggregator;

pub use monkey::ChaosMonkey;

/// State for [`chaos_gate`].
#[derive(Clone)]
pub struct ChaosState {
    pub monkey: Arc<ChaosMonkey>,
    pub aggregator: Arc<MetricsAggregator>,
}

/// Fail the wrapped route with a 500 when chaos trips, counting it as a failed
/// order creation.
pub async fn chaos_gate(
    State(state): State<ChaosState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state.monkey.should_fail() {
        state.aggregator.record_creation_failure();
        return Err(ApiError::internal("Chaos monkey"));
    }
    Ok(next.run(request).await)
}

async fn set_chaos(
    State(monkey): State<Arc<ChaosMonkey>>,
    Path(state): Path<String>,
) -> Json<Value> {
    let enabled = state == "true";
    monkey.set_enabled(enabled);
    Json(json!({ "chaos": enabled }))
}

/// The admin toggle route. Anything other than `true` disables chaos.
pub fn routes(monkey: Arc<ChaosMonkey>, admin: Arc<AdminConfig>) -> Router {
    Router::new()
        .route("/api/order/chaos/{state}", put(set_chaos))
        .route_layer(middleware::from_fn_with_state(admin, require_admin))
        .with_state(monkey)
}
