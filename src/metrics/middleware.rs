//! Request-lifecycle hook for the metrics aggregator.

use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

use crate::metrics::aggregator::MetricsAggregator;

/// Endpoint label for requests no route matched.
pub const UNMATCHED_ENDPOINT: &str = "unmatched";

/// Count the request at start, then record latency and push the request
/// metrics once the handler has produced its response.
///
/// The endpoint label is the matched route template (`/api/franchise/{id}`).
/// Every unmatched request shares [`UNMATCHED_ENDPOINT`], so arbitrary paths
/// never become new label values.
pub async fn track_requests(
    State(aggregator): State<Arc<MetricsAggregator>>,
    request: Request,
    next: Next,
) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str())
        .unwrap_or(UNMATCHED_ENDPOINT)
        .to_string();

    let ticket = aggregator.begin_request(request.method().as_str(), &endpoint);
    let response = next.run(request).await;
    aggregator.finish_request(ticket, response.status().as_u16());

    response
}
