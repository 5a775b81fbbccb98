//! Request-lifecycle hooks for the log shipper.

use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::http::error::UnhandledError;
use crate::logging::capture::{capture_request, tee_response};
use crate::logging::event::{ErrorLogData, HttpLogData, LogLevel};
use crate::logging::shipper::LogShipper;

/// Path plus query as the client sent it, before any router nesting.
fn original_path(request: &Request) -> String {
    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map(|o| &o.0)
        .unwrap_or_else(|| request.uri());
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

/// Log every request/response pair.
///
/// Bodies stream through unchanged. Up to the shipper's body limit is copied
/// from each; the line is shipped once the response body has been sent or
/// abandoned.
pub async fn log_http(
    State(shipper): State<Arc<LogShipper>>,
    request: Request,
    next: Next,
) -> Response {
    let authorized = request.headers().contains_key(AUTHORIZATION);
    let path = original_path(&request);
    let method = request.method().to_string();

    let (parts, body) = request.into_parts();
    let (body, capture) = capture_request(body, shipper.max_body_bytes()).await;
    // An absent body is logged as an empty object.
    let req_body = shipper
        .render_capture(&capture)
        .unwrap_or_else(|| "{}".to_string());

    let response = next.run(Request::from_parts(parts, body)).await;

    let (parts, body) = response.into_parts();
    let data = HttpLogData {
        authorized,
        path,
        method,
        status_code: parts.status.as_u16(),
        req_body,
        res_body: None,
    };
    Response::from_parts(parts, tee_response(shipper, data, body))
}

/// Observe requests that ended in an [`ApiError`] or a caught panic.
///
/// The response passes through untouched; the error is only recorded.
pub async fn log_unhandled_errors(
    State(shipper): State<Arc<LogShipper>>,
    request: Request,
    next: Next,
) -> Response {
    let path = original_path(&request);
    let method = request.method().to_string();

    let response = next.run(request).await;

    if let Some(err) = response.extensions().get::<UnhandledError>() {
        let data = ErrorLogData {
            path,
            method,
            status_code: err.status.as_u16(),
            message: err.message.clone(),
        };
        tracing::error!(
            path = %data.path,
            method = %data.method,
            status = data.status_code,
            message = %data.message,
            "Captured error"
        );
        shipper.log(LogLevel::Error, "http", &data);
    }

    response
}
