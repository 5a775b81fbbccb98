use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::AdminConfig;

/// Only let requests carrying `Authorization: Bearer <admin key>` through.
pub async fn require_admin(
    State(admin): State<Arc<AdminConfig>>,
    request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|key| !admin.api_key.is_empty() && key == admin.api_key);

    if authorized {
        return Ok(next.run(request).await);
    }

    tracing::warn!(path = %request.uri().path(), "Rejected unauthorized admin request");
    Err((StatusCode::UNAUTHORIZED, Json(json!({ "message": "unauthorized" }))))
}
