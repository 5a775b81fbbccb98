//! Request-terminating errors and the generic error responder.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// An error that ends a request. Renders `{"message": ..}` with its status.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Build from a raw status code; anything that is not a valid status becomes 500.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Marker left on responses produced by [`ApiError`], so the unhandled-error
/// hook can observe the failure after it has been rendered.
#[derive(Debug, Clone)]
pub struct UnhandledError {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(json!({ "message": self.message }))).into_response();
        response.extensions_mut().insert(UnhandledError {
            status: self.status,
            message: self.message,
        });
        response
    }
}

/// Panic handler for `CatchPanicLayer`: the panic becomes a 500 [`ApiError`].
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };
    ApiError::internal(message).into_response()
}
