//! Logging and metrics instrumentation for the pizza ordering service.
//!
//! Request hooks ship sanitized HTTP logs and push request, business and host
//! metrics to remote sinks. Delivery is fire-and-forget and never affects the
//! response a client receives.

pub mod chaos;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod logging;
pub mod metrics;
pub mod observability;

pub use config::schema::TelemetryConfig;
pub use http::{HttpServer, Telemetry};
pub use lifecycle::Shutdown;
