//! Remote log shipping subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → middleware.rs::log_http (copy request prefix, run handler)
//!     → capture.rs (forward bodies whole, copy up to the limit,
//!                   ship when the response body ends or is dropped)
//!     → event.rs (HttpLogData, severity from status)
//!     → sanitize.rs (redact sensitive fields, render JSON text)
//!     → shipper.rs (labels + timestamp → push envelope)
//!     → crate::dispatch (fire-and-forget POST)
//!
//! Handler error / panic
//!     → http::error::ApiError response carries UnhandledError
//!     → middleware.rs::log_unhandled_errors (ErrorLogData at `error`)
//! ```

pub mod capture;
pub mod event;
pub mod middleware;
pub mod sanitize;
pub mod shipper;

pub use capture::BodyCapture;
pub use event::{ErrorLogData, HttpLogData, LogEvent, LogLabels, LogLevel, LogPush};
pub use middleware::{log_http, log_unhandled_errors};
pub use sanitize::{Redactor, REDACTED};
pub use shipper::LogShipper;
