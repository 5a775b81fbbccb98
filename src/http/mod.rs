//! HTTP surface of the instrumentation layer.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (request ID, trace span, timeout)
//!     → telemetry.rs hooks (track_requests → log_http → log_unhandled_errors → catch panic)
//!     → application routes / health / chaos toggle (auth.rs guards admin routes)
//!     → error.rs renders ApiError as `{"message": ..}`
//! ```

pub mod auth;
pub mod error;
pub mod server;
pub mod telemetry;

pub use auth::require_admin;
pub use error::{panic_response, ApiError, UnhandledError};
pub use server::HttpServer;
pub use telemetry::Telemetry;
