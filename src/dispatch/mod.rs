//! Outbound delivery subsystem.
//!
//! # Data Flow
//! ```text
//! LogShipper / MetricsSender
//!     → Outbound (serialized JSON + sink URL + credential)
//!     → dispatcher.rs (take an in-flight slot or drop)
//!     → spawned POST with timeout
//!     → success / failure logged locally, never returned to the caller
//! ```
//!
//! # Design Decisions
//! - At-most-once delivery: no retries, no buffering
//! - Every POST has a deadline
//! - In-flight emissions are capped; overflow is dropped, not queued

pub mod dispatcher;
pub mod types;

pub use dispatcher::Dispatcher;
pub use types::{Credential, DispatchOutcome, Outbound, Sink, TelemetryError, TelemetryResult};
