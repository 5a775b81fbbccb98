//! Remote metrics subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → middleware.rs::track_requests
//!     → aggregator.rs (count at start; latency + derived samples at finish)
//!     → sample.rs (OTLP JSON envelope)
//!     → sender.rs → crate::dispatch (fire-and-forget POST)
//!
//! Business events (sale, failed creation)
//!     → global.rs free functions → aggregator.rs
//!
//! Periodic timer
//!     → sampler.rs (CPU / memory gauges)
//!     → sender.rs
//! ```
//!
//! # Design Decisions
//! - One aggregator per process, counters behind a mutex
//! - Latency is a streaming mean, not a sample list
//! - Sums are cumulative and monotonic; nothing is ever reset

pub mod aggregator;
pub mod global;
pub mod latency;
pub mod middleware;
pub mod sample;
pub mod sampler;
pub mod sender;

pub use aggregator::{MetricsAggregator, MetricsSnapshot, RequestTicket};
pub use global::{install_global, record_creation_failure, record_creation_latency, record_sale_amount};
pub use latency::LatencyStats;
pub use middleware::{track_requests, UNMATCHED_ENDPOINT};
pub use sample::{MetricKind, MetricSample, MetricValue, MetricsPush};
pub use sampler::{HostProbe, SamplingError, SystemProbe, SystemSampler};
pub use sender::MetricsSender;
