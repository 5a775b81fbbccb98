//! Local observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (tracing subscriber: pretty or JSON to stdout)
//!     → metrics.rs (counters, gauges, histograms for Prometheus scrape)
//!
//! Remote shipping is separate:
//!     → crate::logging (log sink)
//!     → crate::metrics (metrics sink)
//! ```

pub mod logging;
pub mod metrics;
