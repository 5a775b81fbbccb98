//! Process-wide entry points for business-event metrics.
//!
//! Order handling code records sales and failures without holding a handle to
//! the aggregator. `install_global` is called once at startup; before that the
//! functions are no-ops.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::metrics::aggregator::MetricsAggregator;

static GLOBAL: OnceLock<Arc<MetricsAggregator>> = OnceLock::new();

/// Make `aggregator` the target of the free functions. Returns `false` if one
/// was already installed.
pub fn install_global(aggregator: Arc<MetricsAggregator>) -> bool {
    GLOBAL.set(aggregator).is_ok()
}

/// Add a completed sale to the revenue total.
pub fn record_sale_amount(amount: f64) {
    match GLOBAL.get() {
        Some(aggregator) => {
            aggregator.record_sale_amount(amount);
        }
        None => tracing::debug!(amount, "No metrics aggregator installed, sale not recorded"),
    }
}

/// Count a failed order creation.
pub fn record_creation_failure() {
    match GLOBAL.get() {
        Some(aggregator) => {
            aggregator.record_creation_failure();
        }
        None => tracing::debug!("No metrics aggregator installed, failure not recorded"),
    }
}

/// Push the duration of a factory round trip.
pub fn record_creation_latency(elapsed: Duration) {
    if let Some(aggregator) = GLOBAL.get() {
        aggregator.record_creation_latency(elapsed);
    }
}
