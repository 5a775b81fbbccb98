//! Process-wide request and business counters.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::metrics::latency::LatencyStats;
use crate::metrics::sample::{MetricSample, MetricValue};
use crate::metrics::sender::MetricsSender;
use crate::observability::metrics as local;

pub const REQUESTS_TOTAL: &str = "requests_total";
pub const REQUESTS_BY_METHOD: &str = "requests_by_method";
pub const REQUESTS_BY_ENDPOINT: &str = "requests_by_endpoint";
pub const AVG_LATENCY: &str = "avg_latency";
pub const REVENUE: &str = "revenue";
pub const CREATION_FAILURES: &str = "creation_failures";
pub const CREATION_LATENCY: &str = "pizza_creation_latency";

#[derive(Debug, Default)]
struct RequestCounters {
    total: u64,
    by_method: HashMap<String, u64>,
    by_endpoint: HashMap<String, u64>,
    latency: LatencyStats,
}

#[derive(Debug, Default)]
struct BusinessCounters {
    revenue: f64,
    creation_failures: u64,
}

/// Handle for a request in progress. Consumed by [`MetricsAggregator::finish_request`],
/// so completion is recorded at most once.
#[derive(Debug)]
pub struct RequestTicket {
    method: String,
    endpoint: String,
    started: Instant,
}

impl RequestTicket {
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub method_counts: HashMap<String, u64>,
    pub endpoint_counts: HashMap<String, u64>,
    pub completed_requests: u64,
    pub avg_latency_ms: f64,
    pub revenue: f64,
    pub creation_failures: u64,
}

/// Owns all counters. Every read-modify-write happens under a lock, so
/// `total == sum(by_method)` holds whenever the lock is released.
pub struct MetricsAggregator {
    requests: Mutex<RequestCounters>,
    business: Mutex<BusinessCounters>,
    sender: MetricsSender,
}

impl MetricsAggregator {
    pub fn new(sender: MetricsSender) -> Self {
        Self {
            requests: Mutex::new(RequestCounters::default()),
            business: Mutex::new(BusinessCounters::default()),
            sender,
        }
    }

    pub fn sender(&self) -> &MetricsSender {
        &self.sender
    }

    fn requests(&self) -> MutexGuard<'_, RequestCounters> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn business(&self) -> MutexGuard<'_, BusinessCounters> {
        self.business.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count a request as it starts.
    pub fn begin_request(&self, method: &str, endpoint: &str) -> RequestTicket {
        let mut counters = self.requests();
        counters.total += 1;
        *counters.by_method.entry(method.to_string()).or_insert(0) += 1;
        *counters.by_endpoint.entry(endpoint.to_string()).or_insert(0) += 1;

        RequestTicket {
            method: method.to_string(),
            endpoint: endpoint.to_string(),
            started: Instant::now(),
        }
    }

    /// Record completion using the time elapsed since `begin_request`, and push
    /// the derived metrics.
    pub fn finish_request(&self, ticket: RequestTicket, status: u16) -> Vec<MetricSample> {
        let elapsed = ticket.started.elapsed();
        self.finish_request_after(ticket, elapsed, status)
    }

    /// Record completion with an explicit duration.
    pub fn finish_request_after(
        &self,
        ticket: RequestTicket,
        elapsed: Duration,
        status: u16,
    ) -> Vec<MetricSample> {
        let duration_ms = elapsed.as_secs_f64() * 1000.0;
        local::record_request(&ticket.method, &ticket.endpoint, status, elapsed);

        let (total, method_count, endpoint_count, avg_latency) = {
            let mut counters = self.requests();
            counters.latency.record(duration_ms);
            (
                counters.total,
                counters.by_method.get(&ticket.method).copied().unwrap_or(0),
                counters.by_endpoint.get(&ticket.endpoint).copied().unwrap_or(0),
                counters.latency.mean(),
            )
        };

        let samples = vec![
            MetricSample::sum(REQUESTS_TOTAL, MetricValue::Int(total), "1"),
            MetricSample::sum(REQUESTS_BY_METHOD, MetricValue::Int(method_count), "1")
                .with_attribute("method", ticket.method),
            MetricSample::sum(REQUESTS_BY_ENDPOINT, MetricValue::Int(endpoint_count), "1")
                .with_attribute("endpoint", ticket.endpoint),
            MetricSample::gauge(AVG_LATENCY, MetricValue::Double(avg_latency), "ms"),
        ];
        self.emit(&samples);
        samples
    }

    /// Add a completed sale to the running revenue and push the new total.
    pub fn record_sale_amount(&self, amount: f64) -> Option<MetricSample> {
        if !amount.is_finite() || amount < 0.0 {
            tracing::warn!(amount, "Ignoring sale amount that would move revenue backwards");
            return None;
        }

        let revenue = {
            let mut business = self.business();
            business.revenue += amount;
            business.revenue
        };

        let sample = MetricSample::sum(REVENUE, MetricValue::Double(revenue), "BTC");
        self.emit(std::slice::from_ref(&sample));
        Some(sample)
    }

    /// Count a failed order creation and push the new total.
    pub fn record_creation_failure(&self) -> MetricSample {
        let failures = {
            let mut business = self.business();
            business.creation_failures += 1;
            business.creation_failures
        };

        let sample = MetricSample::sum(CREATION_FAILURES, MetricValue::Int(failures), "1");
        self.emit(std::slice::from_ref(&sample));
        sample
    }

    /// Push the duration of a factory round trip.
    pub fn record_creation_latency(&self, elapsed: Duration) -> MetricSample {
        let sample = MetricSample::gauge(
            CREATION_LATENCY,
            MetricValue::Double(elapsed.as_secs_f64() * 1000.0),
            "ms",
        );
        self.emit(std::slice::from_ref(&sample));
        sample
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let (total_requests, method_counts, endpoint_counts, latency) = {
            let counters = self.requests();
            (
                counters.total,
                counters.by_method.clone(),
                counters.by_endpoint.clone(),
                counters.latency,
            )
        };
        let business = self.business();

        MetricsSnapshot {
            total_requests,
            method_counts,
            endpoint_counts,
            completed_requests: latency.count(),
            avg_latency_ms: latency.mean(),
            revenue: business.revenue,
            creation_failures: business.creation_failures,
        }
    }

    fn emit(&self, samples: &[MetricSample]) {
        for sample in samples {
            self.sender.send(sample.clone());
        }
    }
}
