//! Bounded fire-and-forget HTTP delivery.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tokio::sync::Semaphore;

use crate::config::DispatchConfig;
use crate::dispatch::types::{DispatchOutcome, Outbound, TelemetryError, TelemetryResult};
use crate::observability::metrics;

/// Sends telemetry payloads without blocking the caller.
///
/// At most `max_in_flight` POSTs run at once; anything beyond that is dropped
/// and logged. Each POST is bounded by the configured timeout and is never
/// retried.
#[derive(Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
    permits: Arc<Semaphore>,
    max_in_flight: usize,
}

impl Dispatcher {
    /// Create a dispatcher from the delivery limits.
    pub fn new(config: &DispatchConfig) -> TelemetryResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            permits: Arc::new(Semaphore::new(config.max_in_flight)),
            max_in_flight: config.max_in_flight,
        })
    }

    /// Hand a payload off for background delivery.
    pub fn dispatch(&self, outbound: Outbound) -> DispatchOutcome {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!(sink = %outbound.sink, label = %outbound.label, "No async runtime, dropping emission");
                return DispatchOutcome::NoRuntime;
            }
        };

        let permit = match self.permits.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                tracing::warn!(
                    sink = %outbound.sink,
                    label = %outbound.label,
                    max_in_flight = self.max_in_flight,
                    "Emission dropped: too many in flight"
                );
                metrics::record_emission(outbound.sink, "dropped");
                return DispatchOutcome::Saturated;
            }
        };

        let client = self.client.clone();
        handle.spawn(async move {
            let _permit = permit;
            let sink = outbound.sink;
            match deliver(&client, &outbound).await {
                Ok(()) => {
                    tracing::debug!(sink = %sink, label = %outbound.label, "Pushed");
                    metrics::record_emission(sink, "ok");
                }
                Err(e) => {
                    tracing::error!(
                        sink = %sink,
                        label = %outbound.label,
                        error = %e,
                        body = %outbound.body,
                        "Failed to push telemetry"
                    );
                    metrics::record_emission(sink, "failed");
                }
            }
        });

        DispatchOutcome::Queued
    }

    /// Number of POSTs currently running.
    pub fn in_flight(&self) -> usize {
        self.max_in_flight - self.permits.available_permits()
    }

    /// Wait until every running POST has finished, or the deadline passes.
    ///
    /// Returns `true` when the dispatcher went idle in time.
    pub async fn drain(&self, deadline: Duration) -> bool {
        let all = u32::try_from(self.max_in_flight).unwrap_or(u32::MAX);
        match tokio::time::timeout(deadline, self.permits.acquire_many(all)).await {
            Ok(Ok(_permits)) => true,
            Ok(Err(_)) => false,
            Err(_) => {
                tracing::warn!(in_flight = self.in_flight(), "Drain deadline passed, dropping in-flight emissions");
                false
            }
        }
    }
}

async fn deliver(client: &reqwest::Client, outbound: &Outbound) -> Result<(), TelemetryError> {
    let request = client
        .post(&outbound.url)
        .header(CONTENT_TYPE, "application/json")
        .body(outbound.body.clone());

    let response = outbound.credential.apply(request).send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    Err(TelemetryError::Status {
        status: status.as_u16(),
        body,
    })
}
