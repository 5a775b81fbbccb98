//! Pushes metric samples to the remote metrics sink.

use crate::config::{AuthScheme, MetricsConfig};
use crate::dispatch::{Credential, DispatchOutcome, Dispatcher, Outbound, Sink};
use crate::metrics::sample::MetricSample;

/// Serializes samples and hands them to the dispatcher.
///
/// Every sample is tagged with the configured `source` attribute.
#[derive(Clone)]
pub struct MetricsSender {
    enabled: bool,
    url: String,
    source: String,
    credential: Credential,
    dispatcher: Dispatcher,
}

impl MetricsSender {
    pub fn new(config: &MetricsConfig, dispatcher: Dispatcher) -> Self {
        let credential = match config.auth_scheme {
            AuthScheme::Bearer => Credential::bearer_for(&config.user_id, &config.api_key),
            AuthScheme::Basic => Credential::Basic {
                user: config.user_id.clone(),
                password: config.api_key.clone(),
            },
        };

        Self {
            enabled: config.enabled && !config.url.is_empty(),
            url: config.url.clone(),
            source: config.source.clone(),
            credential,
            dispatcher,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Serialize one sample to the push body.
    pub fn encode(&self, sample: MetricSample) -> Result<String, serde_json::Error> {
        let sample = sample.with_attribute("source", self.source.clone());
        serde_json::to_string(&sample.into_push())
    }

    /// Push one sample. Failures are logged locally and never returned.
    pub fn send(&self, sample: MetricSample) -> DispatchOutcome {
        if !self.enabled {
            return DispatchOutcome::Disabled;
        }

        let label = sample.name.clone();
        let body = match self.encode(sample) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(metric = %label, error = %e, "Failed to serialize metric");
                return DispatchOutcome::Invalid;
            }
        };

        self.dispatcher.dispatch(Outbound {
            sink: Sink::Metrics,
            url: self.url.clone(),
            credential: self.credential.clone(),
            body,
            label,
        })
    }
}
