//! Wiring of the instrumentation hooks onto an application router.

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, Router};
use tower_http::catch_panic::CatchPanicLayer;

use crate::chaos::{self, ChaosMonkey, ChaosState};
use crate::config::TelemetryConfig;
use crate::dispatch::{Dispatcher, TelemetryResult};
use crate::http::error::panic_response;
use crate::logging::{log_http, log_unhandled_errors, LogShipper};
use crate::metrics::{track_requests, MetricsAggregator, MetricsSender, SystemSampler};

/// Every instrumentation component of one process, built from one config.
#[derive(Clone)]
pub struct Telemetry {
    config: Arc<TelemetryConfig>,
    dispatcher: Dispatcher,
    shipper: Arc<LogShipper>,
    aggregator: Arc<MetricsAggregator>,
    chaos: Arc<ChaosMonkey>,
}

impl Telemetry {
    pub fn from_config(config: TelemetryConfig) -> TelemetryResult<Self> {
        let dispatcher = Dispatcher::new(&config.dispatch)?;
        let shipper = LogShipper::new(
            &config.logging,
            config.listener.max_body_bytes,
            dispatcher.clone(),
        );
        let sender = MetricsSender::new(&config.metrics, dispatcher.clone());
        let chaos = ChaosMonkey::new(config.chaos.enabled, config.chaos.failure_ratio);

        tracing::info!(
            logging_enabled = config.logging.enabled,
            metrics_enabled = config.metrics.enabled,
            chaos_enabled = config.chaos.enabled,
            "Telemetry initialized"
        );
        if config.admin.api_key.is_empty() {
            tracing::warn!("No admin API key configured, chaos toggle rejects every request");
        }

        Ok(Self {
            dispatcher,
            shipper: Arc::new(shipper),
            aggregator: Arc::new(MetricsAggregator::new(sender)),
            chaos: Arc::new(chaos),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn shipper(&self) -> &Arc<LogShipper> {
        &self.shipper
    }

    pub fn aggregator(&self) -> &Arc<MetricsAggregator> {
        &self.aggregator
    }

    pub fn chaos(&self) -> &Arc<ChaosMonkey> {
        &self.chaos
    }

    /// State for gating an order-creation route with [`chaos::chaos_gate`].
    pub fn chaos_state(&self) -> ChaosState {
        ChaosState {
            monkey: self.chaos.clone(),
            aggregator: self.aggregator.clone(),
        }
    }

    /// The admin chaos toggle route.
    pub fn chaos_routes(&self) -> Router {
        chaos::routes(self.chaos.clone(), Arc::new(self.config.admin.clone()))
    }

    /// Wrap `router` with request tracking, HTTP logging and error capture.
    ///
    /// Layers from the outside in: `track_requests`, `log_http`,
    /// `log_unhandled_errors`, panic catching, then the routes.
    pub fn instrument(&self, router: Router) -> Router {
        router
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(middleware::from_fn_with_state(
                self.shipper.clone(),
                log_unhandled_errors,
            ))
            .layer(middleware::from_fn_with_state(self.shipper.clone(), log_http))
            .layer(middleware::from_fn_with_state(
                self.aggregator.clone(),
                track_requests,
            ))
    }

    /// The host sampler, or `None` when metrics shipping is off.
    pub fn sampler(&self) -> Option<SystemSampler> {
        if !self.aggregator.sender().is_enabled() {
            return None;
        }
        Some(SystemSampler::new(
            self.aggregator.sender().clone(),
            Duration::from_secs(self.config.metrics.period_secs),
        ))
    }
}
