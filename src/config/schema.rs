//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! instrumentation layer. All types derive Serde traits for deserialization
//! from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the telemetry layer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// Remote log sink settings.
    pub logging: LoggingConfig,

    /// Remote metrics sink and sampler settings.
    pub metrics: MetricsConfig,

    /// Outbound delivery limits shared by both sinks.
    pub dispatch: DispatchConfig,

    /// Chaos injection for the order-creation route.
    pub chaos: ChaosConfig,

    /// Admin credentials for operator endpoints.
    pub admin: AdminConfig,

    /// Local diagnostics (tracing, Prometheus scrape endpoint).
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Largest body copied into a log line, in bytes. Longer bodies are still
    /// served in full and logged as a size marker.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Log sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Ship request/response logs to the remote sink.
    pub enabled: bool,

    /// Push endpoint of the log aggregator.
    pub url: String,

    /// Value of the `component` stream label.
    pub source: String,

    /// Account id, sent as the first half of the bearer token.
    pub user_id: String,

    /// API key, sent as the second half of the bearer token.
    pub api_key: String,

    /// Field names replaced by the redaction placeholder.
    pub redacted_fields: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            source: "jwt-pizza-service".to_string(),
            user_id: String::new(),
            api_key: String::new(),
            redacted_fields: vec!["password".to_string()],
        }
    }
}

/// Credential scheme for the metrics sink.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    #[default]
    Bearer,
    Basic,
}

/// Metrics sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Push metrics to the remote sink.
    pub enabled: bool,

    /// OTLP/HTTP JSON push endpoint.
    pub url: String,

    /// Value of the `source` attribute attached to every data point.
    pub source: String,

    /// Account id (basic auth user, or bearer prefix when non-empty).
    pub user_id: String,

    /// API key.
    pub api_key: String,

    /// How the credential is presented.
    pub auth_scheme: AuthScheme,

    /// Host sampling period in seconds.
    pub period_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            source: "jwt-pizza-service".to_string(),
            user_id: String::new(),
            api_key: String::new(),
            auth_scheme: AuthScheme::Bearer,
            period_secs: 60,
        }
    }
}

/// Outbound delivery limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Maximum concurrent emissions across both sinks. Extra emissions are dropped.
    pub max_in_flight: usize,

    /// Total time allowed for a single POST, in milliseconds.
    pub timeout_ms: u64,

    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Time allowed to flush in-flight emissions on shutdown, in milliseconds.
    pub drain_timeout_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 64,
            timeout_ms: 5_000,
            connect_timeout_ms: 2_000,
            drain_timeout_ms: 3_000,
        }
    }
}

/// Chaos injection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChaosConfig {
    /// Start with chaos enabled.
    pub enabled: bool,

    /// Probability that a gated request fails while chaos is enabled.
    pub failure_ratio: f64,
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            failure_ratio: 0.5,
        }
    }
}

/// Admin configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// API key for admin endpoints (Bearer token). Empty disables them.
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
        }
    }
}

/// Local observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Scrape endpoint bind address.
    pub metrics_address: String,
}

/// Local log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
