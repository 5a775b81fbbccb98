//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Sink URLs must parse when the sink is enabled
//! - Validate value ranges (periods and timeouts > 0, ratios in [0, 1])
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TelemetryConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;
use url::Url;

use crate::config::schema::TelemetryConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("{field}: invalid URL '{value}' ({reason})")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{field}: must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field}: {value} is outside [0, 1]")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },
}

/// Check a loaded configuration for semantic errors.
pub fn validate_config(config: &TelemetryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.logging.enabled {
        check_url("logging.url", &config.logging.url, &mut errors);
    }
    if config.metrics.enabled {
        check_url("metrics.url", &config.metrics.url, &mut errors);
    }

    if config.metrics.period_secs == 0 {
        errors.push(ValidationError::Zero { field: "metrics.period_secs" });
    }
    if config.dispatch.max_in_flight == 0 {
        errors.push(ValidationError::Zero { field: "dispatch.max_in_flight" });
    }
    if config.dispatch.timeout_ms == 0 {
        errors.push(ValidationError::Zero { field: "dispatch.timeout_ms" });
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "listener.request_timeout_secs" });
    }

    let ratio = config.chaos.failure_ratio;
    if !(0.0..=1.0).contains(&ratio) {
        errors.push(ValidationError::OutOfRange {
            field: "chaos.failure_ratio",
            value: ratio,
        });
    }

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
            reason: format!("unsupported scheme {}", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&TelemetryConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = TelemetryConfig::default();
        config.logging.enabled = true;
        config.logging.url = "not a url".into();
        config.metrics.enabled = true;
        config.metrics.url = "ftp://metrics.example.com".into();
        config.metrics.period_secs = 0;
        config.chaos.failure_ratio = 1.5;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::Zero { field: "metrics.period_secs" }));
        assert!(errors.contains(&ValidationError::OutOfRange {
            field: "chaos.failure_ratio",
            value: 1.5
        }));
    }

    #[test]
    fn test_disabled_sink_url_is_ignored() {
        let mut config = TelemetryConfig::default();
        config.logging.url = "garbage".into();
        assert!(validate_config(&config).is_ok());
    }
}
