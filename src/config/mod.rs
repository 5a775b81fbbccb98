//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → TelemetryConfig (validated, immutable)
//!     → sections handed to the shipper, aggregator, dispatcher and server
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, AuthScheme, ChaosConfig, DispatchConfig, ListenerConfig, LogFormat,
    LoggingConfig, MetricsConfig, ObservabilityConfig, TelemetryConfig,
};
pub use validation::{validate_config, ValidationError};
