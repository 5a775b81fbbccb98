//! Outbound delivery types and error definitions.

use std::fmt;

use reqwest::RequestBuilder;
use thiserror::Error;

/// Remote endpoint class, used for local logging and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sink {
    Logs,
    Metrics,
}

impl Sink {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sink::Logs => "logs",
            Sink::Metrics => "metrics",
        }
    }
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credential presented to a sink.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// `Authorization: Bearer <token>`.
    Bearer(String),
    /// `Authorization: Basic base64(<user>:<password>)`.
    Basic { user: String, password: String },
}

impl Credential {
    /// Bearer token of the form `<user_id>:<api_key>`, or just the key when no
    /// user id is configured.
    pub fn bearer_for(user_id: &str, api_key: &str) -> Self {
        if user_id.is_empty() {
            Credential::Bearer(api_key.to_string())
        } else {
            Credential::Bearer(format!("{}:{}", user_id, api_key))
        }
    }

    pub(crate) fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            Credential::Bearer(token) => builder.bearer_auth(token),
            Credential::Basic { user, password } => builder.basic_auth(user, Some(password)),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Bearer(_) => f.write_str("Bearer(***)"),
            Credential::Basic { user, .. } => write!(f, "Basic({}:***)", user),
        }
    }
}

/// A serialized payload ready to POST.
#[derive(Debug, Clone)]
pub struct Outbound {
    pub sink: Sink,
    pub url: String,
    pub credential: Credential,
    /// JSON body.
    pub body: String,
    /// Short description for local logs (e.g. the metric name).
    pub label: String,
}

/// Result of handing an emission to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Spawned; delivery happens in the background.
    Queued,
    /// All in-flight slots are taken; the emission was discarded.
    Saturated,
    /// Called outside a Tokio runtime; the emission was discarded.
    NoRuntime,
    /// The sink is switched off in configuration.
    Disabled,
    /// The payload could not be built; nothing was sent.
    Invalid,
}

/// Errors raised while emitting telemetry. None of these reach the request path.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Connection, TLS or timeout failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The sink answered with a non-2xx status.
    #[error("sink returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Payload could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;
