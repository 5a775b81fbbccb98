//! Ships sanitized log lines to the remote log sink.

use serde::Serialize;
use serde_json::{json, Value};

use crate::config::LoggingConfig;
use crate::dispatch::{Credential, DispatchOutcome, Dispatcher, Outbound, Sink};
use crate::logging::capture::BodyCapture;
use crate::logging::event::{now_nanos, LogEvent, LogLabels, LogLevel};
use crate::logging::sanitize::{to_log_string, Redactor};

/// Builds log events and hands them to the dispatcher.
#[derive(Clone)]
pub struct LogShipper {
    enabled: bool,
    url: String,
    component: String,
    credential: Credential,
    redactor: Redactor,
    dispatcher: Dispatcher,
    max_body_bytes: usize,
}

impl LogShipper {
    pub fn new(config: &LoggingConfig, max_body_bytes: usize, dispatcher: Dispatcher) -> Self {
        Self {
            enabled: config.enabled && !config.url.is_empty(),
            url: config.url.clone(),
            component: config.source.clone(),
            credential: Credential::bearer_for(&config.user_id, &config.api_key),
            redactor: Redactor::new(config.redacted_fields.clone()),
            dispatcher,
            max_body_bytes,
        }
    }

    pub fn redactor(&self) -> &Redactor {
        &self.redactor
    }

    /// Largest body the HTTP hook copies into a log line.
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Sanitize `data` and stamp it with labels and the current time.
    pub fn build_event<T: Serialize>(
        &self,
        level: LogLevel,
        kind: &str,
        data: &T,
    ) -> Result<LogEvent, serde_json::Error> {
        let value = serde_json::to_value(data)?;
        let body = self.redactor.sanitize(&value)?;
        Ok(LogEvent {
            timestamp_nanos: now_nanos(),
            labels: LogLabels {
                component: self.component.clone(),
                level,
                kind: kind.to_string(),
            },
            body,
        })
    }

    /// Ship one log line. Failures are logged locally and never returned.
    pub fn log<T: Serialize>(&self, level: LogLevel, kind: &str, data: &T) -> DispatchOutcome {
        if !self.enabled {
            return DispatchOutcome::Disabled;
        }

        let push = match self.build_event(level, kind, data) {
            Ok(event) => event.into_push(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to build log event");
                return DispatchOutcome::Invalid;
            }
        };
        let body = match serde_json::to_string(&push) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize log event");
                return DispatchOutcome::Invalid;
            }
        };

        self.dispatcher.dispatch(Outbound {
            sink: Sink::Logs,
            url: self.url.clone(),
            credential: self.credential.clone(),
            body,
            label: format!("{}/{}", kind, level),
        })
    }

    /// Redacted JSON text of a captured body.
    pub fn render_body(&self, body: &Value) -> String {
        let mut body = body.clone();
        self.redactor.redact(&mut body);
        to_log_string(&body).unwrap_or_else(|_| "null".to_string())
    }

    /// Redacted JSON text of raw body bytes, or `None` for an empty body.
    pub fn render_bytes(&self, bytes: &[u8]) -> Option<String> {
        captured_value(bytes).map(|value| self.render_body(&value))
    }

    /// Log text for a body copy. A body that was not fully captured is
    /// described by size only, never by a fragment of its content.
    pub fn render_capture(&self, capture: &BodyCapture) -> Option<String> {
        if capture.is_truncated() {
            let marker = json!({ "truncated": true, "bytes": capture.seen() });
            return Some(self.render_body(&marker));
        }
        self.render_bytes(capture.bytes())
    }
}

/// Interpret captured body bytes: JSON when it parses, a JSON string of the
/// text otherwise, nothing when empty.
fn captured_value(bytes: &[u8]) -> Option<Value> {
    if bytes.is_empty() {
        return None;
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}
