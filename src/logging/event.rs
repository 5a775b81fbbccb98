//! Log records and the log sink wire format.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// Severity of a shipped log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Classify a response status: 5xx is `error`, 4xx is `warn`, anything else `info`.
    pub fn from_status(status: u16) -> Self {
        match status {
            500..=u16::MAX => LogLevel::Error,
            400..=499 => LogLevel::Warn,
            _ => LogLevel::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data captured for every request/response pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpLogData {
    /// An `Authorization` header was present. The value is never captured.
    pub authorized: bool,
    pub path: String,
    pub method: String,
    pub status_code: u16,
    /// JSON text of the request body.
    pub req_body: String,
    /// JSON text of the response body; absent when the response had none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub res_body: Option<String>,
}

/// Data captured for a request that ended in an unhandled error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorLogData {
    pub path: String,
    pub method: String,
    pub status_code: u16,
    pub message: String,
}

/// Stream labels attached to a log line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogLabels {
    pub component: String,
    pub level: LogLevel,
    #[serde(rename = "type")]
    pub kind: String,
}

/// One sanitized log line, ready to ship.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub timestamp_nanos: u64,
    pub labels: LogLabels,
    pub body: String,
}

impl LogEvent {
    /// Wrap the event in the push envelope expected by the log sink.
    pub fn into_push(self) -> LogPush {
        LogPush {
            streams: vec![LogStream {
                stream: self.labels,
                values: vec![[self.timestamp_nanos.to_string(), self.body]],
            }],
        }
    }
}

/// `{"streams":[{"stream":{..labels..},"values":[["<ns>","<line>"]]}]}`
#[derive(Debug, Clone, Serialize)]
pub struct LogPush {
    pub streams: Vec<LogStream>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogStream {
    pub stream: LogLabels,
    pub values: Vec<[String; 2]>,
}

/// Wall-clock time in nanoseconds, at millisecond precision.
pub fn now_nanos() -> u64 {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    millis * 1_000_000
}
