//! Field-name-aware redaction of log payloads.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::Value;

/// Replacement written in place of a redacted value.
pub const REDACTED: &str = "*****";

/// Replaces the values of sensitive fields, at any depth, before a payload
/// leaves the process.
#[derive(Debug, Clone)]
pub struct Redactor {
    fields: Vec<String>,
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(vec!["password".to_string()])
    }
}

impl Redactor {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    fn is_sensitive(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.eq_ignore_ascii_case(key))
    }

    /// Redact in place, walking nested objects and arrays.
    pub fn redact(&self, value: &mut Value) {
        match value {
            Value::Object(map) => {
                for (key, field) in map.iter_mut() {
                    if self.is_sensitive(key) {
                        *field = Value::String(REDACTED.to_string());
                    } else {
                        self.redact(field);
                    }
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.redact(item);
                }
            }
            _ => {}
        }
    }

    /// Redact a copy of `value` and render it as log text.
    pub fn sanitize(&self, value: &Value) -> Result<String, serde_json::Error> {
        let mut value = value.clone();
        self.redact(&mut value);
        to_log_string(&value)
    }
}

/// Single-line JSON with a space after `:` and `,`, so redacted fields read
/// `"password": "*****"`.
struct LogFormatter;

impl Formatter for LogFormatter {
    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }
}

/// Render any serializable value in the log text format.
pub fn to_log_string<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, LogFormatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf)
        .map_err(|e| serde_json::Error::io(io::Error::new(io::ErrorKind::InvalidData, e)))
}
