//! Metric samples and the OTLP/HTTP JSON envelope pushed to the metrics sink.
//!
//! One sample becomes one push:
//! ```text
//! {"resourceMetrics":[{"scopeMetrics":[{"metrics":[{
//!     "name": .., "unit": ..,
//!     "gauge" | "sum": {
//!         "dataPoints": [{"asDouble" | "asInt": .., "timeUnixNano": .., "attributes": [..]}],
//!         // sum only:
//!         "aggregationTemporality": "AGGREGATION_TEMPORALITY_CUMULATIVE",
//!         "isMonotonic": true
//!     }
//! }]}]}]}
//! ```

use std::collections::BTreeMap;

use serde::Serialize;

pub const CUMULATIVE: &str = "AGGREGATION_TEMPORALITY_CUMULATIVE";

/// Point-in-time value or running total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    /// Cumulative, monotonic.
    Sum,
}

/// Integral counts go out as `asInt`, everything else as `asDouble`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum MetricValue {
    #[serde(rename = "asInt")]
    Int(u64),
    #[serde(rename = "asDouble")]
    Double(f64),
}

/// A single measurement on its way to the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub name: String,
    pub value: MetricValue,
    pub kind: MetricKind,
    pub unit: String,
    pub attributes: BTreeMap<String, String>,
    pub timestamp_nanos: u64,
}

impl MetricSample {
    pub fn gauge(name: impl Into<String>, value: MetricValue, unit: impl Into<String>) -> Self {
        Self::new(name, value, MetricKind::Gauge, unit)
    }

    pub fn sum(name: impl Into<String>, value: MetricValue, unit: impl Into<String>) -> Self {
        Self::new(name, value, MetricKind::Sum, unit)
    }

    fn new(
        name: impl Into<String>,
        value: MetricValue,
        kind: MetricKind,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            kind,
            unit: unit.into(),
            attributes: BTreeMap::new(),
            timestamp_nanos: crate::logging::event::now_nanos(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Wrap the sample in the resource/scope/metric envelope.
    pub fn into_push(self) -> MetricsPush {
        let point = DataPoint {
            value: self.value,
            time_unix_nano: self.timestamp_nanos,
            attributes: self
                .attributes
                .into_iter()
                .map(|(key, value)| KeyValue {
                    key,
                    value: AnyValue { string_value: value },
                })
                .collect(),
        };

        let data = match self.kind {
            MetricKind::Gauge => MetricData::Gauge(Gauge {
                data_points: vec![point],
            }),
            MetricKind::Sum => MetricData::Sum(Sum {
                data_points: vec![point],
                aggregation_temporality: CUMULATIVE,
                is_monotonic: true,
            }),
        };

        MetricsPush {
            resource_metrics: vec![ResourceMetrics {
                scope_metrics: vec![ScopeMetrics {
                    metrics: vec![Metric {
                        name: self.name,
                        unit: self.unit,
                        data,
                    }],
                }],
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsPush {
    pub resource_metrics: Vec<ResourceMetrics>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetrics {
    pub scope_metrics: Vec<ScopeMetrics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScopeMetrics {
    pub metrics: Vec<Metric>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metric {
    pub name: String,
    pub unit: String,
    #[serde(flatten)]
    pub data: MetricData,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricData {
    Gauge(Gauge),
    Sum(Sum),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Gauge {
    pub data_points: Vec<DataPoint>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sum {
    pub data_points: Vec<DataPoint>,
    pub aggregation_temporality: &'static str,
    pub is_monotonic: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoint {
    #[serde(flatten)]
    pub value: MetricValue,
    pub time_unix_nano: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<KeyValue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyValue {
    pub key: String,
    pub value: AnyValue,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnyValue {
    pub string_value: String,
}
