//! Metric descriptors: the declared identity of one exported series.

use crate::snapshot::FieldLookup;
use prometheus::core::Desc;
use prometheus::proto::MetricType;
use std::fmt;

/// How the exported value behaves over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Monotonically non-decreasing over the process lifetime.
    Counter,
    /// Free to move in either direction.
    Gauge,
}

impl MetricKind {
    /// Returns the Prometheus wire type for this kind.
    pub fn metric_type(self) -> MetricType {
        match self {
            MetricKind::Counter => MetricType::COUNTER,
            MetricKind::Gauge => MetricType::GAUGE,
        }
    }

    /// Lowercase kind name, as printed in the text exposition.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location of a leaf inside a snapshot, e.g. `acm.response.errors.closed`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Splits a dotted path into segments.
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path.split('.').map(str::to_owned).collect(),
        }
    }

    /// Path segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Reads the leaf from `snapshot`.
    ///
    /// Catalog construction rejects paths that do not resolve against the
    /// schema, so the zero fallback is never taken for a built descriptor.
    pub fn read<S: FieldLookup>(&self, snapshot: &S) -> f64 {
        snapshot.lookup(self.segments.as_slice()).unwrap_or(0.0)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// One exported time series: identity plus the extractor that reads it.
#[derive(Debug, Clone)]
pub struct MetricDescriptor {
    pub(crate) name: String,
    pub(crate) help: String,
    pub(crate) labels: Vec<(String, String)>,
    pub(crate) kind: MetricKind,
    pub(crate) path: FieldPath,
    pub(crate) desc: Desc,
}

impl MetricDescriptor {
    /// Fully-qualified series name, `<namespace>_<subsystem>_<metric>`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Help text shared by the series family.
    pub fn help(&self) -> &str {
        &self.help
    }

    /// Counter or gauge.
    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Constant labels in declaration order.
    pub fn labels(&self) -> &[(String, String)] {
        &self.labels
    }

    /// Label keys in declaration order.
    pub fn label_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.labels.iter().map(|(key, _)| key.as_str())
    }

    /// Label values in declaration order.
    pub fn label_values(&self) -> impl Iterator<Item = &str> + '_ {
        self.labels.iter().map(|(_, value)| value.as_str())
    }

    /// Snapshot leaf this series is read from.
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Descriptor as registered with the Prometheus registry.
    pub fn desc(&self) -> &Desc {
        &self.desc
    }

    /// Reads this series' current value. Never fails.
    pub fn evaluate<S: FieldLookup>(&self, snapshot: &S) -> f64 {
        self.path.read(snapshot)
    }
}
