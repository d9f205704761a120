//! Metric catalog construction.
//!
//! A catalog is built once from a namespace and a table of
//! [`CatalogEntry`] rows. Each row names a snapshot leaf by path; the series
//! name, help text and extractor are all derived from that path, so adding a
//! schema field means adding one row.

use super::descriptor::{FieldPath, MetricDescriptor, MetricKind};
use crate::snapshot::FieldLookup;
use prometheus::core::Desc;
use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use thiserror::Error;

/// Errors that abort catalog construction.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A namespace or series name is not a valid identifier.
    #[error("invalid metric name `{0}` (expected [a-z_][a-z0-9_]*)")]
    InvalidName(String),
    /// A label key or value is not a valid identifier.
    #[error("invalid label `{key}=\"{value}\"` on `{path}`")]
    InvalidLabel {
        /// Path of the offending entry.
        path: String,
        /// Label key.
        key: String,
        /// Label value.
        value: String,
    },
    /// The path has fewer than two segments or an empty one.
    #[error("path `{0}` must name a subsystem and a field")]
    InvalidPath(String),
    /// The path does not end on a snapshot leaf.
    #[error("path `{0}` does not resolve to a snapshot field")]
    UnknownField(String),
    /// Two entries produce the same series identity.
    #[error("series `{name}` with labels {labels:?} is declared twice")]
    DuplicateSeries {
        /// Series name.
        name: String,
        /// Label pairs of the series.
        labels: Vec<(String, String)>,
    },
    /// One name is declared with different help, kind or label keys.
    #[error("series family `{0}` is declared with diverging help, kind or label keys")]
    InconsistentFamily(String),
    /// The Prometheus client rejected a descriptor.
    #[error("prometheus rejected descriptor: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// One declarative row of a catalog table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    path: String,
    kind: MetricKind,
    label_key: Option<String>,
    label_value: Option<String>,
    metric: Option<String>,
}

impl CatalogEntry {
    fn new(path: impl Into<String>, kind: MetricKind) -> Self {
        Self {
            path: path.into(),
            kind,
            label_key: None,
            label_value: None,
            metric: None,
        }
    }

    /// A counter read from the leaf at `path`.
    pub fn counter(path: impl Into<String>) -> Self {
        Self::new(path, MetricKind::Counter)
    }

    /// A gauge read from the leaf at `path`.
    pub fn gauge(path: impl Into<String>) -> Self {
        Self::new(path, MetricKind::Gauge)
    }

    /// Marks the leaf as one outcome of an exclusive group.
    ///
    /// The leaf's key becomes the value of label `key` and is dropped from
    /// the series name, so sibling outcomes share one series family.
    pub fn labeled(mut self, key: impl Into<String>) -> Self {
        self.label_key = Some(key.into());
        self
    }

    /// Overrides the label value, which otherwise is the leaf's key.
    pub fn label_value(mut self, value: impl Into<String>) -> Self {
        self.label_value = Some(value.into());
        self
    }

    /// Overrides the metric segment of the name, which otherwise is derived
    /// from the path below the subsystem.
    pub fn metric(mut self, segment: impl Into<String>) -> Self {
        self.metric = Some(segment.into());
        self
    }

    /// Dotted snapshot path of this row.
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// The immutable, ordered set of descriptors exported for one snapshot type.
#[derive(Debug)]
pub struct Catalog<S> {
    namespace: String,
    descriptors: Vec<MetricDescriptor>,
    _schema: PhantomData<fn() -> S>,
}

impl<S: FieldLookup + Default> Catalog<S> {
    /// Builds a catalog, failing on the first malformed or colliding entry.
    ///
    /// `help_prefix` is prepended to each entry's path to form its help
    /// text, naming the upstream stats section the value comes from.
    pub fn build<I>(namespace: &str, help_prefix: &str, entries: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = CatalogEntry>,
    {
        if !is_identifier(namespace) {
            return Err(CatalogError::InvalidName(namespace.to_string()));
        }

        let schema = S::default();
        let mut descriptors = Vec::new();
        let mut identities = HashSet::new();
        let mut families: HashMap<String, (String, MetricKind, Vec<String>)> = HashMap::new();

        for entry in entries {
            let descriptor = build_descriptor(namespace, help_prefix, entry, &schema)?;

            let identity = (descriptor.name.clone(), descriptor.labels.clone());
            if !identities.insert(identity) {
                return Err(CatalogError::DuplicateSeries {
                    name: descriptor.name,
                    labels: descriptor.labels,
                });
            }

            let shape = (
                descriptor.help.clone(),
                descriptor.kind,
                descriptor.label_keys().map(str::to_owned).collect::<Vec<_>>(),
            );
            match families.get(&descriptor.name) {
                Some(existing) if *existing != shape => {
                    return Err(CatalogError::InconsistentFamily(descriptor.name));
                }
                Some(_) => {}
                None => {
                    families.insert(descriptor.name.clone(), shape);
                }
            }

            descriptors.push(descriptor);
        }

        tracing::info!(
            namespace,
            series = descriptors.len(),
            families = families.len(),
            "Metric catalog built"
        );

        Ok(Self {
            namespace: namespace.to_string(),
            descriptors,
            _schema: PhantomData,
        })
    }
}

impl<S> Catalog<S> {
    /// Prefix shared by every series name.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Number of declared series.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the catalog declares no series.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Descriptors in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, MetricDescriptor> {
        self.descriptors.iter()
    }

    /// Finds the descriptor for a series identity.
    pub fn find(&self, name: &str, label_values: &[&str]) -> Option<&MetricDescriptor> {
        self.descriptors
            .iter()
            .find(|d| d.name == name && d.label_values().eq(label_values.iter().copied()))
    }
}

impl<'a, S> IntoIterator for &'a Catalog<S> {
    type Item = &'a MetricDescriptor;
    type IntoIter = std::slice::Iter<'a, MetricDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn build_descriptor<S: FieldLookup>(
    namespace: &str,
    help_prefix: &str,
    entry: CatalogEntry,
    schema: &S,
) -> Result<MetricDescriptor, CatalogError> {
    let path = FieldPath::parse(&entry.path);
    let segments = path.segments();
    if segments.len() < 2 || segments.iter().any(String::is_empty) {
        return Err(CatalogError::InvalidPath(entry.path));
    }
    if schema.lookup(segments).is_none() {
        return Err(CatalogError::UnknownField(entry.path));
    }

    let subsystem = name_segment(&segments[0]);
    let (leaf, group) = segments.split_last().ok_or_else(|| {
        CatalogError::InvalidPath(entry.path.clone())
    })?;

    // Labeled rows name the series after their group; the leaf moves into
    // the label value.
    let (below_subsystem, help_path) = match entry.label_key {
        Some(_) => (&group[1..], group.join(".")),
        None => (&segments[1..], segments.join(".")),
    };
    let metric = match entry.metric {
        Some(metric) => metric,
        None => below_subsystem
            .iter()
            .map(|s| name_segment(s))
            .collect::<Vec<_>>()
            .join("_"),
    };

    let name = format!("{namespace}_{subsystem}_{metric}");
    if metric.is_empty() || !is_identifier(&name) {
        return Err(CatalogError::InvalidName(name));
    }

    let labels = match entry.label_key {
        Some(key) => {
            let value = entry.label_value.unwrap_or_else(|| name_segment(leaf));
            if !is_identifier(&key) || !is_identifier(&value) {
                return Err(CatalogError::InvalidLabel {
                    path: entry.path,
                    key,
                    value,
                });
            }
            vec![(key, value)]
        }
        None => Vec::new(),
    };

    let help = format!("{help_prefix}.{help_path}");
    let desc = Desc::new(
        name.clone(),
        help.clone(),
        Vec::new(),
        labels.iter().cloned().collect(),
    )?;

    tracing::trace!(name = %name, path = %path, "Declared series");

    Ok(MetricDescriptor {
        name,
        help,
        labels,
        kind: entry.kind,
        path,
        desc,
    })
}

/// Maps an upstream key onto a name segment (`missing-content-length` ->
/// `missing_content_length`).
fn name_segment(key: &str) -> String {
    key.replace('-', "_")
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
