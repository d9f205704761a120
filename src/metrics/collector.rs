//! Scrape-time evaluation of a metric catalog.

use super::catalog::Catalog;
use super::descriptor::{MetricDescriptor, MetricKind};
use crate::snapshot::{validate_leaves, FieldLookup, SnapshotProvider};
use prometheus::core::{Collector as PrometheusCollector, Desc};
use prometheus::proto::{self, LabelPair, Metric, MetricFamily};
use std::collections::HashMap;
use std::sync::Arc;

/// One evaluated series.
#[derive(Debug, Clone, Copy)]
pub struct Sample<'a> {
    /// The catalog entry this sample was read for.
    pub descriptor: &'a MetricDescriptor,
    /// Value read from the pass's snapshot.
    pub value: f64,
}

impl PartialEq for Sample<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.descriptor, other.descriptor) && self.value == other.value
    }
}

impl<'a> Sample<'a> {
    /// Full series name.
    pub fn name(&self) -> &'a str {
        let descriptor: &'a MetricDescriptor = self.descriptor;
        descriptor.name()
    }

    /// Label values in declaration order.
    pub fn label_values(&self) -> impl Iterator<Item = &'a str> + 'a {
        let descriptor: &'a MetricDescriptor = self.descriptor;
        descriptor.label_values()
    }

    /// Counter or gauge.
    pub fn kind(&self) -> MetricKind {
        self.descriptor.kind()
    }
}

/// Evaluates a catalog against the latest snapshot on every scrape.
///
/// Holds no state between scrapes besides the immutable catalog, so
/// `describe` and `collect` may run concurrently from any number of threads.
pub struct Collector<S> {
    catalog: Catalog<S>,
    provider: Arc<dyn SnapshotProvider<S>>,
}

impl<S> Collector<S>
where
    S: FieldLookup + Default + Send + Sync,
{
    /// Binds `catalog` to a shared snapshot source.
    pub fn new(catalog: Catalog<S>, provider: Arc<dyn SnapshotProvider<S>>) -> Self {
        Self { catalog, provider }
    }

    /// The catalog this collector evaluates.
    pub fn catalog(&self) -> &Catalog<S> {
        &self.catalog
    }

    /// Declared series in catalog order. Never reads a snapshot.
    pub fn describe(&self) -> impl Iterator<Item = &MetricDescriptor> + '_ {
        self.catalog.iter()
    }

    /// Runs one evaluation pass.
    ///
    /// Fetches exactly one snapshot and reads every series from it, so all
    /// samples of a pass are from the same point in time. A failed fetch is
    /// logged and replaced by the zero snapshot, as is a snapshot holding a
    /// negative or non-finite counter. The pass always yields one sample per
    /// descriptor.
    pub fn collect(&self) -> impl Iterator<Item = Sample<'_>> + '_ {
        let snapshot = self.snapshot();
        tracing::trace!(
            namespace = self.catalog.namespace(),
            series = self.catalog.len(),
            "Evaluating catalog"
        );
        self.catalog.iter().map(move |descriptor| Sample {
            descriptor,
            value: descriptor.evaluate(snapshot.as_ref()),
        })
    }

    fn snapshot(&self) -> Arc<S> {
        let fetched = self
            .provider
            .fetch_snapshot()
            .and_then(|snapshot| validate_leaves(snapshot.as_ref()).map(|()| snapshot));
        match fetched {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(
                    namespace = self.catalog.namespace(),
                    error = %e,
                    "Snapshot fetch failed, reporting zero values"
                );
                Arc::new(S::default())
            }
        }
    }
}

impl<S> PrometheusCollector for Collector<S>
where
    S: FieldLookup + Default + Send + Sync,
{
    fn desc(&self) -> Vec<&Desc> {
        self.catalog.iter().map(MetricDescriptor::desc).collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        into_families(Collector::collect(self))
    }
}

/// Groups samples into one family per series name, in first-seen order.
fn into_families<'a>(samples: impl Iterator<Item = Sample<'a>>) -> Vec<MetricFamily> {
    let mut families: Vec<MetricFamily> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for sample in samples {
        let descriptor = sample.descriptor;
        let slot = *index.entry(descriptor.name()).or_insert_with(|| {
            let mut family = MetricFamily::default();
            family.set_name(descriptor.name().to_string());
            family.set_help(descriptor.help().to_string());
            family.set_field_type(descriptor.kind().metric_type());
            families.push(family);
            families.len() - 1
        });
        families[slot].mut_metric().push(to_metric(&sample));
    }

    families
}

fn to_metric(sample: &Sample<'_>) -> Metric {
    let mut metric = Metric::default();
    for (key, value) in sample.descriptor.labels() {
        let mut pair = LabelPair::default();
        pair.set_name(key.clone());
        pair.set_value(value.clone());
        metric.mut_label().push(pair);
    }

    match sample.kind() {
        MetricKind::Counter => {
            let mut counter = proto::Counter::default();
            counter.set_value(sample.value);
            metric.set_counter(counter);
        }
        MetricKind::Gauge => {
            let mut gauge = proto::Gauge::default();
            gauge.set_value(sample.value);
            metric.set_gauge(gauge);
        }
    }
    metric
}
