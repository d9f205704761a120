//! Prometheus registry wiring and text exposition.

use super::collector::Collector;
use crate::snapshot::FieldLookup;
use prometheus::{Encoder, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Prometheus registry holding the exporter's collectors.
#[derive(Default)]
pub struct ExporterRegistry {
    registry: Registry,
}

impl ExporterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a collector's series.
    ///
    /// Fails if any of its series identities is already registered.
    pub fn register<S>(&self, collector: Collector<S>) -> Result<(), MetricsError>
    where
        S: FieldLookup + Default + Send + Sync + 'static,
    {
        self.registry.register(Box::new(collector))?;
        Ok(())
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Runs an evaluation pass and encodes it in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{apm_server_catalog, DEFAULT_NAMESPACE};
    use crate::snapshot::{ApmServerStats, StaticSnapshot};
    use std::sync::Arc;

    fn collector(stats: ApmServerStats, namespace: &str) -> Collector<ApmServerStats> {
        Collector::new(
            apm_server_catalog(namespace).unwrap(),
            Arc::new(StaticSnapshot::new(stats)),
        )
    }

    #[test]
    fn test_encode_exposes_labeled_series() {
        let mut stats = ApmServerStats::default();
        stats.root.response.errors.notfound = 7.0;
        stats.decoder.deflate.content_length = 300.0;

        let registry = ExporterRegistry::new();
        registry.register(collector(stats, DEFAULT_NAMESPACE)).unwrap();
        let output = registry.encode().unwrap();

        assert!(output.contains("# TYPE apm_server_root_response_errors counter"));
        assert!(output.contains(
            "# HELP apm_server_root_response_errors apm-server.root.response.errors"
        ));
        assert!(output.contains(r#"apm_server_root_response_errors{error="notfound"} 7"#));
        assert!(output.contains(r#"apm_server_root_response_errors{error="closed"} 0"#));
        assert!(output.contains(r#"apm_server_decoder_deflate{content_length="bytes"} 300"#));
        assert!(output.contains("apm_server_sampling_transactions_dropped 0"));
    }

    #[test]
    fn test_register_twice_fails() {
        let registry = ExporterRegistry::new();
        registry
            .register(collector(ApmServerStats::default(), DEFAULT_NAMESPACE))
            .unwrap();
        assert!(registry
            .register(collector(ApmServerStats::default(), DEFAULT_NAMESPACE))
            .is_err());
    }

    #[test]
    fn test_distinct_namespaces_coexist() {
        let registry = ExporterRegistry::new();
        registry
            .register(collector(ApmServerStats::default(), "primary"))
            .unwrap();
        registry
            .register(collector(ApmServerStats::default(), "replica"))
            .unwrap();

        let output = registry.encode().unwrap();
        assert!(output.contains("primary_acm_unset 0"));
        assert!(output.contains("replica_acm_unset 0"));
    }
}
