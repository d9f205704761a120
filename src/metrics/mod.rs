//! Metric catalog and scrape-time evaluation.
//!
//! The catalog is declared once, as a table of snapshot paths, and turned
//! into an immutable list of series descriptors. On every scrape the
//! [`Collector`] fetches one snapshot and reads each series from it.
//!
//! # Series exported for APM server statistics
//!
//! Names are `<namespace>_<subsystem>_<metric>`; the default namespace is
//! `apm_server`.
//!
//! ## Endpoints (`acm`, `profile`, `root`, `server`, `sourcemap`)
//! - `<ns>_<endpoint>_request_count`, `<ns>_<endpoint>_response_count`
//! - `<ns>_<endpoint>_response_errors{error="closed|decode|forbidden|..."}`
//! - `<ns>_<endpoint>_response_errors_count`
//! - `<ns>_<endpoint>_response_valid{status="accepted|notmodified|ok"}`
//!   (`sourcemap` uses `valid="accepted|count|notmodified|ok"`)
//! - `<ns>_<endpoint>_response_valid_count`, `<ns>_<endpoint>_unset`
//!
//! ## Decoder
//! - `<ns>_decoder_{deflate,gzip,uncompressed}{content_length="bytes"}`
//! - `<ns>_decoder_{deflate,gzip,uncompressed}_count`
//! - `<ns>_decoder_missing_content_length_count`, `<ns>_decoder_reader_count`
//!
//! ## Jaeger
//! - `<ns>_jaeger_{grpc_collect,grpc_sampling,http}_event_{dropped,received}_count`
//! - `<ns>_jaeger_{grpc_collect,grpc_sampling,http}_request_count`
//! - `<ns>_jaeger_{grpc_collect,grpc_sampling,http}_response_{,errors_,valid_}count`
//!
//! ## Processor
//! - `<ns>_processor_errors{error="frames|stacktraces|transformations"}`
//! - `<ns>_processor_spans{span="frames|stacktraces|transformations"}`
//! - `<ns>_processor_sourcemap_{decoding,validation}{<step>="count|errors"}`
//! - `<ns>_processor_stream_errors{error="closed|invalid|queue|server|toolarge"}`
//! - `<ns>_processor_{metric,transaction}_transformations`,
//!   `<ns>_processor_sourcemap_counter`, `<ns>_processor_stream_accepted`
//!
//! ## Sampling
//! - `<ns>_sampling_transactions_dropped`
//!
//! # Example
//!
//! ```no_run
//! use apm_exporter::metrics::{apm_server_catalog, Collector, ExporterRegistry};
//! use apm_exporter::snapshot::{ApmServerStats, SharedSnapshot};
//! use std::sync::Arc;
//!
//! let snapshots = Arc::new(SharedSnapshot::<ApmServerStats>::new());
//! let catalog = apm_server_catalog("apm_server").expect("valid catalog");
//! let collector = Collector::new(catalog, snapshots.clone());
//!
//! let registry = ExporterRegistry::new();
//! registry.register(collector).expect("unique series");
//!
//! // The fetch loop publishes each decoded stats payload...
//! snapshots.publish(ApmServerStats::default());
//! // ...and every scrape evaluates the catalog against the latest one.
//! let text = registry.encode().expect("encodable");
//! ```

mod apm_catalog;
mod catalog;
mod collector;
mod descriptor;
mod registry;

pub use apm_catalog::{apm_server_catalog, apm_server_entries, DEFAULT_NAMESPACE, HELP_PREFIX};
pub use catalog::{Catalog, CatalogEntry, CatalogError};
pub use collector::{Collector, Sample};
pub use descriptor::{FieldPath, MetricDescriptor, MetricKind};
pub use registry::{ExporterRegistry, MetricsError};
