//! APM Exporter Library
//!
//! Turns the nested statistics snapshot of an APM server into flat,
//! labeled Prometheus series.
//!
//! # Architecture
//!
//! ```text
//! snapshot provider → collector (catalog × snapshot) → prometheus registry
//! ```
//!
//! The catalog is declared once per exporter instance from a namespace and
//! a table of snapshot paths. Each scrape fetches exactly one snapshot and
//! evaluates every series against it.
//!
//! # Design Principles
//!
//! - **Stable names**: series names are a compatibility contract; the
//!   catalog fails to build rather than export colliding identities
//! - **Consistent scrapes**: all samples of a pass come from one snapshot
//! - **Degrade to zero**: an unreachable server yields a complete scrape
//!   with every value zero, never a partial one
//!
//! # Example
//!
//! ```no_run
//! use apm_exporter::{apm_server_catalog, ApmServerStats, Collector, StaticSnapshot};
//! use std::sync::Arc;
//!
//! let mut stats = ApmServerStats::default();
//! stats.root.response.errors.notfound = 7.0;
//!
//! let catalog = apm_server_catalog("apm_server").unwrap();
//! let collector = Collector::new(catalog, Arc::new(StaticSnapshot::new(stats)));
//!
//! for sample in collector.collect() {
//!     println!("{} {:?} {}", sample.name(), sample.descriptor.labels(), sample.value);
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod metrics;
pub mod snapshot;

// Re-export commonly used types at crate root
pub use config::{ConfigError, ExporterConfig};
pub use metrics::{
    apm_server_catalog, Catalog, CatalogEntry, CatalogError, Collector, ExporterRegistry,
    MetricDescriptor, MetricKind, Sample,
};
pub use snapshot::{
    ApmServerStats, FetchError, FieldLookup, FileSnapshotProvider, SharedSnapshot,
    SnapshotProvider, StaticSnapshot,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
