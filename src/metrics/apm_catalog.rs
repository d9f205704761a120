//! Catalog table for APM server statistics.
//!
//! Series names produced here are relied upon by existing dashboards and
//! alerts and must not change. Response, stream and frame groups are fixed
//! enumerations of outcomes and are exported as one labeled family each;
//! `count` leaves next to them are independent totals with their own name.

use super::catalog::{Catalog, CatalogEntry, CatalogError};
use crate::snapshot::ApmServerStats;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "apm_server";

/// Upstream stats section; prefixes every help text.
pub const HELP_PREFIX: &str = "apm-server";

/// Response error kinds in upstream key order. `count` is the total.
const RESPONSE_ERRORS: [&str; 14] = [
    "closed",
    "count",
    "decode",
    "forbidden",
    "internal",
    "invalidquery",
    "method",
    "notfound",
    "queue",
    "ratelimit",
    "toolarge",
    "unauthorized",
    "unavailable",
    "validate",
];

const RESPONSE_VALID: [&str; 4] = ["accepted", "count", "notmodified", "ok"];

const STREAM_ERRORS: [&str; 5] = ["closed", "invalid", "queue", "server", "toolarge"];

const FRAME_COUNTERS: [&str; 3] = ["frames", "stacktraces", "transformations"];

const ENCODINGS: [&str; 3] = ["deflate", "gzip", "uncompressed"];

/// How the `count` leaf of a `response.valid` group is exported.
#[derive(Debug, Clone, Copy)]
enum ValidCount {
    /// Own series, `<subsystem>_response_valid_count`.
    Separate,
    /// Another value of the group's label.
    Labeled,
}

/// Builds the APM server catalog under `namespace`.
pub fn apm_server_catalog(namespace: &str) -> Result<Catalog<ApmServerStats>, CatalogError> {
    Catalog::build(namespace, HELP_PREFIX, apm_server_entries())
}

/// The full table, in export order.
pub fn apm_server_entries() -> Vec<CatalogEntry> {
    let mut entries = Vec::new();

    endpoint(&mut entries, "acm", "status", ValidCount::Separate);
    decoder(&mut entries);
    jaeger(&mut entries);
    processor(&mut entries);
    endpoint(&mut entries, "profile", "status", ValidCount::Separate);
    endpoint(&mut entries, "root", "status", ValidCount::Separate);
    entries.push(CatalogEntry::counter("sampling.transactions_dropped"));
    endpoint(&mut entries, "server", "status", ValidCount::Separate);
    endpoint(&mut entries, "sourcemap", "valid", ValidCount::Labeled);

    entries
}

fn endpoint(entries: &mut Vec<CatalogEntry>, subsystem: &str, valid_key: &str, count: ValidCount) {
    entries.push(CatalogEntry::counter(format!("{subsystem}.request.count")));
    entries.push(CatalogEntry::counter(format!("{subsystem}.response.count")));

    for kind in RESPONSE_ERRORS {
        let entry = CatalogEntry::counter(format!("{subsystem}.response.errors.{kind}"));
        entries.push(if kind == "count" {
            entry
        } else {
            entry.labeled("error")
        });
    }

    for status in RESPONSE_VALID {
        let entry = CatalogEntry::counter(format!("{subsystem}.response.valid.{status}"));
        entries.push(match count {
            ValidCount::Separate if status == "count" => entry,
            _ => entry.labeled(valid_key),
        });
    }

    entries.push(CatalogEntry::counter(format!("{subsystem}.unset")));
}

fn decoder(entries: &mut Vec<CatalogEntry>) {
    for (i, encoding) in ENCODINGS.into_iter().enumerate() {
        entries.push(
            CatalogEntry::counter(format!("decoder.{encoding}.content-length"))
                .labeled("content_length")
                .label_value("bytes"),
        );
        entries.push(CatalogEntry::counter(format!("decoder.{encoding}.count")));

        // Keep upstream key order: the plain counters sort between gzip and
        // uncompressed.
        if i == 1 {
            entries.push(CatalogEntry::counter("decoder.missing-content-length.count"));
            entries.push(CatalogEntry::counter("decoder.reader.count"));
        }
    }
}

fn jaeger(entries: &mut Vec<CatalogEntry>) {
    for endpoint in ["grpc.collect", "grpc.sampling", "http"] {
        for leaf in [
            "event.dropped.count",
            "event.received.count",
            "request.count",
            "response.count",
            "response.errors.count",
            "response.valid.count",
        ] {
            entries.push(CatalogEntry::counter(format!("jaeger.{endpoint}.{leaf}")));
        }
    }
}

fn processor(entries: &mut Vec<CatalogEntry>) {
    for leaf in FRAME_COUNTERS {
        entries.push(
            CatalogEntry::counter(format!("processor.error.{leaf}"))
                .labeled("error")
                .metric("errors"),
        );
    }
    entries.push(CatalogEntry::counter("processor.metric.transformations"));
    entries.push(CatalogEntry::counter("processor.sourcemap.counter"));
    for step in ["decoding", "validation"] {
        for leaf in ["count", "errors"] {
            entries.push(
                CatalogEntry::counter(format!("processor.sourcemap.{step}.{leaf}")).labeled(step),
            );
        }
    }
    for leaf in FRAME_COUNTERS {
        entries.push(
            CatalogEntry::counter(format!("processor.span.{leaf}"))
                .labeled("span")
                .metric("spans"),
        );
    }
    entries.push(CatalogEntry::counter("processor.stream.accepted"));
    for kind in STREAM_ERRORS {
        entries.push(
            CatalogEntry::counter(format!("processor.stream.errors.{kind}")).labeled("error"),
        );
    }
    entries.push(CatalogEntry::counter("processor.transaction.transformations"));
}
