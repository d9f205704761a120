//! APM server statistics schema.
//!
//! Mirrors the `apm-server` section of the monitored process's stats
//! payload. Every struct is `#[serde(default)]` so a payload that omits a
//! counter still decodes, with the counter reading zero.

use super::lookup::impl_field_lookup;
use serde::{Deserialize, Serialize};

/// Point-in-time statistics of one APM server process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApmServerStats {
    /// Agent configuration management endpoint.
    pub acm: Endpoint,
    /// Request body decoding.
    pub decoder: Decoder,
    /// Jaeger protocol gateway.
    pub jaeger: Jaeger,
    /// Event processing pipeline.
    pub processor: Processor,
    /// Profiling intake endpoint.
    pub profile: Endpoint,
    /// Root (`/`) endpoint.
    pub root: Endpoint,
    /// Tail-based sampling.
    pub sampling: Sampling,
    /// Intake server.
    pub server: Endpoint,
    /// Sourcemap upload endpoint.
    pub sourcemap: Sourcemap,
}

/// A plain counter group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Count {
    /// Number of occurrences.
    pub count: f64,
}

/// Response outcomes that ended in an error, one counter per kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Errors {
    /// Server shutting down.
    pub closed: f64,
    /// Total error responses.
    pub count: f64,
    /// Request body could not be decoded.
    pub decode: f64,
    /// Request not allowed.
    pub forbidden: f64,
    /// Internal server error.
    pub internal: f64,
    /// Malformed query string.
    pub invalidquery: f64,
    /// HTTP method not allowed.
    pub method: f64,
    /// Unknown route.
    pub notfound: f64,
    /// Event queue full.
    pub queue: f64,
    /// Rate limit exceeded.
    pub ratelimit: f64,
    /// Request body too large.
    pub toolarge: f64,
    /// Missing or invalid credentials.
    pub unauthorized: f64,
    /// Dependency unavailable.
    pub unavailable: f64,
    /// Event failed schema validation.
    pub validate: f64,
    /// Invalid event in a stream.
    pub invalid: f64,
    /// Server-side stream failure.
    pub server: f64,
}

/// Successful response outcomes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Valid {
    /// Request accepted for asynchronous processing.
    pub accepted: f64,
    /// Total successful responses.
    pub count: f64,
    /// Configuration unchanged since the agent's last poll.
    pub notmodified: f64,
    /// Request processed synchronously.
    pub ok: f64,
}

/// Responses written by an endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Response {
    /// Total responses.
    pub count: f64,
    /// Error responses by kind.
    pub errors: Errors,
    /// Successful responses by status.
    pub valid: Valid,
}

/// An HTTP endpoint with request and response accounting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoint {
    /// Requests received.
    pub request: Count,
    /// Responses written.
    pub response: Response,
    /// Responses whose outcome was never set.
    pub unset: f64,
}

/// Bytes and requests seen by one body encoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Encoding {
    /// Bytes read.
    #[serde(rename = "content-length")]
    pub content_length: f64,
    /// Requests decoded.
    pub count: f64,
}

/// Request body decoding, per content encoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Decoder {
    /// `deflate` bodies.
    pub deflate: Encoding,
    /// `gzip` bodies.
    pub gzip: Encoding,
    /// Requests without a `Content-Length` header.
    #[serde(rename = "missing-content-length")]
    pub missing_content_length: Count,
    /// Bodies read through a plain reader.
    pub reader: Count,
    /// Uncompressed bodies.
    pub uncompressed: Encoding,
}

/// Events handled by a Jaeger endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    /// Events dropped before processing.
    pub dropped: Count,
    /// Events received.
    pub received: Count,
}

/// A Jaeger intake endpoint (gRPC collect or HTTP).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JaegerEndpoint {
    /// Event counters.
    pub event: Event,
    /// Requests received.
    pub request: Count,
    /// Responses written.
    pub response: Response,
}

/// Sampling endpoints and tail-based sampling counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sampling {
    /// Event counters.
    pub event: Event,
    /// Requests received.
    pub request: Count,
    /// Responses written.
    pub response: Response,
    /// Transactions dropped by tail-based sampling.
    pub transactions_dropped: f64,
}

/// Jaeger gRPC services.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Grpc {
    /// Span collection service.
    pub collect: JaegerEndpoint,
    /// Sampling strategy service.
    pub sampling: Sampling,
}

/// Jaeger protocol gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Jaeger {
    /// gRPC services.
    pub grpc: Grpc,
    /// HTTP intake.
    pub http: JaegerEndpoint,
}

/// Stack trace processing counters shared by errors and spans.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Frames {
    /// Stack frames processed.
    pub frames: f64,
    /// Stack traces processed.
    pub stacktraces: f64,
    /// Events transformed.
    pub transformations: f64,
}

/// Events transformed by one processor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transformations {
    /// Events transformed.
    pub transformations: f64,
}

/// Attempts of one sourcemap step and how many of them failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tally {
    /// Attempts.
    pub count: f64,
    /// Failed attempts.
    pub errors: f64,
}

/// Sourcemap counters; the same shape appears at the top level and under
/// the processor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sourcemap {
    /// Sourcemaps applied.
    pub counter: f64,
    /// Sourcemap decoding.
    pub decoding: Tally,
    /// Sourcemap validation.
    pub validation: Tally,
    /// Upload requests received.
    pub request: Count,
    /// Upload responses written.
    pub response: Response,
    /// Responses whose outcome was never set.
    pub unset: f64,
}

/// Intake stream processing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stream {
    /// Events accepted from streams.
    pub accepted: f64,
    /// Stream errors by kind.
    pub errors: Errors,
}

/// Event processing pipeline, per event type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Processor {
    /// Error events.
    pub error: Frames,
    /// Metric events.
    pub metric: Transformations,
    /// Sourcemap application.
    pub sourcemap: Sourcemap,
    /// Span events.
    pub span: Frames,
    /// Intake streams.
    pub stream: Stream,
    /// Transaction events.
    pub transaction: Transformations,
}

impl_field_lookup!(ApmServerStats {} groups {
    "acm" => acm,
    "decoder" => decoder,
    "jaeger" => jaeger,
    "processor" => processor,
    "profile" => profile,
    "root" => root,
    "sampling" => sampling,
    "server" => server,
    "sourcemap" => sourcemap,
});

impl_field_lookup!(Count { "count" => count });

impl_field_lookup!(Errors {
    "closed" => closed,
    "count" => count,
    "decode" => decode,
    "forbidden" => forbidden,
    "internal" => internal,
    "invalidquery" => invalidquery,
    "method" => method,
    "notfound" => notfound,
    "queue" => queue,
    "ratelimit" => ratelimit,
    "toolarge" => toolarge,
    "unauthorized" => unauthorized,
    "unavailable" => unavailable,
    "validate" => validate,
    "invalid" => invalid,
    "server" => server,
});

impl_field_lookup!(Valid {
    "accepted" => accepted,
    "count" => count,
    "notmodified" => notmodified,
    "ok" => ok,
});

impl_field_lookup!(Response { "count" => count } groups {
    "errors" => errors,
    "valid" => valid,
});

impl_field_lookup!(Endpoint { "unset" => unset } groups {
    "request" => request,
    "response" => response,
});

impl_field_lookup!(Encoding {
    "content-length" => content_length,
    "count" => count,
});

impl_field_lookup!(Decoder {} groups {
    "deflate" => deflate,
    "gzip" => gzip,
    "missing-content-length" => missing_content_length,
    "reader" => reader,
    "uncompressed" => uncompressed,
});

impl_field_lookup!(Event {} groups {
    "dropped" => dropped,
    "received" => received,
});

impl_field_lookup!(JaegerEndpoint {} groups {
    "event" => event,
    "request" => request,
    "response" => response,
});

impl_field_lookup!(Sampling { "transactions_dropped" => transactions_dropped } groups {
    "event" => event,
    "request" => request,
    "response" => response,
});

impl_field_lookup!(Grpc {} groups {
    "collect" => collect,
    "sampling" => sampling,
});

impl_field_lookup!(Jaeger {} groups {
    "grpc" => grpc,
    "http" => http,
});

impl_field_lookup!(Frames {
    "frames" => frames,
    "stacktraces" => stacktraces,
    "transformations" => transformations,
});

impl_field_lookup!(Transformations { "transformations" => transformations });

impl_field_lookup!(Tally {
    "count" => count,
    "errors" => errors,
});

impl_field_lookup!(Sourcemap { "counter" => counter, "unset" => unset } groups {
    "decoding" => decoding,
    "validation" => validation,
    "request" => request,
    "response" => response,
});

impl_field_lookup!(Stream { "accepted" => accepted } groups {
    "errors" => errors,
});

impl_field_lookup!(Processor {} groups {
    "error" => error,
    "metric" => metric,
    "sourcemap" => sourcemap,
    "span" => span,
    "stream" => stream,
    "transaction" => transaction,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::FieldLookup;

    #[test]
    fn test_lookup_uses_upstream_key_spelling() {
        let mut stats = ApmServerStats::default();
        stats.decoder.deflate.content_length = 512.0;
        stats.decoder.missing_content_length.count = 3.0;

        assert_eq!(
            stats.lookup(&["decoder", "deflate", "content-length"]),
            Some(512.0)
        );
        assert_eq!(
            stats.lookup(&["decoder", "missing-content-length", "count"]),
            Some(3.0)
        );
        assert_eq!(stats.lookup(&["decoder", "deflate", "content_length"]), None);
    }

    #[test]
    fn test_lookup_reaches_deepest_leaf() {
        let mut stats = ApmServerStats::default();
        stats.jaeger.grpc.sampling.event.received.count = 11.0;

        let path = ["jaeger", "grpc", "sampling", "event", "received", "count"];
        assert_eq!(stats.lookup(&path), Some(11.0));
    }

    #[test]
    fn test_missing_fields_decode_as_zero() {
        let stats: ApmServerStats = toml::from_str(
            r#"
            [root.response.errors]
            notfound = 7

            [decoder.gzip]
            content-length = 2048
            "#,
        )
        .unwrap();

        assert_eq!(stats.root.response.errors.notfound, 7.0);
        assert_eq!(stats.decoder.gzip.content_length, 2048.0);
        assert_eq!(stats.root.response.errors.closed, 0.0);
        assert_eq!(stats.acm, Endpoint::default());
    }

    #[test]
    fn test_empty_document_is_zero_snapshot() {
        let stats: ApmServerStats = toml::from_str("").unwrap();
        assert_eq!(stats, ApmServerStats::default());
    }
}
