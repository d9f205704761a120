//! Statistics snapshots and their sources.
//!
//! A snapshot is an immutable, fully-populated tree of counters taken from
//! the monitored process. Absent counters read as zero. The metric catalog
//! never touches a snapshot's fields directly; it goes through the
//! [`FieldLookup`] path walk declared for each group.

mod apm;
mod lookup;
mod provider;

pub use apm::{
    ApmServerStats, Count, Decoder, Encoding, Endpoint, Errors, Event, Frames, Grpc, Jaeger,
    JaegerEndpoint, Processor, Response, Sampling, Sourcemap, Stream, Tally, Transformations,
    Valid,
};
pub use lookup::FieldLookup;
pub use provider::{
    validate_leaves, FetchError, FileSnapshotProvider, SharedSnapshot, SnapshotProvider,
    StaticSnapshot,
};
