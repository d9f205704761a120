//! Snapshot sources.
//!
//! The evaluation pass asks a [`SnapshotProvider`] for exactly one snapshot
//! per scrape. Fetching the stats payload over the network belongs to the
//! exporter shell; the providers here cover fixed values, a cell written by
//! an external fetch loop, and a file on disk.

use super::FieldLookup;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// Errors that can occur while fetching a snapshot.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The source has no snapshot to hand out.
    #[error("snapshot source unavailable: {0}")]
    Unavailable(String),
    /// Reading the snapshot failed.
    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),
    /// The snapshot could not be decoded.
    #[error("failed to parse snapshot: {0}")]
    Parse(String),
    /// A counter is negative or not a finite number.
    #[error("invalid value {value} at {path}")]
    InvalidValue {
        /// Dotted path of the offending leaf.
        path: String,
        /// The value that was read.
        value: f64,
    },
}

/// Checks that every leaf of `snapshot` is a finite, non-negative number.
///
/// Returns the first offending leaf in declaration order.
pub fn validate_leaves<S: FieldLookup>(snapshot: &S) -> Result<(), FetchError> {
    let mut invalid = None;
    snapshot.for_each_leaf(|path, value| {
        if invalid.is_none() && !(value.is_finite() && value >= 0.0) {
            invalid = Some(FetchError::InvalidValue {
                path: path.join("."),
                value,
            });
        }
    });
    invalid.map_or(Ok(()), Err)
}

/// Supplies the latest immutable snapshot on demand.
///
/// Implementations may block. They must be safe to call from concurrent
/// scrapes.
pub trait SnapshotProvider<S>: Send + Sync {
    /// Returns the most recent snapshot.
    fn fetch_snapshot(&self) -> Result<Arc<S>, FetchError>;
}

/// Always serves the same snapshot.
#[derive(Debug, Default)]
pub struct StaticSnapshot<S> {
    snapshot: Arc<S>,
}

impl<S> StaticSnapshot<S> {
    /// Serves `snapshot` on every fetch.
    pub fn new(snapshot: S) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
        }
    }
}

impl<S: Send + Sync> SnapshotProvider<S> for StaticSnapshot<S> {
    fn fetch_snapshot(&self) -> Result<Arc<S>, FetchError> {
        Ok(Arc::clone(&self.snapshot))
    }
}

/// A snapshot cell replaced wholesale by an external fetch loop.
///
/// Scrapes clone the current `Arc`, so a pass keeps reading the snapshot it
/// started with even if a newer one is published meanwhile.
#[derive(Debug)]
pub struct SharedSnapshot<S> {
    current: RwLock<Option<Arc<S>>>,
}

impl<S> Default for SharedSnapshot<S> {
    fn default() -> Self {
        Self {
            current: RwLock::new(None),
        }
    }
}

impl<S> SharedSnapshot<S> {
    /// Creates an empty cell; fetching fails until a snapshot is published.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current snapshot.
    pub fn publish(&self, snapshot: S) {
        let snapshot = Arc::new(snapshot);
        match self.current.write() {
            Ok(mut current) => *current = Some(snapshot),
            Err(poisoned) => *poisoned.into_inner() = Some(snapshot),
        }
        tracing::trace!("Published new snapshot");
    }

    /// Drops the current snapshot, e.g. after the monitored process went away.
    pub fn clear(&self) {
        match self.current.write() {
            Ok(mut current) => *current = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }
}

impl<S: Send + Sync> SnapshotProvider<S> for SharedSnapshot<S> {
    fn fetch_snapshot(&self) -> Result<Arc<S>, FetchError> {
        // Writers only ever store a whole `Arc`, so a poisoned cell still
        // holds a complete snapshot.
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        current
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| FetchError::Unavailable("no snapshot published yet".to_string()))
    }
}

/// Reads a TOML rendition of the snapshot from disk on every fetch.
///
/// Missing counters decode as zero. A negative or non-finite counter fails
/// the fetch with [`FetchError::InvalidValue`].
#[derive(Debug, Clone)]
pub struct FileSnapshotProvider {
    path: PathBuf,
}

impl FileSnapshotProvider {
    /// Reads snapshots from the TOML file at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns the file this provider reads.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<S> SnapshotProvider<S> for FileSnapshotProvider
where
    S: DeserializeOwned + FieldLookup + Send + Sync,
{
    fn fetch_snapshot(&self) -> Result<Arc<S>, FetchError> {
        let content = std::fs::read_to_string(&self.path)?;
        let snapshot: S =
            toml::from_str(&content).map_err(|e| FetchError::Parse(e.to_string()))?;
        validate_leaves(&snapshot)?;
        tracing::debug!(path = %self.path.display(), "Read snapshot file");
        Ok(Arc::new(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::ApmServerStats;
    use std::io::Write;
    use std::thread;

    fn fetch_file(content: &str) -> Result<Arc<ApmServerStats>, FetchError> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", content).unwrap();
        FileSnapshotProvider::new(file.path()).fetch_snapshot()
    }

    #[test]
    fn test_static_snapshot_returns_same_value() {
        let mut stats = ApmServerStats::default();
        stats.acm.unset = 2.0;
        let provider = StaticSnapshot::new(stats.clone());

        let first = provider.fetch_snapshot().unwrap();
        let second = provider.fetch_snapshot().unwrap();
        assert_eq!(*first, stats);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_shared_snapshot_starts_unavailable() {
        let provider: SharedSnapshot<ApmServerStats> = SharedSnapshot::new();
        assert!(matches!(
            provider.fetch_snapshot(),
            Err(FetchError::Unavailable(_))
        ));
    }

    #[test]
    fn test_shared_snapshot_publish_replaces_value() {
        let provider = SharedSnapshot::new();
        let mut stats = ApmServerStats::default();

        stats.server.request.count = 3.0;
        provider.publish(stats.clone());
        let held = provider.fetch_snapshot().unwrap();

        stats.server.request.count = 5.0;
        provider.publish(stats);

        assert_eq!(held.server.request.count, 3.0);
        assert_eq!(provider.fetch_snapshot().unwrap().server.request.count, 5.0);

        provider.clear();
        assert!(provider.fetch_snapshot().is_err());
    }

    #[test]
    fn test_file_provider_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sampling]\ntransactions_dropped = 12").unwrap();

        let provider = FileSnapshotProvider::new(file.path());
        let stats: Arc<ApmServerStats> = provider.fetch_snapshot().unwrap();
        assert_eq!(stats.sampling.transactions_dropped, 12.0);
    }

    #[test]
    fn test_file_provider_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileSnapshotProvider::new(dir.path().join("absent.toml"));
        let result: Result<Arc<ApmServerStats>, _> = provider.fetch_snapshot();
        assert!(matches!(result, Err(FetchError::Io(_))));
    }

    #[test]
    fn test_file_provider_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sampling\ntransactions_dropped = ").unwrap();

        let provider = FileSnapshotProvider::new(file.path());
        let result: Result<Arc<ApmServerStats>, _> = provider.fetch_snapshot();
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_shared_snapshot_survives_poisoned_lock() {
        let provider = Arc::new(SharedSnapshot::<ApmServerStats>::new());
        let mut stats = ApmServerStats::default();
        stats.acm.unset = 4.0;
        provider.publish(stats.clone());

        let writer = Arc::clone(&provider);
        let result = thread::spawn(move || {
            let _guard = writer.current.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();
        assert!(result.is_err());
        assert!(provider.current.is_poisoned());

        assert_eq!(*provider.fetch_snapshot().unwrap(), stats);

        stats.acm.unset = 6.0;
        provider.publish(stats);
        assert_eq!(provider.fetch_snapshot().unwrap().acm.unset, 6.0);
    }

    #[test]
    fn test_file_provider_rejects_negative_counter() {
        let result = fetch_file("[root.request]\ncount = -3.0");
        match result {
            Err(FetchError::InvalidValue { path, value }) => {
                assert_eq!(path, "root.request.count");
                assert_eq!(value, -3.0);
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_file_provider_rejects_nan_counter() {
        let result = fetch_file("[root.response]\ncount = nan");
        assert!(matches!(
            result,
            Err(FetchError::InvalidValue { ref path, value })
                if path == "root.response.count" && value.is_nan()
        ));
    }

    #[test]
    fn test_file_provider_rejects_infinite_counter() {
        let result = fetch_file("[server.request]\ncount = inf");
        assert!(matches!(
            result,
            Err(FetchError::InvalidValue { ref path, value })
                if path == "server.request.count" && value == f64::INFINITY
        ));
    }

    #[test]
    fn test_file_provider_accepts_zero_and_integers() {
        let stats = fetch_file("[root.request]\ncount = 0\n[acm]\nunset = 2").unwrap();
        assert_eq!(stats.root.request.count, 0.0);
        assert_eq!(stats.acm.unset, 2.0);
    }

    #[test]
    fn test_validate_leaves_reports_first_offender() {
        let mut stats = ApmServerStats::default();
        assert!(validate_leaves(&stats).is_ok());

        stats.decoder.gzip.count = -1.0;
        stats.server.unset = f64::NAN;
        match validate_leaves(&stats) {
            Err(FetchError::InvalidValue { path, .. }) => {
                assert_eq!(path, "decoder.gzip.count");
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }
}
