//! Exporter configuration.
//!
//! The namespace prefixes every exported series name and is part of the
//! compatibility contract with dashboards, so it is validated before the
//! catalog is built.

use crate::metrics::DEFAULT_NAMESPACE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Exporter identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterSection {
    /// Prefix of every series name.
    pub namespace: String,
}

impl Default for ExporterSection {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

/// Where snapshots are read from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotSection {
    /// TOML snapshot file read on every scrape. Without one, every series
    /// reads zero.
    pub path: Option<PathBuf>,
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// The namespace is not a valid series name prefix.
    #[error("invalid namespace `{0}` (expected [a-z_][a-z0-9_]*)")]
    InvalidNamespace(String),
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The file is not valid TOML for this format.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Series naming.
    #[serde(default)]
    pub exporter: ExporterSection,
    /// Snapshot source.
    #[serde(default)]
    pub snapshot: SnapshotSection,
}

impl ExporterConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config: ExporterConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let namespace = &self.exporter.namespace;
        let mut chars = namespace.chars();
        let valid = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
            && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid {
            return Err(ConfigError::InvalidNamespace(namespace.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_valid() {
        let config = ExporterConfig::default();
        assert_eq!(config.exporter.namespace, "apm_server");
        assert!(config.snapshot.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_namespace() {
        let mut config = ExporterConfig::default();
        config.exporter.namespace = "apm-server".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidNamespace(_))
        ));

        config.exporter.namespace = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[exporter]\nnamespace = \"apm_edge\"\n\n[snapshot]\npath = \"/var/lib/apm/stats.toml\""
        )
        .unwrap();

        let config = ExporterConfig::from_file(file.path()).unwrap();
        assert_eq!(config.exporter.namespace, "apm_edge");
        assert_eq!(
            config.snapshot.path.as_deref(),
            Some(Path::new("/var/lib/apm/stats.toml"))
        );
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: ExporterConfig = toml::from_str("").unwrap();
        assert_eq!(config.exporter.namespace, "apm_server");
    }

    #[test]
    fn test_from_file_rejects_bad_namespace() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[exporter]\nnamespace = \"APM\"").unwrap();
        assert!(matches!(
            ExporterConfig::from_file(file.path()),
            Err(ConfigError::InvalidNamespace(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ExporterConfig::from_file("/nonexistent/apm-exporter.toml"),
            Err(ConfigError::FileReadError(_))
        ));
    }
}
