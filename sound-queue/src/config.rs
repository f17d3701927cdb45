//! Configuration management (`<config dir>/config.toml`)
//!
//! Queue sizing and diagnostics settings, stored as TOML in the
//! platform-specific config directory under a `[queue]` table.
//!
//! ```toml
//! [queue]
//! latency_ms = 50
//! report_interval_ms = 1000
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Smallest latency target accepted (ms)
pub const MIN_LATENCY_MS: u32 = 5;
/// Largest latency target accepted (ms)
pub const MAX_LATENCY_MS: u32 = 1000;

/// Errors from loading an explicit config file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Top-level config file layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    queue: QueueConfig,
}

/// Sound queue configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Ring buffer latency target (default: 50, range: 5-1000)
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u32,
    /// Interval between metrics log lines, 0 disables (default: 1000)
    #[serde(default = "default_report_interval_ms")]
    pub report_interval_ms: u64,
}

fn default_latency_ms() -> u32 {
    50
}
fn default_report_interval_ms() -> u64 {
    1000
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
            report_interval_ms: default_report_interval_ms(),
        }
    }
}

impl QueueConfig {
    /// Latency target clamped to the supported range
    pub fn effective_latency_ms(&self) -> u32 {
        self.latency_ms.clamp(MIN_LATENCY_MS, MAX_LATENCY_MS)
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Linux: `~/.config/sound-queue`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.nethercore", "", "sound-queue")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Loads the configuration from the platform config directory.
///
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> QueueConfig {
    config_dir()
        .and_then(|dir| std::fs::read_to_string(dir.join("config.toml")).ok())
        .and_then(|content| toml::from_str::<ConfigFile>(&content).ok())
        .map(|file| file.queue)
        .unwrap_or_default()
}

/// Loads the configuration from an explicit path.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load_from(path: &Path) -> Result<QueueConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ConfigFile = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(file.queue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = QueueConfig::default();
        assert_eq!(config.latency_ms, 50);
        assert_eq!(config.report_interval_ms, 1000);
    }

    #[test]
    fn test_partial_table_uses_defaults() {
        let file: ConfigFile = toml::from_str("[queue]\nlatency_ms = 20\n").unwrap();
        assert_eq!(file.queue.latency_ms, 20);
        assert_eq!(file.queue.report_interval_ms, 1000);
    }

    #[test]
    fn test_missing_table_uses_defaults() {
        let file: ConfigFile = toml::from_str("").unwrap();
        assert_eq!(file.queue, QueueConfig::default());
    }

    #[test]
    fn test_latency_clamped() {
        let low = QueueConfig {
            latency_ms: 0,
            ..Default::default()
        };
        assert_eq!(low.effective_latency_ms(), MIN_LATENCY_MS);

        let high = QueueConfig {
            latency_ms: 60_000,
            ..Default::default()
        };
        assert_eq!(high.effective_latency_ms(), MAX_LATENCY_MS);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[queue]\nlatency_ms = 80\nreport_interval_ms = 0").unwrap();

        let config = load_from(file.path()).unwrap();
        assert_eq!(config.latency_ms, 80);
        assert_eq!(config.report_interval_ms, 0);
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_from_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[queue]\nlatency_ms = \"fast\"").unwrap();

        let err = load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
