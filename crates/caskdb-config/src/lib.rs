//! Configuration loading for the `caskdb` CLI.
//!
//! Layers, lowest to highest precedence:
//!
//! 1. Built-in defaults.
//! 2. `caskdb.toml` in the directory the CLI was invoked against.
//! 3. Environment variables prefixed `CASKDB_` (e.g. `CASKDB_STORAGE_SEGMENT_SIZE`).
//!
//! The result converts directly into a [`caskdb_types::EngineOptions`] via
//! [`CaskConfig::engine_options`].

use std::path::{Path, PathBuf};

use caskdb_types::EngineOptions;
use serde::{Deserialize, Serialize};

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::{config_file, default_data_dir, CONFIG_FILE_NAME};

/// Top-level `caskdb` configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaskConfig {
    pub storage: StorageConfig,
    pub log: LogConfig,
}

/// Engine-facing settings (§4.E Open, §6 Configuration).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding segment files, hint file, and merge marker.
    pub dir_path: PathBuf,
    /// Per-segment rotation threshold, in bytes.
    pub segment_size: u64,
    /// Fsync the active segment after every write.
    pub sync_writes: bool,
    /// Fsync after this many bytes have accumulated since the last sync,
    /// even when `sync_writes` is false. `0` disables the threshold.
    pub bytes_per_sync: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir_path: PathBuf::new(),
            segment_size: EngineOptions::DEFAULT_SEGMENT_SIZE,
            sync_writes: false,
            bytes_per_sync: 0,
        }
    }
}

/// Logging settings for `tracing-subscriber`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// An `EnvFilter` directive string, e.g. `"info"` or `"caskdb_storage=debug"`.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CaskConfig {
    /// Loads configuration for `dir`, applying `caskdb.toml` (if present) and
    /// `CASKDB_*` environment overrides. Resolves a relative or empty
    /// `storage.dir_path` against `dir`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::new().with_dir(dir).load()
    }

    /// Renders this configuration as a pretty-printed TOML document, for
    /// `caskdb init` to write out as a starting `caskdb.toml`.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validates and converts this configuration into [`EngineOptions`].
    pub fn engine_options(&self) -> Result<EngineOptions, ConfigError> {
        if self.storage.dir_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "storage.dir_path must not be empty".to_string(),
            ));
        }
        if self.storage.segment_size == 0 {
            return Err(ConfigError::Validation(
                "storage.segment_size must be positive".to_string(),
            ));
        }
        Ok(EngineOptions {
            dir_path: self.storage.dir_path.clone(),
            segment_size: self.storage.segment_size,
            sync_writes: self.storage.sync_writes,
            bytes_per_sync: self.storage.bytes_per_sync,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_storage_defaults() {
        let config = CaskConfig::default();
        assert_eq!(config.storage.segment_size, EngineOptions::DEFAULT_SEGMENT_SIZE);
        assert!(!config.storage.sync_writes);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn engine_options_rejects_empty_dir_path() {
        let config = CaskConfig::default();
        assert!(config.engine_options().is_err());
    }

    #[test]
    fn engine_options_rejects_zero_segment_size() {
        let mut config = CaskConfig::default();
        config.storage.dir_path = PathBuf::from("/tmp/caskdb-test");
        config.storage.segment_size = 0;
        assert!(config.engine_options().is_err());
    }

    #[test]
    fn to_toml_string_round_trips_through_toml() {
        let config = CaskConfig::default();
        let rendered = config.to_toml_string().unwrap();
        let parsed: CaskConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.storage.segment_size, config.storage.segment_size);
    }

    #[test]
    fn engine_options_converts_valid_config() {
        let mut config = CaskConfig::default();
        config.storage.dir_path = PathBuf::from("/tmp/caskdb-test");
        let opts = config.engine_options().unwrap();
        assert_eq!(opts.dir_path, PathBuf::from("/tmp/caskdb-test"));
        assert_eq!(opts.segment_size, EngineOptions::DEFAULT_SEGMENT_SIZE);
    }
}
