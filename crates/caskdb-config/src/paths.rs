//! Path helpers: the config file name and the XDG default data directory.

use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use crate::ConfigError;

/// Name of the config file looked for in the current directory.
pub const CONFIG_FILE_NAME: &str = "caskdb.toml";

/// Resolves `caskdb.toml` under `dir`.
pub fn config_file(dir: impl AsRef<Path>) -> PathBuf {
    dir.as_ref().join(CONFIG_FILE_NAME)
}

/// The default store directory when none is given on the command line or in
/// a config file: the XDG data directory for `caskdb` (`~/.local/share/caskdb`
/// on Linux).
pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    ProjectDirs::from("dev", "caskdb", "caskdb")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(ConfigError::NoDefaultDataDir)
}
