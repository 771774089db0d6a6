//! Layered config loading: defaults, `caskdb.toml`, then `CASKDB_*` env vars.

use std::env;
use std::path::{Path, PathBuf};

use crate::{paths, CaskConfig, ConfigError};

/// Builder for [`CaskConfig::load`].
pub struct ConfigLoader {
    dir: PathBuf,
    env_prefix: String,
}

impl ConfigLoader {
    /// A loader rooted at the current working directory, `CASKDB_` env prefix.
    pub fn new() -> Self {
        Self {
            dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "CASKDB".to_string(),
        }
    }

    /// Sets the directory `caskdb.toml` is looked for in, and that a relative
    /// or empty `storage.dir_path` resolves against.
    pub fn with_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dir = dir.as_ref().to_path_buf();
        self
    }

    /// Overrides the environment variable prefix (default `"CASKDB"`).
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Loads defaults, layers `caskdb.toml` if present, then `{prefix}_*`
    /// environment variables, and resolves `storage.dir_path`.
    pub fn load(self) -> Result<CaskConfig, ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&CaskConfig::default())?);

        let config_file = paths::config_file(&self.dir);
        if config_file.exists() {
            builder = builder.add_source(
                config::File::from(config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .separator("_")
                .try_parsing(true),
        );

        let built = builder.build()?;
        let mut cask_config: CaskConfig = built.try_deserialize()?;

        if cask_config.storage.dir_path.as_os_str().is_empty() {
            cask_config.storage.dir_path = self.dir.join(".caskdb").join("data");
        } else if cask_config.storage.dir_path.is_relative() {
            cask_config.storage.dir_path = self.dir.join(&cask_config.storage.dir_path);
        }

        Ok(cask_config)
    }

    /// Loads configuration, falling back to defaults entirely if loading
    /// fails (e.g. a malformed `caskdb.toml`).
    pub fn load_or_default(self) -> CaskConfig {
        let dir = self.dir.clone();
        self.load().unwrap_or_else(|_| {
            let mut config = CaskConfig::default();
            config.storage.dir_path = dir.join(".caskdb").join("data");
            config
        })
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
