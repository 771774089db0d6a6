//! CLI command implementations.

pub mod batch;
pub mod delete;
pub mod get;
pub mod info;
pub mod init;
pub mod iter;
pub mod list_keys;
pub mod merge;
pub mod put;
pub mod sync;
pub mod version;

use std::path::Path;

use anyhow::{Context, Result};
use caskdb_storage::Engine;

/// Opens the store at `dir` using `caskdb.toml`/env configuration layered
/// over `dir` itself, replaying its log before returning.
pub(crate) fn open_engine(dir: &Path) -> Result<Engine> {
    let mut config = caskdb_config::CaskConfig::load(dir)
        .with_context(|| format!("failed to load configuration for {}", dir.display()))?;
    config.storage.dir_path = dir.to_path_buf();
    let opts = config
        .engine_options()
        .context("invalid storage configuration")?;
    Engine::open(opts).with_context(|| format!("failed to open store at {}", dir.display()))
}
