//! Init command - writes a starting `caskdb.toml` for a new store directory.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use caskdb_config::{CaskConfig, CONFIG_FILE_NAME};
use owo_colors::OwoColorize;

pub fn run(dir: &Path) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        anyhow::bail!(
            "{} already exists in {}",
            CONFIG_FILE_NAME,
            dir.display()
        );
    }

    fs::create_dir_all(dir).context("failed to create store directory")?;

    let mut config = CaskConfig::default();
    config.storage.dir_path = dir.join(".caskdb").join("data");
    let rendered = config
        .to_toml_string()
        .context("failed to render default configuration")?;
    fs::write(&config_path, rendered).context("failed to write caskdb.toml")?;

    println!("{} wrote {}", "✓".green().bold(), config_path.display());
    println!("  storage dir: {}", config.storage.dir_path.display());
    Ok(())
}
