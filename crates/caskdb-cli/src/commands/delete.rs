//! Delete command - removes a single key.

use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;

use super::open_engine;

pub fn run(dir: &Path, key: &str) -> Result<()> {
    let engine = open_engine(dir)?;
    engine.delete(key.as_bytes())?;
    println!("{} deleted {key:?}", "✓".green().bold());
    engine.close()?;
    Ok(())
}
