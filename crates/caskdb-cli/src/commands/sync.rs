//! Sync command - fsyncs the active segment.

use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;

use super::open_engine;

pub fn run(dir: &Path) -> Result<()> {
    let engine = open_engine(dir)?;
    engine.sync()?;
    println!("{} synced", "✓".green().bold());
    engine.close()?;
    Ok(())
}
