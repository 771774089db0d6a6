//! Merge command - offline compaction (§4.G).

use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;

use super::open_engine;

pub fn run(dir: &Path) -> Result<()> {
    let engine = open_engine(dir)?;
    engine.merge()?;
    println!("{} merge complete", "✓".green().bold());
    engine.close()?;
    Ok(())
}
