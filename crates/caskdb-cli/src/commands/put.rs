//! Put command - writes a single key/value pair.

use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;

use super::open_engine;

pub fn run(dir: &Path, key: &str, value: &str, sync: bool) -> Result<()> {
    let engine = open_engine(dir)?;
    engine.put(key.as_bytes(), value.as_bytes())?;
    if sync {
        engine.sync()?;
    }
    println!("{} put {key:?}", "✓".green().bold());
    engine.close()?;
    Ok(())
}
