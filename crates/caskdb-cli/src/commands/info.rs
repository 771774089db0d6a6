//! Info command - shows key and segment counts for a store.

use std::path::Path;

use anyhow::Result;

use super::open_engine;

pub fn run(dir: &Path) -> Result<()> {
    let engine = open_engine(dir)?;
    let (live_keys, archived_segments, active_segment_id) = engine.stats();
    println!("Store Information");
    println!("------------------");
    println!("Directory:         {}", dir.display());
    println!("Live keys:         {live_keys}");
    println!("Archived segments: {archived_segments}");
    println!("Active segment:    {active_segment_id}");
    engine.close()?;
    Ok(())
}
