//! List-keys command - prints every live key in ascending order.

use std::path::Path;

use anyhow::Result;

use super::open_engine;

pub fn run(dir: &Path) -> Result<()> {
    let engine = open_engine(dir)?;
    let keys = engine.list_keys()?;
    for key in &keys {
        println!("{}", String::from_utf8_lossy(key));
    }
    println!("({} keys)", keys.len());
    engine.close()?;
    Ok(())
}
