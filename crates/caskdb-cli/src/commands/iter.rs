//! Iter command - walks live keys/values with an optional prefix filter.

use std::path::Path;

use anyhow::Result;
use caskdb_types::IteratorOptions;

use super::open_engine;

pub fn run(dir: &Path, prefix: &str, reverse: bool) -> Result<()> {
    let engine = open_engine(dir)?;
    let opts = IteratorOptions {
        reverse,
        prefix: prefix.as_bytes().to_vec(),
    };
    let mut it = engine.iter(opts);
    let mut count = 0usize;
    while it.has_next() {
        let key = it.key().expect("has_next implies key").to_vec();
        let value = it.value()?.expect("has_next implies value");
        println!(
            "{}\t{}",
            String::from_utf8_lossy(&key),
            String::from_utf8_lossy(&value)
        );
        count += 1;
        it.next();
    }
    drop(it);
    println!("({count} entries)");
    engine.close()?;
    Ok(())
}
