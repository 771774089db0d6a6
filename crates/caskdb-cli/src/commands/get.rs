//! Get command - reads a single key's value.

use std::path::Path;

use anyhow::Result;
use caskdb_storage::CaskError;

use super::open_engine;

pub fn run(dir: &Path, key: &str) -> Result<()> {
    let engine = open_engine(dir)?;
    match engine.get(key.as_bytes()) {
        Ok(value) => {
            println!("{}", String::from_utf8_lossy(&value));
            engine.close()?;
            Ok(())
        }
        Err(CaskError::KeyNotFound) => {
            engine.close()?;
            anyhow::bail!("key not found: {key:?}")
        }
        Err(CaskError::KeyDeleted) => {
            engine.close()?;
            anyhow::bail!("key was deleted: {key:?}")
        }
        Err(err) => {
            engine.close()?;
            Err(err.into())
        }
    }
}
