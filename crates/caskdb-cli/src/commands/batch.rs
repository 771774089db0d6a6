//! Batch command - stages and atomically commits several put/delete ops.

use std::path::Path;

use anyhow::{bail, Context, Result};
use owo_colors::OwoColorize;

use super::open_engine;

/// Parses one `put:key:value` or `del:key` operation string.
enum Op {
    Put(String, String),
    Delete(String),
}

fn parse_op(raw: &str) -> Result<Op> {
    let mut parts = raw.splitn(3, ':');
    let kind = parts.next().context("empty batch operation")?;
    match kind {
        "put" => {
            let key = parts.next().context("put op missing key")?.to_string();
            let value = parts.next().context("put op missing value")?.to_string();
            Ok(Op::Put(key, value))
        }
        "del" => {
            let key = parts.next().context("del op missing key")?.to_string();
            Ok(Op::Delete(key))
        }
        other => bail!("unknown batch op kind {other:?}; expected \"put\" or \"del\""),
    }
}

pub fn run(dir: &Path, ops: &[String]) -> Result<()> {
    let engine = open_engine(dir)?;
    let batch = engine.new_batch();
    for raw in ops {
        match parse_op(raw)? {
            Op::Put(key, value) => batch.put(key.as_bytes(), value.as_bytes())?,
            Op::Delete(key) => batch.delete(key.as_bytes())?,
        }
    }
    batch.commit()?;
    println!("{} committed {} operations", "✓".green().bold(), ops.len());
    engine.close()?;
    Ok(())
}
