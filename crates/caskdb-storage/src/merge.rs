//! Offline merge / compaction (§4.G).
//!
//! Rewrites every still-live record out of the archived segments into a
//! fresh segment set built in a side directory, emits a hint file mapping
//! each surviving key straight to its new position, and swaps the result
//! into place atomically (a `merge-finish.done` marker is the last thing
//! written, so a crash mid-merge leaves the original segments untouched).

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::atomic::Ordering;

use caskdb_types::{EngineOptions, RecordPos, RecordType};

use crate::engine::{append_locked, Engine};
use crate::error::CaskError;
use crate::record;
use crate::segment::{self, Segment};
use crate::varint;

pub(crate) const MERGE_DIR_NAME: &str = "merge";
pub(crate) const HINT_FILE_NAME: &str = "hint-index.hint";
pub(crate) const MERGE_FINISH_FILE_NAME: &str = "merge-finish.done";

/// Runs a merge against `engine`, holding its write lock for the whole
/// procedure. Refuses to start a second merge concurrently.
pub(crate) fn run(engine: &Engine) -> Result<(), CaskError> {
    if engine.merging.swap(true, Ordering::SeqCst) {
        return Err(CaskError::MergeInProgress);
    }
    let result = do_merge(engine);
    engine.merging.store(false, Ordering::SeqCst);
    result
}

fn do_merge(engine: &Engine) -> Result<(), CaskError> {
    let mut state = engine.state.write().expect("engine lock poisoned");

    let merge_dir = engine.dir_path.join(MERGE_DIR_NAME);
    if merge_dir.exists() {
        fs::remove_dir_all(&merge_dir)?;
    }
    fs::create_dir_all(&merge_dir)?;

    let finish_path = engine.dir_path.join(MERGE_FINISH_FILE_NAME);
    let hint_path = engine.dir_path.join(HINT_FILE_NAME);
    if finish_path.exists() {
        fs::remove_file(&finish_path)?;
    }
    if hint_path.exists() {
        fs::remove_file(&hint_path)?;
    }

    if state.archived.is_empty() {
        fs::remove_dir_all(&merge_dir)?;
        tracing::info!("merge skipped: no archived segments to compact");
        return Ok(());
    }

    // Segment ids are assigned from 0 inside the merge directory. Archived
    // ids are always strictly below the live active id (the active segment
    // is always the highest-numbered file), and a merge can never need more
    // segments than the archived set it replaces, so this can never collide
    // with the still-running active segment when it is swapped in below.
    let merge_engine = Engine::open(EngineOptions {
        dir_path: merge_dir.clone(),
        segment_size: engine.segment_size,
        sync_writes: false,
        bytes_per_sync: 0,
    })?;

    let mut hint_entries: Vec<(Vec<u8>, RecordPos)> = Vec::new();
    let archived_ids: Vec<u32> = state.archived.keys().copied().collect();

    for id in &archived_ids {
        let segment = state.archived.get(id).expect("listed id exists");
        let mut offset = 0u64;
        loop {
            let Some((rec, consumed)) = segment.read_at(offset)? else {
                break;
            };
            if rec.record_type == RecordType::Normal {
                let (_, real_key) = record::decode_tx_key(&rec.key);
                let real_key = real_key.to_vec();
                let still_live = state
                    .index
                    .get(&real_key)
                    .map(|live| live.segment_id == *id && live.offset == offset)
                    .unwrap_or(false);
                if still_live {
                    let mut merge_state = merge_engine.state.write().expect("merge engine lock poisoned");
                    let pos = append_locked(
                        &mut merge_state,
                        &merge_engine.io,
                        &merge_engine.dir_path,
                        merge_engine.segment_size,
                        rec.key.clone(),
                        rec.value.clone(),
                        RecordType::Normal,
                    )?;
                    drop(merge_state);
                    hint_entries.push((real_key, pos));
                }
            }
            offset += consumed as u64;
        }
    }

    write_hint_file(&hint_path, &hint_entries)?;

    let segment_ids: Vec<u32> = {
        let merge_state = merge_engine.state.read().expect("merge engine lock poisoned");
        let mut ids: Vec<u32> = merge_state.archived.keys().copied().collect();
        ids.push(merge_state.active.id());
        ids.sort_unstable();
        ids
    };

    merge_engine.sync()?;
    write_finish_file(&finish_path, &segment_ids)?;
    merge_engine.close()?;

    for id in &archived_ids {
        let segment = state.archived.remove(id).expect("listed id exists");
        segment.remove()?;
    }

    for &id in &segment_ids {
        let file_name = segment::segment_file_name(id);
        let from = merge_dir.join(&file_name);
        let to = engine.dir_path.join(&file_name);
        engine.io.rename(&from, &to)?;
        let installed = Segment::open(engine.io.clone(), &engine.dir_path, id, false)?;
        state.archived.insert(id, installed);
    }

    for (key, pos) in hint_entries {
        state.index.put(key, pos);
    }

    fs::remove_dir_all(&merge_dir)?;

    tracing::info!(
        segments = segment_ids.len(),
        live_keys = state.index.size(),
        "merge complete"
    );

    Ok(())
}

fn write_hint_file(path: &Path, entries: &[(Vec<u8>, RecordPos)]) -> Result<(), CaskError> {
    let mut buf = Vec::new();
    for (key, pos) in entries {
        varint::write_varint(&mut buf, key.len() as i64);
        buf.extend_from_slice(key);
        varint::write_varint(&mut buf, i64::from(pos.segment_id));
        varint::write_varint(&mut buf, pos.offset as i64);
        varint::write_varint(&mut buf, i64::from(pos.size));
    }
    fs::write(path, buf)?;
    Ok(())
}

/// Reads a hint file, or an empty list if none exists yet.
pub(crate) fn read_hint_file(path: &Path) -> Result<Vec<(Vec<u8>, RecordPos)>, CaskError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let data = fs::read(path)?;
    let mut entries = Vec::new();
    let mut cursor = 0usize;
    while cursor < data.len() {
        let key_len = read_varint_at(path, &data, &mut cursor, "key length")?;
        let key_len = key_len as usize;
        if cursor + key_len > data.len() {
            return Err(malformed(path, "key bytes run past end of file"));
        }
        let key = data[cursor..cursor + key_len].to_vec();
        cursor += key_len;
        let segment_id = read_varint_at(path, &data, &mut cursor, "segment id")?;
        let offset = read_varint_at(path, &data, &mut cursor, "offset")?;
        let size = read_varint_at(path, &data, &mut cursor, "size")?;
        entries.push((key, RecordPos::new(segment_id as u32, offset as u64, size as u32)));
    }
    Ok(entries)
}

fn write_finish_file(path: &Path, ids: &[u32]) -> Result<(), CaskError> {
    let mut buf = Vec::new();
    varint::write_varint(&mut buf, ids.len() as i64);
    for &id in ids {
        varint::write_varint(&mut buf, i64::from(id));
    }
    fs::write(path, buf)?;
    Ok(())
}

/// Reads `dir`'s `merge-finish.done` marker, returning the set of segment
/// ids a completed merge produced, or `None` if no marker is present (no
/// merge has ever completed in this directory, or a prior merge crashed
/// before finishing).
pub(crate) fn load_finished_segment_ids(dir: &Path) -> Result<Option<HashSet<u32>>, CaskError> {
    let finish_path = dir.join(MERGE_FINISH_FILE_NAME);
    if !finish_path.exists() {
        return Ok(None);
    }
    let data = fs::read(&finish_path)?;
    let mut cursor = 0usize;
    let count = read_varint_at(&finish_path, &data, &mut cursor, "entry count")?;
    let mut ids = HashSet::with_capacity(count.max(0) as usize);
    for _ in 0..count {
        let id = read_varint_at(&finish_path, &data, &mut cursor, "segment id")?;
        ids.insert(id as u32);
    }
    Ok(Some(ids))
}

fn read_varint_at(path: &Path, data: &[u8], cursor: &mut usize, what: &str) -> Result<i64, CaskError> {
    let (value, n) = varint::read_varint(&data[*cursor..]).ok_or_else(|| malformed(path, what))?;
    *cursor += n;
    Ok(value)
}

fn malformed(path: &Path, reason: &str) -> CaskError {
    CaskError::MalformedMergeState {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
