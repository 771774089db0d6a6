//! The storage engine: segment set, index, write/read path, and crash
//! recovery (§4.E, §4.E.1, §4.E.2).

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use caskdb_io::{IoBackend, SyncBackend};
use caskdb_types::{EngineOptions, IteratorOptions, RecordPos, RecordType, TxId};

use crate::batch::Batch;
use crate::error::CaskError;
use crate::iterator::CaskIterator;
use crate::merge;
use crate::record::{self, LogRecord};
use crate::segment::{self, Segment};

/// The mutable parts of an [`Engine`]: the segment set and the key index.
/// A single `RwLock` around this struct is the engine's entire concurrency
/// control (§5) — readers take a shared lock, writers (including batch
/// commit and merge) take it exclusively for the duration of their
/// operation.
pub(crate) struct EngineState {
    pub(crate) active: Segment,
    pub(crate) archived: BTreeMap<u32, Segment>,
    pub(crate) index: crate::index::KeyIndex,
}

/// An open Bitcask-style store rooted at a directory (§4.E).
pub struct Engine {
    pub(crate) dir_path: PathBuf,
    pub(crate) segment_size: u64,
    pub(crate) sync_writes: bool,
    pub(crate) bytes_per_sync: u64,
    pub(crate) io: Arc<dyn IoBackend>,
    pub(crate) state: RwLock<EngineState>,
    pub(crate) tx_id_counter: AtomicI64,
    pub(crate) merging: AtomicBool,
    bytes_since_sync: AtomicU64,
}

impl Engine {
    /// Opens (creating if missing) the engine directory named by
    /// `opts.dir_path`, replaying its log to rebuild the in-memory index
    /// before returning (§4.E Open, §4.E.1, §4.E.2).
    pub fn open(opts: EngineOptions) -> Result<Self, CaskError> {
        if opts.dir_path.as_os_str().is_empty() {
            return Err(CaskError::InvalidConfig {
                reason: "dir_path must not be empty".to_string(),
            });
        }
        if opts.segment_size == 0 {
            return Err(CaskError::InvalidConfig {
                reason: "segment_size must be positive".to_string(),
            });
        }

        fs::create_dir_all(&opts.dir_path)?;
        let io: Arc<dyn IoBackend> = Arc::new(SyncBackend::new());

        let mut ids: Vec<u32> = fs::read_dir(&opts.dir_path)?
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().and_then(|ext| ext.to_str()) != Some("data") {
                    return None;
                }
                let stem = path.file_stem()?.to_str()?.to_string();
                segment::parse_segment_id(&stem)
            })
            .collect();
        ids.sort_unstable();

        let (mut archived, mut active) = if ids.is_empty() {
            tracing::info!(dir = %opts.dir_path.display(), "initializing empty data directory");
            let active = Segment::open(io.clone(), &opts.dir_path, 0, true)?;
            (BTreeMap::new(), active)
        } else {
            let active_id = *ids.last().expect("non-empty");
            let mut archived = BTreeMap::new();
            for &id in &ids[..ids.len() - 1] {
                archived.insert(id, Segment::open(io.clone(), &opts.dir_path, id, false)?);
            }
            let active = Segment::open(io.clone(), &opts.dir_path, active_id, true)?;
            tracing::info!(
                dir = %opts.dir_path.display(),
                active_id,
                archived = archived.len(),
                "discovered existing segments"
            );
            (archived, active)
        };

        let mut index = crate::index::KeyIndex::new();
        let max_tx_id = recover(&opts.dir_path, &mut archived, &mut active, &mut index)?;

        Ok(Self {
            dir_path: opts.dir_path,
            segment_size: opts.segment_size,
            sync_writes: opts.sync_writes,
            bytes_per_sync: opts.bytes_per_sync,
            io,
            state: RwLock::new(EngineState {
                active,
                archived,
                index,
            }),
            tx_id_counter: AtomicI64::new(max_tx_id),
            merging: AtomicBool::new(false),
            bytes_since_sync: AtomicU64::new(0),
        })
    }

    /// Appends a `Normal` record for `key`/`value`, replacing any existing
    /// mapping for `key` in the index (§4.E Put).
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<(), CaskError> {
        if key.is_empty() {
            return Err(CaskError::EmptyKey);
        }
        let mut state = self.state.write().expect("engine lock poisoned");
        let stored_key = record::encode_tx_key(TxId::NON_TRANSACTIONAL, key);
        let pos = append_locked(
            &mut state,
            &self.io,
            &self.dir_path,
            self.segment_size,
            stored_key,
            value.to_vec(),
            RecordType::Normal,
        )?;
        state.index.put(key.to_vec(), pos);
        self.maybe_sync(&state, u64::from(pos.size))
    }

    /// Appends a `Deleted` tombstone for `key` and removes it from the
    /// index. Returns `KeyNotFound` if `key` has no current mapping
    /// (§4.E Delete).
    pub fn delete(&self, key: &[u8]) -> Result<(), CaskError> {
        if key.is_empty() {
            return Err(CaskError::EmptyKey);
        }
        let mut state = self.state.write().expect("engine lock poisoned");
        if state.index.get(key).is_none() {
            return Err(CaskError::KeyNotFound);
        }
        let stored_key = record::encode_tx_key(TxId::NON_TRANSACTIONAL, key);
        let pos = append_locked(
            &mut state,
            &self.io,
            &self.dir_path,
            self.segment_size,
            stored_key,
            Vec::new(),
            RecordType::Deleted,
        )?;
        state.index.delete(key);
        self.maybe_sync(&state, u64::from(pos.size))
    }

    /// Looks up `key` and reads its current value, or a [`CaskError`] if the
    /// key is absent or tombstoned (§4.E Get).
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>, CaskError> {
        if key.is_empty() {
            return Err(CaskError::EmptyKey);
        }
        let state = self.state.read().expect("engine lock poisoned");
        let pos = state.index.get(key).ok_or(CaskError::KeyNotFound)?;
        let record = read_at_locked(&state, pos)?;
        let (_, real_key) = record::decode_tx_key(&record.key);
        if real_key != key {
            return Err(CaskError::IndexMissing);
        }
        match record.record_type {
            RecordType::Deleted => Err(CaskError::KeyDeleted),
            _ => Ok(record.value),
        }
    }

    /// Fsyncs the active segment (§4.E Sync).
    pub fn sync(&self) -> Result<(), CaskError> {
        let state = self.state.read().expect("engine lock poisoned");
        state.active.sync()
    }

    /// Closes every open segment handle, consuming the engine.
    pub fn close(self) -> Result<(), CaskError> {
        let state = self.state.into_inner().expect("engine lock poisoned");
        state.active.close()?;
        for (_, segment) in state.archived {
            segment.close()?;
        }
        Ok(())
    }

    /// Returns `(live_key_count, archived_segment_count, active_segment_id)`
    /// for diagnostics. Not part of the core read/write path; used by the
    /// CLI's `info` command.
    pub fn stats(&self) -> (usize, usize, u32) {
        let state = self.state.read().expect("engine lock poisoned");
        (state.index.size(), state.archived.len(), state.active.id())
    }

    /// Returns every live key in ascending order (§4.E List keys).
    pub fn list_keys(&self) -> Result<Vec<Vec<u8>>, CaskError> {
        let state = self.state.read().expect("engine lock poisoned");
        let mut it = state.index.iterate(&IteratorOptions::default());
        let mut keys = Vec::with_capacity(it.len());
        while it.has_next() {
            keys.push(it.key().expect("has_next implies key").to_vec());
            it.next();
        }
        Ok(keys)
    }

    /// Folds every live `(key, value)` pair, in ascending key order, through
    /// `f`. Stops early if `f` returns `false` (§4.E Fold).
    pub fn fold(&self, mut f: impl FnMut(&[u8], &[u8]) -> bool) -> Result<(), CaskError> {
        let state = self.state.read().expect("engine lock poisoned");
        let mut it = state.index.iterate(&IteratorOptions::default());
        while it.has_next() {
            let key = it.key().expect("has_next implies key").to_vec();
            let pos = it.value().expect("has_next implies value");
            let record = read_at_locked(&state, pos)?;
            if !f(&key, &record.value) {
                break;
            }
            it.next();
        }
        Ok(())
    }

    /// Starts a new atomic batch of staged writes (§4.F).
    pub fn new_batch(&self) -> Batch<'_> {
        Batch::new(self)
    }

    /// Starts a user-facing cursor over the index, honoring `opts` (§4.H).
    pub fn iter(&self, opts: IteratorOptions) -> CaskIterator<'_> {
        CaskIterator::new(self, opts)
    }

    /// Compacts archived segments into a new set plus a hint file (§4.G).
    pub fn merge(&self) -> Result<(), CaskError> {
        merge::run(self)
    }

    fn maybe_sync(&self, state: &EngineState, bytes_written: u64) -> Result<(), CaskError> {
        if self.sync_writes {
            state.active.sync()?;
            self.bytes_since_sync.store(0, Ordering::Relaxed);
            return Ok(());
        }
        if self.bytes_per_sync > 0 {
            let total = self.bytes_since_sync.fetch_add(bytes_written, Ordering::Relaxed)
                + bytes_written;
            if total >= self.bytes_per_sync {
                state.active.sync()?;
                self.bytes_since_sync.store(0, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

/// Appends one already-encoded-key record under a held write lock, rotating
/// to a fresh active segment first if the size threshold has been reached
/// (§4.E Append).
pub(crate) fn append_locked(
    state: &mut EngineState,
    io: &Arc<dyn IoBackend>,
    dir_path: &std::path::Path,
    segment_size: u64,
    stored_key: Vec<u8>,
    value: Vec<u8>,
    record_type: RecordType,
) -> Result<RecordPos, CaskError> {
    if state.active.write_offset() >= segment_size {
        let old_id = state.active.id();
        let new_id = old_id + 1;
        let new_active = Segment::open(io.clone(), dir_path, new_id, true)?;
        let old_active = std::mem::replace(&mut state.active, new_active);
        tracing::info!(old_id, new_id, "rotating active segment");
        state.archived.insert(old_id, old_active);
    }

    let record = LogRecord {
        key: stored_key,
        value,
        record_type,
    };
    let (bytes, total_len) = record::encode(&record);
    let offset = state.active.append(&bytes)?;
    Ok(RecordPos::new(state.active.id(), offset, total_len as u32))
}

/// Reads the record a [`RecordPos`] points at, resolving `active` vs.
/// `archived` by segment id.
pub(crate) fn read_at_locked(state: &EngineState, pos: RecordPos) -> Result<LogRecord, CaskError> {
    let segment = if pos.segment_id == state.active.id() {
        &state.active
    } else {
        state
            .archived
            .get(&pos.segment_id)
            .ok_or(CaskError::DataFileMissing {
                segment_id: pos.segment_id,
            })?
    };
    segment.read_record(pos.offset)
}

/// Replays the log to rebuild `index`, returning the highest `tx_id`
/// observed so the engine's counter can resume from it (§4.E.1, §4.E.2).
fn recover(
    dir: &std::path::Path,
    archived: &mut BTreeMap<u32, Segment>,
    active: &mut Segment,
    index: &mut crate::index::KeyIndex,
) -> Result<i64, CaskError> {
    let merge_set = merge::load_finished_segment_ids(dir)?;
    let mut max_tx_id: i64 = 0;

    if let Some(ids) = &merge_set {
        let hint_entries = merge::read_hint_file(&dir.join(merge::HINT_FILE_NAME))?;
        let count = hint_entries.len();
        for (key, pos) in hint_entries {
            index.put(key, pos);
        }
        tracing::info!(
            segments = ids.len(),
            entries = count,
            "recovered index entries from merge hint file"
        );
    }
    let skip = merge_set.unwrap_or_default();

    let mut pending: BTreeMap<TxId, BTreeMap<Vec<u8>, Option<RecordPos>>> = BTreeMap::new();

    for (&id, segment) in archived.iter() {
        if skip.contains(&id) {
            continue;
        }
        replay_segment(segment, index, &mut pending, &mut max_tx_id)?;
    }

    let active_offset = replay_segment(active, index, &mut pending, &mut max_tx_id)?;
    active.set_write_offset(active_offset);

    if !pending.is_empty() {
        tracing::warn!(
            buckets = pending.len(),
            "discarding uncommitted batch writes with no commit marker"
        );
    }

    Ok(max_tx_id)
}

/// Replays a single segment from offset 0, dispatching each record into
/// `index` (autocommit), `pending` (buffered batch writes), or draining
/// `pending` (a `TxComplete` marker). Returns the offset just past the last
/// record read — the segment's logical end.
fn replay_segment(
    segment: &Segment,
    index: &mut crate::index::KeyIndex,
    pending: &mut BTreeMap<TxId, BTreeMap<Vec<u8>, Option<RecordPos>>>,
    max_tx_id: &mut i64,
) -> Result<u64, CaskError> {
    let mut offset = 0u64;
    loop {
        let Some((record, consumed)) = segment.read_at(offset)? else {
            break;
        };
        let (tx_id, real_key) = record::decode_tx_key(&record.key);
        let real_key = real_key.to_vec();
        let pos = RecordPos::new(segment.id(), offset, consumed as u32);
        let autocommit = tx_id == TxId::NON_TRANSACTIONAL;

        match record.record_type {
            RecordType::TxComplete => {
                if let Some(bucket) = pending.remove(&tx_id) {
                    for (key, maybe_pos) in bucket {
                        match maybe_pos {
                            Some(p) => {
                                index.put(key, p);
                            }
                            None => {
                                index.delete(&key);
                            }
                        }
                    }
                }
                let tx_id_raw = i64::from(tx_id);
                if tx_id_raw > *max_tx_id {
                    *max_tx_id = tx_id_raw;
                }
            }
            RecordType::Normal if autocommit => {
                index.put(real_key, pos);
            }
            RecordType::Deleted if autocommit => {
                index.delete(&real_key);
            }
            RecordType::Normal => {
                pending.entry(tx_id).or_default().insert(real_key, Some(pos));
            }
            RecordType::Deleted => {
                pending.entry(tx_id).or_default().insert(real_key, None);
            }
        }

        offset += consumed as u64;
    }
    Ok(offset)
}
