//! Atomic batches of staged writes (§4.F).

use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::sync::Mutex;

use caskdb_types::{RecordPos, RecordType, TxId};

use crate::engine::{append_locked, Engine};
use crate::error::CaskError;
use crate::record;

/// A set of `put`/`delete` operations staged for atomic commit.
///
/// Nothing staged here touches the log or the index until [`Batch::commit`]
/// runs; dropping a batch without committing simply discards it.
pub struct Batch<'a> {
    engine: &'a Engine,
    staged: Mutex<BTreeMap<Vec<u8>, Option<Vec<u8>>>>,
}

impl<'a> Batch<'a> {
    pub(crate) fn new(engine: &'a Engine) -> Self {
        Self {
            engine,
            staged: Mutex::new(BTreeMap::new()),
        }
    }

    /// Stages a put. Later calls for the same key within this batch
    /// override earlier ones.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<(), CaskError> {
        if key.is_empty() {
            return Err(CaskError::EmptyKey);
        }
        self.staged
            .lock()
            .expect("batch lock poisoned")
            .insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    /// Stages a delete. Unlike [`Engine::delete`], this does not require the
    /// key to currently exist — the tombstone is staged unconditionally
    /// (§4.F, batch delete note).
    pub fn delete(&self, key: &[u8]) -> Result<(), CaskError> {
        if key.is_empty() {
            return Err(CaskError::EmptyKey);
        }
        self.staged
            .lock()
            .expect("batch lock poisoned")
            .insert(key.to_vec(), None);
        Ok(())
    }

    /// Commits every staged operation atomically (§4.F):
    ///
    /// 1. Takes the engine's write lock for the whole commit.
    /// 2. Allocates a fresh transaction id.
    /// 3. Appends each staged record tagged with that id.
    /// 4. Appends a `TxComplete` marker under the same id.
    /// 5. Syncs the active segment.
    /// 6. Applies the staged effects to the in-memory index.
    ///
    /// A crash at any point before step 5 completes leaves every record this
    /// batch wrote invisible on the next open — recovery only applies a
    /// transaction's buffered writes once it sees the matching `TxComplete`.
    pub fn commit(self) -> Result<(), CaskError> {
        let staged = self.staged.into_inner().expect("batch lock poisoned");
        if staged.is_empty() {
            return Ok(());
        }

        let mut state = self.engine.state.write().expect("engine lock poisoned");
        let tx_id = TxId::new(self.engine.tx_id_counter.fetch_add(1, Ordering::SeqCst) + 1);

        let mut effects: Vec<(Vec<u8>, Option<RecordPos>)> = Vec::with_capacity(staged.len());
        for (key, value) in staged {
            let stored_key = record::encode_tx_key(tx_id, &key);
            match value {
                Some(v) => {
                    let pos = append_locked(
                        &mut state,
                        &self.engine.io,
                        &self.engine.dir_path,
                        self.engine.segment_size,
                        stored_key,
                        v,
                        RecordType::Normal,
                    )?;
                    effects.push((key, Some(pos)));
                }
                None => {
                    append_locked(
                        &mut state,
                        &self.engine.io,
                        &self.engine.dir_path,
                        self.engine.segment_size,
                        stored_key,
                        Vec::new(),
                        RecordType::Deleted,
                    )?;
                    effects.push((key, None));
                }
            }
        }

        let commit_key = record::encode_tx_key(tx_id, record::TX_COMPLETE_KEY);
        append_locked(
            &mut state,
            &self.engine.io,
            &self.engine.dir_path,
            self.engine.segment_size,
            commit_key,
            Vec::new(),
            RecordType::TxComplete,
        )?;

        state.active.sync()?;

        for (key, effect) in effects {
            match effect {
                Some(pos) => {
                    state.index.put(key, pos);
                }
                None => {
                    state.index.delete(&key);
                }
            }
        }

        tracing::debug!(tx_id = i64::from(tx_id), "batch committed");
        Ok(())
    }
}
