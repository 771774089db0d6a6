//! User-facing cursor over live keys, resolving values through the engine
//! on demand (§4.H).

use caskdb_types::IteratorOptions;

use crate::engine::{self, Engine};
use crate::error::CaskError;
use crate::index::IndexIterator;

/// A snapshot-style cursor over the keys live at construction time. Unlike
/// [`crate::index::IndexIterator`], this resolves values by reading back
/// through the engine, so it is what callers of [`Engine::iter`] use.
pub struct CaskIterator<'a> {
    engine: &'a Engine,
    inner: IndexIterator,
}

impl<'a> CaskIterator<'a> {
    pub(crate) fn new(engine: &'a Engine, opts: IteratorOptions) -> Self {
        let inner = {
            let state = engine.state.read().expect("engine lock poisoned");
            state.index.iterate(&opts)
        };
        Self { engine, inner }
    }

    /// Returns to the first position in this iterator's order.
    pub fn rewind(&mut self) {
        self.inner.rewind();
    }

    /// Advances to the next position.
    pub fn next(&mut self) {
        self.inner.next();
    }

    /// Whether a further position remains to be visited.
    pub fn has_next(&self) -> bool {
        self.inner.has_next()
    }

    /// Positions the cursor at the first key matching `key`'s ordering rule
    /// (see [`IndexIterator::seek`]).
    pub fn seek(&mut self, key: &[u8]) {
        self.inner.seek(key);
    }

    /// The key at the current cursor position, if any.
    pub fn key(&self) -> Option<&[u8]> {
        self.inner.key()
    }

    /// Reads the value at the current cursor position by looking it up
    /// through the engine. Returns `Ok(None)` once the cursor has run off
    /// the end.
    pub fn value(&self) -> Result<Option<Vec<u8>>, CaskError> {
        let Some(pos) = self.inner.value() else {
            return Ok(None);
        };
        let state = self.engine.state.read().expect("engine lock poisoned");
        let record = engine::read_at_locked(&state, pos)?;
        Ok(Some(record.value))
    }

    /// Number of entries in this snapshot.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
