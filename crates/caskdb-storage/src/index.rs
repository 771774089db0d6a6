//! In-memory key index: ordered map from key bytes to [`RecordPos`], plus a
//! snapshot-style iterator (§4.D).

use std::collections::BTreeMap;

use caskdb_types::{IteratorOptions, RecordPos};

/// Ordered map from key bytes to their on-disk position.
///
/// Backed by `BTreeMap` — an ordered-map primitive is a named collaborator
/// per spec.md §1/§9 ("allows alternative ordered-map back ends... without
/// touching the engine"); `BTreeMap` is the natural default and needs no
/// external crate.
#[derive(Debug, Default)]
pub struct KeyIndex {
    map: BTreeMap<Vec<u8>, RecordPos>,
}

impl KeyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the position for `key`. Returns the previous
    /// position, if any, so callers can tell whether this was an overwrite.
    pub fn put(&mut self, key: Vec<u8>, pos: RecordPos) -> Option<RecordPos> {
        self.map.insert(key, pos)
    }

    pub fn get(&self, key: &[u8]) -> Option<RecordPos> {
        self.map.get(key).copied()
    }

    /// Removes `key`, returning its prior position if it existed.
    pub fn delete(&mut self, key: &[u8]) -> Option<RecordPos> {
        self.map.remove(key)
    }

    pub fn size(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Builds a snapshot-style cursor over the keys present right now,
    /// honoring `opts.prefix` and `opts.reverse` (§4.D).
    pub fn iterate(&self, opts: &IteratorOptions) -> IndexIterator {
        let mut entries: Vec<(Vec<u8>, RecordPos)> = self
            .map
            .iter()
            .filter(|(k, _)| opts.matches(k))
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        if opts.reverse {
            entries.reverse();
        }
        IndexIterator {
            entries,
            reverse: opts.reverse,
            pos: 0,
        }
    }
}

/// Snapshot-style cursor over a [`KeyIndex`] as it existed at construction
/// time. Concurrent mutation of the index afterwards does not affect an
/// already-built iterator (§4.D).
pub struct IndexIterator {
    entries: Vec<(Vec<u8>, RecordPos)>,
    reverse: bool,
    pos: usize,
}

impl IndexIterator {
    /// Returns to the first position in this iterator's order.
    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    /// Advances to the next position. A no-op once the cursor has run off
    /// the end (`has_next` is then `false`).
    pub fn next(&mut self) {
        if self.pos < self.entries.len() {
            self.pos += 1;
        }
    }

    /// Whether a further position remains to be visited.
    pub fn has_next(&self) -> bool {
        self.pos < self.entries.len()
    }

    /// Positions the cursor at the smallest key `>= key` (ascending order)
    /// or the largest key `<= key` (descending / `reverse` order).
    pub fn seek(&mut self, key: &[u8]) {
        self.pos = if self.reverse {
            self.entries.partition_point(|(k, _)| k.as_slice() > key)
        } else {
            self.entries.partition_point(|(k, _)| k.as_slice() < key)
        };
    }

    /// The key at the current cursor position, if any.
    pub fn key(&self) -> Option<&[u8]> {
        self.entries.get(self.pos).map(|(k, _)| k.as_slice())
    }

    /// The position at the current cursor position, if any.
    pub fn value(&self) -> Option<RecordPos> {
        self.entries.get(self.pos).map(|(_, v)| *v)
    }

    /// Number of entries in this snapshot.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Releases the snapshot. Present for parity with the source iterator
    /// contract; there is nothing to release in this backing implementation.
    pub fn close(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(segment_id: u32, offset: u64) -> RecordPos {
        RecordPos::new(segment_id, offset, 0)
    }

    fn index_with(keys: &[&str]) -> KeyIndex {
        let mut index = KeyIndex::new();
        for (i, k) in keys.iter().enumerate() {
            index.put(k.as_bytes().to_vec(), pos(0, i as u64));
        }
        index
    }

    #[test]
    fn put_get_delete() {
        let mut index = KeyIndex::new();
        assert!(index.put(b"a".to_vec(), pos(0, 0)).is_none());
        assert_eq!(index.get(b"a"), Some(pos(0, 0)));
        assert_eq!(index.put(b"a".to_vec(), pos(0, 10)), Some(pos(0, 0)));
        assert_eq!(index.get(b"a"), Some(pos(0, 10)));
        assert_eq!(index.delete(b"a"), Some(pos(0, 10)));
        assert_eq!(index.get(b"a"), None);
        assert_eq!(index.delete(b"a"), None);
    }

    #[test]
    fn iterator_ascending_order() {
        let index = index_with(&["banana", "apple", "cherry"]);
        let mut it = index.iterate(&IteratorOptions::default());
        let mut seen = Vec::new();
        while it.has_next() {
            seen.push(it.key().unwrap().to_vec());
            it.next();
        }
        assert_eq!(seen, vec![b"apple".to_vec(), b"banana".to_vec(), b"cherry".to_vec()]);
    }

    #[test]
    fn iterator_descending_order() {
        let index = index_with(&["banana", "apple", "cherry"]);
        let opts = IteratorOptions {
            reverse: true,
            prefix: Vec::new(),
        };
        let mut it = index.iterate(&opts);
        let mut seen = Vec::new();
        while it.has_next() {
            seen.push(it.key().unwrap().to_vec());
            it.next();
        }
        assert_eq!(seen, vec![b"cherry".to_vec(), b"banana".to_vec(), b"apple".to_vec()]);
    }

    #[test]
    fn iterator_prefix_filter() {
        let index = index_with(&["user:1", "user:2", "order:1"]);
        let opts = IteratorOptions {
            reverse: false,
            prefix: b"user:".to_vec(),
        };
        let mut it = index.iterate(&opts);
        let mut seen = Vec::new();
        while it.has_next() {
            seen.push(it.key().unwrap().to_vec());
            it.next();
        }
        assert_eq!(seen, vec![b"user:1".to_vec(), b"user:2".to_vec()]);
    }

    #[test]
    fn seek_positions_at_smallest_key_not_less_than() {
        let index = index_with(&["a", "c", "e"]);
        let mut it = index.iterate(&IteratorOptions::default());
        it.seek(b"b");
        assert_eq!(it.key(), Some(b"c".as_slice()));
    }

    #[test]
    fn seek_reverse_positions_at_largest_key_not_greater_than() {
        let index = index_with(&["a", "c", "e"]);
        let opts = IteratorOptions {
            reverse: true,
            prefix: Vec::new(),
        };
        let mut it = index.iterate(&opts);
        it.seek(b"d");
        assert_eq!(it.key(), Some(b"c".as_slice()));
    }

    #[test]
    fn rewind_returns_to_start() {
        let index = index_with(&["a", "b"]);
        let mut it = index.iterate(&IteratorOptions::default());
        it.next();
        assert_eq!(it.key(), Some(b"b".as_slice()));
        it.rewind();
        assert_eq!(it.key(), Some(b"a".as_slice()));
    }
}
