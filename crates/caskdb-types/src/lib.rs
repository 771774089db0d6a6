//! # caskdb-types: shared value types for the caskdb storage engine
//!
//! This crate contains the small `Copy` types threaded through the rest of
//! the system:
//! - Wire-level record tagging ([`RecordType`])
//! - On-disk location of a value ([`RecordPos`])
//! - Transaction identifiers for atomic batches ([`TxId`])
//! - Engine configuration ([`EngineOptions`]) and iteration configuration
//!   ([`IteratorOptions`])

use std::path::PathBuf;

/// The kind of a log record, stored as the first byte after the header's
/// checksum and length fields.
///
/// This is what lets recovery and reads distinguish a live value from a
/// tombstone and from the marker that closes out an atomic batch, without
/// a second lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordType {
    /// Normal application key/value record.
    Normal = 0,
    /// Logical deletion marker; the key is removed from the index on replay.
    Deleted = 1,
    /// Closes out a batch: every record written under the same [`TxId`]
    /// since the last `TxComplete` becomes visible atomically.
    TxComplete = 2,
}

impl RecordType {
    /// Returns the single-byte discriminant used on the wire.
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Reconstructs a [`RecordType`] from its wire discriminant.
    ///
    /// # Errors
    ///
    /// Returns `None` if `byte` is not one of the three known discriminants,
    /// which callers should treat as a corrupt or truncated record.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(RecordType::Normal),
            1 => Some(RecordType::Deleted),
            2 => Some(RecordType::TxComplete),
            _ => None,
        }
    }
}

/// The on-disk location of a single record: which segment file it lives in,
/// the byte offset of its header within that file, and the total encoded
/// size of the record (header + key + value).
///
/// This is the value side of the in-memory key index: looking up a key
/// yields a `RecordPos`, and reading the value means seeking to
/// `(segment_id, offset)` and reading `size` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordPos {
    /// Id of the segment file holding the record.
    pub segment_id: u32,
    /// Byte offset of the record's header within the segment file.
    pub offset: u64,
    /// Total encoded size of the record, in bytes.
    pub size: u32,
}

impl RecordPos {
    /// Creates a new record position.
    pub fn new(segment_id: u32, offset: u64, size: u32) -> Self {
        Self {
            segment_id,
            offset,
            size,
        }
    }
}

/// Identifier for an in-flight atomic batch.
///
/// Every key written as part of a batch is prefixed, on the wire, with its
/// `TxId` so that recovery can tell which records belong to the same batch
/// and stage them until the matching `TxComplete` record is seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxId(i64);

impl TxId {
    /// The reserved id used for records written outside of an explicit
    /// batch (a single `put`/`delete` is its own one-record transaction).
    pub const NON_TRANSACTIONAL: TxId = TxId(0);

    /// Wraps a raw transaction counter value.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the next transaction id after this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl From<i64> for TxId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<TxId> for i64 {
    fn from(id: TxId) -> Self {
        id.0
    }
}

/// Configuration for opening or creating an engine directory.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Directory holding the engine's segment files, hint file, and merge
    /// marker. Created on first `Engine::open` if it doesn't exist.
    pub dir_path: PathBuf,
    /// Maximum size, in bytes, an active segment is allowed to reach before
    /// the engine rotates to a new one.
    pub segment_size: u64,
    /// Whether every write should be followed by an fsync of the active
    /// segment, trading throughput for durability on process crash.
    pub sync_writes: bool,
    /// Number of bytes written since the last sync after which the engine
    /// fsyncs the active segment even if `sync_writes` is false. `0`
    /// disables the byte-threshold sync entirely.
    pub bytes_per_sync: u64,
}

impl EngineOptions {
    /// Default segment rotation size: 256 MiB, matching the source engine's
    /// default `FileDataSize`.
    pub const DEFAULT_SEGMENT_SIZE: u64 = 256 * 1024 * 1024;

    /// Creates options for `dir_path` with the default segment size and
    /// explicit-sync-only durability.
    pub fn new(dir_path: impl Into<PathBuf>) -> Self {
        Self {
            dir_path: dir_path.into(),
            segment_size: Self::DEFAULT_SEGMENT_SIZE,
            sync_writes: false,
            bytes_per_sync: 0,
        }
    }
}

/// Configuration for a forward or reverse key iteration, with an optional
/// key prefix filter.
#[derive(Debug, Clone, Default)]
pub struct IteratorOptions {
    /// Iterate in descending key order when `true`.
    pub reverse: bool,
    /// Only yield keys starting with this prefix. An empty prefix matches
    /// every key.
    pub prefix: Vec<u8>,
}

impl IteratorOptions {
    /// Returns whether `key` passes this iterator's prefix filter.
    pub fn matches(&self, key: &[u8]) -> bool {
        key.starts_with(&self.prefix)
    }
}
