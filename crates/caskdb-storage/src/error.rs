//! Error types surfaced by the storage engine.

use std::path::PathBuf;

use caskdb_io::IoError;

/// Errors returned by [`crate::Engine`] and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum CaskError {
    /// A caller passed a zero-length key to `put`, `delete`, or `get`.
    #[error("key must not be empty")]
    EmptyKey,

    /// Lookup on a key with no entry in the index.
    #[error("key not found")]
    KeyNotFound,

    /// Lookup hit a tombstone: the key was deleted and is distinct, for
    /// diagnostics, from a key that was never written.
    #[error("key has been deleted")]
    KeyDeleted,

    /// An index entry pointed at a position that, on re-read, did not carry
    /// the expected key. Indicates a corrupted index or a storage bug.
    #[error("index entry missing for key at expected position")]
    IndexMissing,

    /// The index pointed at a segment id no longer present in the segment
    /// set.
    #[error("data file for segment {segment_id} is missing")]
    DataFileMissing { segment_id: u32 },

    /// CRC mismatch, truncated header, unparseable varint, or decoded sizes
    /// exceeding the remaining file.
    #[error("corrupt record in segment {segment_id} at offset {offset}: {reason}")]
    Corruption {
        segment_id: u32,
        offset: u64,
        reason: String,
    },

    /// Underlying file error (read, write, sync, rename, remove, stat).
    #[error(transparent)]
    Io(#[from] IoError),

    /// A merge was requested while one was already in progress.
    #[error("a merge is already in progress")]
    MergeInProgress,

    /// Invalid configuration: empty `dir_path` or non-positive `segment_size`.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A directory entry expected to be a merge marker or hint file could
    /// not be read or parsed.
    #[error("malformed merge state at {path}: {reason}")]
    MalformedMergeState { path: PathBuf, reason: String },
}

impl From<std::io::Error> for CaskError {
    fn from(err: std::io::Error) -> Self {
        CaskError::Io(IoError::from(err))
    }
}
