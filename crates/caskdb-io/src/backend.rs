//! I/O backend trait.
//!
//! The [`IoBackend`] trait abstracts file I/O operations over `std::fs` so
//! the storage layer can be tested against alternate backends without
//! changing its own code.

use std::path::Path;

use bytes::Bytes;

use crate::IoError;

/// Flags for opening files.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenFlags {
    /// Open for reading.
    pub read: bool,
    /// Open for writing.
    pub write: bool,
    /// Create the file if it doesn't exist.
    pub create: bool,
    /// Open in append mode.
    pub append: bool,
}

impl OpenFlags {
    /// Flags for reading an existing file.
    pub fn read_only() -> Self {
        Self {
            read: true,
            ..Self::default()
        }
    }

    /// Flags for creating or appending to a file.
    pub fn append_create() -> Self {
        Self {
            read: true,
            write: true,
            create: true,
            append: true,
            ..Self::default()
        }
    }
}

/// Opaque handle to an open file.
///
/// The handle is backend-specific. For `SyncBackend`, it wraps a `std::fs::File`
/// descriptor. The handle must be closed via [`IoBackend::close`].
#[derive(Debug)]
pub struct FileHandle {
    /// Internal file descriptor or identifier.
    pub(crate) id: u64,
    /// The open file (for sync backend).
    pub(crate) file: Option<std::fs::File>,
    /// Path the handle was opened from, kept so callers can ask for it back
    /// without threading the path alongside every handle themselves.
    pub(crate) path: std::path::PathBuf,
}

impl FileHandle {
    /// Creates a new file handle wrapping a `std::fs::File`.
    pub(crate) fn from_file(id: u64, file: std::fs::File, path: std::path::PathBuf) -> Self {
        Self {
            id,
            file: Some(file),
            path,
        }
    }

    /// Returns the path this handle was opened from.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Returns the internal file reference.
    pub(crate) fn file(&self) -> Result<&std::fs::File, IoError> {
        self.file
            .as_ref()
            .ok_or(IoError::InvalidHandle { handle: self.id })
    }

    /// Returns the internal file reference mutably.
    pub(crate) fn file_mut(&mut self) -> Result<&mut std::fs::File, IoError> {
        self.file
            .as_mut()
            .ok_or(IoError::InvalidHandle { handle: self.id })
    }
}

/// Abstraction over file I/O operations, implemented by [`SyncBackend`] and
/// swappable in tests for a mock.
///
/// [`SyncBackend`]: crate::SyncBackend
pub trait IoBackend: Send + Sync {
    /// Opens a file with the given flags.
    fn open(&self, path: &Path, flags: OpenFlags) -> Result<FileHandle, IoError>;

    /// Reads data from a file at the given byte offset.
    ///
    /// Returns the number of bytes read.
    fn read_at(&self, handle: &FileHandle, offset: u64, buf: &mut [u8]) -> Result<usize, IoError>;

    /// Writes data to a file (at the current position or end in append mode).
    ///
    /// Returns the number of bytes written.
    fn write(&self, handle: &mut FileHandle, buf: &[u8]) -> Result<usize, IoError>;

    /// Syncs file data and metadata to disk.
    fn fsync(&self, handle: &FileHandle) -> Result<(), IoError>;

    /// Closes a file handle.
    fn close(&self, handle: FileHandle) -> Result<(), IoError>;

    /// Reads an entire file into memory.
    ///
    /// Convenience method for small files (manifests, indexes).
    fn read_all(&self, path: &Path) -> Result<Bytes, IoError>;

    /// Writes data to a file atomically (write + fsync).
    ///
    /// Convenience method for small files (manifests, indexes).
    fn write_all(&self, path: &Path, data: &[u8]) -> Result<(), IoError>;

    /// Returns the file size in bytes.
    fn file_size(&self, handle: &FileHandle) -> Result<u64, IoError>;

    /// Renames (moves) a file from `from` to `to`. Used by merge to swap
    /// compacted segment files into the live directory.
    fn rename(&self, from: &Path, to: &Path) -> Result<(), IoError>;

    /// Deletes a file. Used by merge to drop superseded segment files.
    fn remove(&self, path: &Path) -> Result<(), IoError>;
}
