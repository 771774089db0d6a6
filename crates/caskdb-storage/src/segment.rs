//! One data segment: id, write offset, backing file handle (§4.C).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use caskdb_io::{FileHandle, IoBackend, OpenFlags};

use crate::error::CaskError;
use crate::record::{self, LogRecord, MAX_HEADER_LEN};

/// File name format for a segment: nine zero-padded decimal digits of `id`.
pub fn segment_file_name(id: u32) -> String {
    format!("{id:09}.data")
}

/// Parses a segment id out of a `NNNNNNNNN.data` file stem. Returns `None`
/// for anything that isn't nine decimal digits.
pub fn parse_segment_id(stem: &str) -> Option<u32> {
    if stem.len() != 9 || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

/// One append-only data file: exactly one is active (writable) at a time,
/// all others are archived (read-only).
pub struct Segment {
    id: u32,
    write_offset: u64,
    io: Arc<dyn IoBackend>,
    handle: FileHandle,
}

impl Segment {
    /// Opens (creating if necessary) the segment file `{id:09}.data` under
    /// `dir`. `writable` selects append-create vs. read-only flags.
    pub fn open(io: Arc<dyn IoBackend>, dir: &Path, id: u32, writable: bool) -> Result<Self, CaskError> {
        let path = dir.join(segment_file_name(id));
        let flags = if writable {
            OpenFlags::append_create()
        } else {
            OpenFlags::read_only()
        };
        let handle = io.open(&path, flags)?;
        Ok(Self {
            id,
            write_offset: 0,
            io,
            handle,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn write_offset(&self) -> u64 {
        self.write_offset
    }

    /// Overrides the tracked write offset. Used by recovery (§4.E.1) to set
    /// the active segment's offset to the final scan position.
    pub fn set_write_offset(&mut self, offset: u64) {
        self.write_offset = offset;
    }

    pub fn path(&self) -> &Path {
        self.handle.path()
    }

    /// Appends `bytes`, returning the offset the record now starts at.
    pub fn append(&mut self, bytes: &[u8]) -> Result<u64, CaskError> {
        let start = self.write_offset;
        let n = self.io.write(&mut self.handle, bytes)?;
        self.write_offset += n as u64;
        Ok(start)
    }

    pub fn sync(&self) -> Result<(), CaskError> {
        self.io.fsync(&self.handle)?;
        Ok(())
    }

    pub fn size(&self) -> Result<u64, CaskError> {
        Ok(self.io.file_size(&self.handle)?)
    }

    /// Reads one record at `offset`, returning the decoded record and the
    /// number of bytes it and its header occupied, or `None` at the
    /// end-of-data sentinel / true end of file (spec.md §4.C EOF handling).
    pub fn read_at(&self, offset: u64) -> Result<Option<(LogRecord, usize)>, CaskError> {
        let mut prefix = vec![0u8; MAX_HEADER_LEN];
        let n = self.io.read_at(&self.handle, offset, &mut prefix)?;
        if n == 0 {
            return Ok(None);
        }
        prefix.truncate(n);

        let Some((header, header_len)) = record::decode_header(&prefix) else {
            return Ok(None);
        };
        if header.is_sentinel() {
            return Ok(None);
        }
        let Some(record_type) = header.record_type() else {
            return Err(CaskError::Corruption {
                segment_id: self.id,
                offset,
                reason: "unrecognized record type byte".to_string(),
            });
        };

        let body_len = header.key_size + header.value_size;
        let mut body = vec![0u8; body_len];
        if body_len > 0 {
            let read = self
                .io
                .read_at(&self.handle, offset + header_len as u64, &mut body)?;
            if read < body_len {
                return Err(CaskError::Corruption {
                    segment_id: self.id,
                    offset,
                    reason: "truncated record body".to_string(),
                });
            }
        }

        let key = body[..header.key_size].to_vec();
        let value = body[header.key_size..].to_vec();
        if !record::verify_crc(&header, &prefix[4..header_len], &key, &value) {
            return Err(CaskError::Corruption {
                segment_id: self.id,
                offset,
                reason: "CRC mismatch".to_string(),
            });
        }

        let consumed = header_len + body_len;
        Ok(Some((
            LogRecord {
                key,
                value,
                record_type,
            },
            consumed,
        )))
    }

    /// Reads the record at `offset`, treating EOF as an error. Used by merge
    /// (§4.G), where every scanned offset is known to hold a live record.
    pub fn read_record(&self, offset: u64) -> Result<LogRecord, CaskError> {
        self.read_at(offset)?
            .map(|(record, _)| record)
            .ok_or(CaskError::DataFileMissing {
                segment_id: self.id,
            })
    }

    pub fn close(self) -> Result<(), CaskError> {
        self.io.close(self.handle)?;
        Ok(())
    }

    /// Closes the segment and deletes its backing file. Used by merge to
    /// drop superseded archived segments (§4.G step 7).
    pub fn remove(self) -> Result<(), CaskError> {
        let path: PathBuf = self.handle.path().to_path_buf();
        let io = self.io.clone();
        io.close(self.handle)?;
        io.remove(&path)?;
        Ok(())
    }
}
