//! On-disk record layout and codec (§4.B).
//!
//! ```text
//! offset 0..4   CRC-32/IEEE of bytes 4..end            (little-endian u32)
//! offset 4      type                                    (1 byte)
//! offset 5..    varint(keySize)                        (signed varint)
//!              varint(valueSize)                       (signed varint)
//!              key bytes                                (keySize bytes)
//!              value bytes                              (valueSize bytes)
//! ```

use caskdb_types::{RecordType, TxId};

use crate::crc32;
use crate::varint::{self, MAX_VARINT_LEN_32};

/// Upper bound on a record header's encoded length: 4 CRC bytes are read
/// separately, so this covers the 1 type byte plus two 32-bit varints.
pub const MAX_HEADER_LEN: usize = 1 + 2 * MAX_VARINT_LEN_32;

/// A single decoded record: its key, value, and type.
///
/// `key` here is always the *stored* key — `varint(tx_id) || real_key` for
/// every record, autocommit writes included (§3 "Stored key layout").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub record_type: RecordType,
}

/// The decoded fixed-then-varint header of one record, before its key/value
/// bytes have been read.
///
/// `type_byte` is kept as the raw wire byte rather than an already-validated
/// [`RecordType`]: an unrecognized byte is corruption, not end-of-data, and
/// the caller (`Segment::read_at`) needs to tell the two apart (see
/// [`RecordHeader::record_type`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub crc: u32,
    pub type_byte: u8,
    pub key_size: usize,
    pub value_size: usize,
}

impl RecordHeader {
    /// Whether this header is the all-zero end-of-data sentinel a reader
    /// sees once it scans past the last written record.
    pub fn is_sentinel(&self) -> bool {
        self.crc == 0 && self.type_byte == 0 && self.key_size == 0 && self.value_size == 0
    }

    /// Decodes the wire type byte, or `None` if it is not one of the known
    /// discriminants. A non-sentinel header with no valid `record_type` is
    /// corruption, never end-of-data.
    pub fn record_type(&self) -> Option<RecordType> {
        RecordType::from_byte(self.type_byte)
    }
}

/// Encodes `record` into its on-disk byte representation.
///
/// Returns the encoded bytes and their length (the two are redundant here,
/// matching spec.md's `encode(rec) -> (bytes, total_len)` signature).
pub fn encode(record: &LogRecord) -> (Vec<u8>, usize) {
    let mut tail = Vec::with_capacity(1 + 10 + 10 + record.key.len() + record.value.len());
    tail.push(record.record_type.as_byte());
    varint::write_varint(&mut tail, record.key.len() as i64);
    varint::write_varint(&mut tail, record.value.len() as i64);
    tail.extend_from_slice(&record.key);
    tail.extend_from_slice(&record.value);

    let crc = crc32::checksum(&tail);

    let mut out = Vec::with_capacity(4 + tail.len());
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&tail);
    let len = out.len();
    (out, len)
}

/// Decodes the CRC + type + key/value-size header from the front of
/// `prefix`. Returns the header and the number of bytes it occupied.
///
/// A `prefix` shorter than 5 bytes (CRC + type) cannot hold a header and
/// yields `None`, matching spec.md's "no header" case for readers that hit
/// the true end of a file mid-header. The type byte is decoded as a raw
/// `u8` here and deliberately *not* validated against [`RecordType`] — an
/// unrecognized discriminant is not "no header", it is corruption, and only
/// the caller knows the segment id/offset needed to report it as such.
pub fn decode_header(prefix: &[u8]) -> Option<(RecordHeader, usize)> {
    if prefix.len() < 5 {
        return None;
    }
    let crc = u32::from_le_bytes(prefix[0..4].try_into().ok()?);
    let type_byte = prefix[4];

    let rest = &prefix[5..];
    let (key_size, n1) = varint::read_varint(rest)?;
    let (value_size, n2) = varint::read_varint(&rest[n1..])?;
    if key_size < 0 || value_size < 0 {
        return None;
    }

    let header = RecordHeader {
        crc,
        type_byte,
        key_size: key_size as usize,
        value_size: value_size as usize,
    };
    Some((header, 5 + n1 + n2))
}

/// Verifies that `header.crc` matches the checksum of the record's encoded
/// tail: `type_byte || varint(keySize) || varint(valueSize) || key || value`.
///
/// `header_tail` is the portion of the header after the 4-byte CRC (the type
/// byte plus the two size varints, exactly as they appeared on disk).
pub fn verify_crc(header: &RecordHeader, header_tail: &[u8], key: &[u8], value: &[u8]) -> bool {
    let mut hasher = crc32::Crc32::new();
    hasher.update(header_tail);
    hasher.update(key);
    hasher.update(value);
    hasher.finalize() == header.crc
}

/// Prefixes `real_key` with `varint(tx_id)`, producing the key bytes actually
/// stored on disk (§3 "Stored key layout").
pub fn encode_tx_key(tx_id: TxId, real_key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(10 + real_key.len());
    varint::write_varint(&mut out, i64::from(tx_id));
    out.extend_from_slice(real_key);
    out
}

/// Splits a stored key into its transaction id and the real key bytes.
///
/// Panics if `stored_key` does not begin with a valid varint; every record
/// ever encoded through [`encode_tx_key`] satisfies this, so a failure here
/// indicates on-disk corruption the caller should have already caught via
/// CRC verification.
pub fn decode_tx_key(stored_key: &[u8]) -> (TxId, &[u8]) {
    let (tx_id, consumed) = varint::read_varint(stored_key).expect("tx-key prefix is a varint");
    (TxId::new(tx_id), &stored_key[consumed..])
}

/// The literal key used for a batch's commit-marker record (§4.F step 4),
/// wrapped the same way every other key is: `varint(tx_id) || TX_COMPLETE_KEY`.
pub const TX_COMPLETE_KEY: &[u8] = b"tx_com_prefix";
