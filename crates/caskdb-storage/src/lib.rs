//! # caskdb-storage: the Bitcask-style storage engine
//!
//! Append-only segment files on disk, an in-memory ordered index from key to
//! on-disk position, point reads/writes/deletes, atomic batches, crash
//! recovery by log replay, and offline merge (compaction) with hint-file
//! acceleration.
//!
//! [`Engine`] is the single entry point; everything else in this crate is a
//! collaborator it owns.

mod batch;
mod crc32;
mod engine;
mod error;
mod index;
mod iterator;
mod merge;
mod record;
mod segment;
mod varint;

pub use batch::Batch;
pub use caskdb_types::{EngineOptions, IteratorOptions, RecordPos, RecordType, TxId};
pub use engine::Engine;
pub use error::CaskError;
pub use iterator::CaskIterator;
pub use record::LogRecord;
