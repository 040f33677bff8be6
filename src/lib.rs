//! A single-file, embedded key-value store.
//!
//! A record is an opaque byte payload identified by a short textual key.
//! The file is laid out in three contiguous regions:
//!
//! ```text
//!     | 16 bytes     | num_records * 80 bytes | ... slack ... | record payloads ... |
//!     | file header  |      index entries     |               |                     |
//!     0              16                                  data_start_ptr        file end
//! ```
//!
//! The index region holds one 80-byte entry per live record: a 64-byte
//! key slot plus a 16-byte record header (`dataPointer`, `dataCapacity`,
//! `dataSize`). The record-data region has no gaps between neighboring
//! records, but a record's `dataCapacity` may exceed its `dataSize`,
//! leaving trailing free space that a later insert can split off.
//!
//! [`RecordsStore`] is the only public entry point; [`allocator`] is where
//! most of the interesting behavior -- splitting, coalescing and growing
//! the index region -- lives.

mod allocator;
mod error;
mod header;
mod index;
mod key;
mod mode;
mod store;

pub use error::Error;
pub use header::{RecordHeader, FILE_HEADER_LEN, INDEX_ENTRY_LEN, MAX_KEY_LEN, RECORD_HEADER_LEN};
pub use mode::OpenMode;
pub use store::{Record, RecordsStore};
