//! On-disk header layouts.
//!
//! ```text
//!     File header (16 bytes, at offset 0):
//!     |   4 bytes    |      8 bytes     |  4 bytes  |
//!     | num_records  |  data_start_ptr  | reserved  |
//!
//!     Index entry (80 bytes, repeated from offset 16):
//!     |   64 bytes  |   8 bytes   |    4 bytes    |  4 bytes  |
//!     |     key     | dataPointer | dataCapacity  | dataSize  |
//! ```
//! All multi-byte integers are big-endian.

use std::convert::TryInto;

/// Length of the file header region.
pub const FILE_HEADER_LEN: u64 = 16;
/// Maximum encoded size (length prefix + bytes) of a key.
pub const MAX_KEY_LEN: usize = 64;
/// Length of a record header (everything in an index entry but the key).
pub const RECORD_HEADER_LEN: usize = 16;
/// Length of one index entry: a key slot followed by a record header.
pub const INDEX_ENTRY_LEN: u64 = (MAX_KEY_LEN + RECORD_HEADER_LEN) as u64;

/// The 16-byte file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub num_records: u32,
    pub data_start_ptr: u64,
}

impl FileHeader {
    pub fn to_bytes(self) -> [u8; FILE_HEADER_LEN as usize] {
        let mut bytes = [0u8; FILE_HEADER_LEN as usize];
        bytes[0..4].copy_from_slice(&(self.num_records as i32).to_be_bytes());
        bytes[4..12].copy_from_slice(&self.data_start_ptr.to_be_bytes());
        // bytes 12..16 are reserved padding, left zeroed.
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let num_records = i32::from_be_bytes(bytes[0..4].try_into().unwrap()) as u32;
        let data_start_ptr = u64::from_be_bytes(bytes[4..12].try_into().unwrap());
        Self {
            num_records,
            data_start_ptr,
        }
    }
}

/// The in-memory view of a record: where its payload lives and how big it
/// is, plus the index slot it was last read from (or written to).
///
/// `index_position` mirrors the slot in the on-disk index region; it is
/// not part of the 16-byte serialized header, it is derived from the slot
/// an entry occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub data_pointer: u64,
    pub data_capacity: u32,
    pub data_size: u32,
    pub index_position: usize,
}

impl RecordHeader {
    /// Bytes reserved but not currently holding live data.
    pub fn free_space(&self) -> u32 {
        self.data_capacity - self.data_size
    }

    /// The offset one past the end of this record's reserved space.
    pub fn end(&self) -> u64 {
        self.data_pointer + u64::from(self.data_capacity)
    }

    /// Serializes the 16-byte record header (key excluded).
    pub fn to_bytes(self) -> [u8; RECORD_HEADER_LEN] {
        let mut bytes = [0u8; RECORD_HEADER_LEN];
        bytes[0..8].copy_from_slice(&self.data_pointer.to_be_bytes());
        bytes[8..12].copy_from_slice(&self.data_capacity.to_be_bytes());
        bytes[12..16].copy_from_slice(&self.data_size.to_be_bytes());
        bytes
    }

    /// Deserializes a 16-byte record header, tagging it with the slot it
    /// was read from.
    pub fn from_bytes(bytes: &[u8], index_position: usize) -> Self {
        let data_pointer = u64::from_be_bytes(bytes[0..8].try_into().unwrap());
        let data_capacity = u32::from_be_bytes(bytes[8..12].try_into().unwrap());
        let data_size = u32::from_be_bytes(bytes[12..16].try_into().unwrap());
        Self {
            data_pointer,
            data_capacity,
            data_size,
            index_position,
        }
    }
}
