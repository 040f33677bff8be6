//! Reading and writing the file header and index region.
//!
//! The in-memory index itself is just a `HashMap<String, RecordHeader>`;
//! this module only deals with moving header and index-entry bytes to and
//! from the underlying file. Lookup, split and relocation logic that also
//! needs the in-memory map lives in [`crate::allocator`].

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::header::{FileHeader, RecordHeader, FILE_HEADER_LEN, INDEX_ENTRY_LEN, MAX_KEY_LEN};
use crate::key;

/// The in-memory mirror of the on-disk index region.
pub type InMemoryIndex = HashMap<String, RecordHeader>;

/// Reads the file header from offset 0.
pub fn read_file_header(file: &mut File) -> io::Result<FileHeader> {
    file.seek(SeekFrom::Start(0))?;
    let mut bytes = [0u8; FILE_HEADER_LEN as usize];
    file.read_exact(&mut bytes)?;
    Ok(FileHeader::from_bytes(&bytes))
}

/// Writes the file header at offset 0.
pub fn write_file_header(file: &mut File, header: FileHeader) -> io::Result<()> {
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&header.to_bytes())
}

/// Offset of the start of index slot `slot`.
fn slot_offset(slot: usize) -> u64 {
    FILE_HEADER_LEN + slot as u64 * INDEX_ENTRY_LEN
}

/// Reads the key and record header stored in index slot `slot`.
pub fn read_index_slot(file: &mut File, slot: usize) -> io::Result<(String, RecordHeader)> {
    file.seek(SeekFrom::Start(slot_offset(slot)))?;
    let mut entry = [0u8; INDEX_ENTRY_LEN as usize];
    file.read_exact(&mut entry)?;

    let key_slot = &entry[0..MAX_KEY_LEN];
    let key = key::decode(key_slot)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;
    let header = RecordHeader::from_bytes(&entry[MAX_KEY_LEN..], slot);
    Ok((key, header))
}

/// Writes `key` and `header` into index slot `slot`.
///
/// Trailing bytes in the 64-byte key area beyond the encoded key are
/// zeroed; the spec leaves them undefined but zeroing keeps the file
/// deterministic for tests and `keys()`.
pub fn write_index_slot(
    file: &mut File,
    slot: usize,
    key: &str,
    header: RecordHeader,
) -> io::Result<()> {
    let encoded = key::encode(key)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;

    let mut entry = [0u8; INDEX_ENTRY_LEN as usize];
    entry[..encoded.len()].copy_from_slice(&encoded);
    entry[MAX_KEY_LEN..].copy_from_slice(&header.to_bytes());

    file.seek(SeekFrom::Start(slot_offset(slot)))?;
    file.write_all(&entry)
}
