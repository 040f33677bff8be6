//! The public-facing [`RecordsStore`] and the state it guards.
//!
//! Every operation locks the store, consults or mutates the in-memory
//! index, calls into [`crate::allocator`] when space needs to be found or
//! reclaimed, then commits by writing record data and index entries
//! through [`crate::index`], updating the file header last so it only
//! ever reflects already-committed state.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::debug;
use parking_lot::Mutex;

use crate::allocator;
use crate::error::Error;
use crate::header::{FileHeader, RecordHeader, FILE_HEADER_LEN, INDEX_ENTRY_LEN};
use crate::index::{self, InMemoryIndex};
use crate::key;
use crate::mode::OpenMode;

/// A key together with the payload that was stored under it, as returned
/// by [`RecordsStore::read`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    pub data: Vec<u8>,
}

pub(crate) struct StoreState {
    pub(crate) file: File,
    pub(crate) mode: OpenMode,
    pub(crate) num_records: u32,
    pub(crate) data_start_ptr: u64,
    pub(crate) index: InMemoryIndex,
}

impl StoreState {
    pub(crate) fn file_len(&self) -> std::io::Result<u64> {
        self.file.metadata().map(|metadata| metadata.len())
    }

    pub(crate) fn persist_header(&mut self) -> Result<(), Error> {
        index::write_file_header(
            &mut self.file,
            FileHeader {
                num_records: self.num_records,
                data_start_ptr: self.data_start_ptr,
            },
        )?;
        self.mode.commit(&self.file)?;
        Ok(())
    }

    /// Writes `data` at `header`'s reserved location and returns the
    /// header with `data_size` updated. Fails with
    /// [`Error::RecordDoesNotFit`] if the allocator handed out a record
    /// too small for the payload -- this should be unreachable if the
    /// allocator is correct.
    pub(crate) fn write_payload(
        &mut self,
        mut header: RecordHeader,
        data: &[u8],
    ) -> Result<RecordHeader, Error> {
        if data.len() as u64 > u64::from(header.data_capacity) {
            return Err(Error::RecordDoesNotFit);
        }
        self.file.seek(SeekFrom::Start(header.data_pointer))?;
        self.file.write_all(data)?;
        header.data_size = data.len() as u32;
        Ok(header)
    }
}

/// A single-file, embedded key-value store.
///
/// Records are opaque byte payloads identified by a short textual key.
/// See the crate documentation for the on-disk layout. All operations
/// are serialized behind a single lock; there is no cross-process
/// coordination and no crash-recovery journaling.
pub struct RecordsStore {
    state: Mutex<StoreState>,
}

impl RecordsStore {
    /// Creates a new store at `path` with room for `initial_capacity`
    /// index entries before the index region needs to grow. Fails with
    /// [`Error::AlreadyExists`] if `path` already exists.
    pub fn create<P: AsRef<Path>>(path: P, initial_capacity: usize) -> Result<Self, Error> {
        let path = path.as_ref();
        if path.exists() {
            return Err(Error::AlreadyExists);
        }
        debug!(
            "creating store at {:?} with initial capacity {}",
            path, initial_capacity
        );

        let data_start_ptr = FILE_HEADER_LEN + INDEX_ENTRY_LEN * initial_capacity as u64;
        let mut file = OpenMode::ReadWrite
            .open_options()
            .create_new(true)
            .open(path)?;
        file.set_len(data_start_ptr)?;
        index::write_file_header(
            &mut file,
            FileHeader {
                num_records: 0,
                data_start_ptr,
            },
        )?;
        file.sync_all()?;

        Ok(Self {
            state: Mutex::new(StoreState {
                file,
                mode: OpenMode::ReadWrite,
                num_records: 0,
                data_start_ptr,
                index: HashMap::new(),
            }),
        })
    }

    /// Opens an existing store at `path` in the given `mode`. Fails with
    /// [`Error::NotFound`] if `path` does not exist.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound);
        }
        debug!("opening store at {:?}", path);

        let mut file = mode.open(path)?;
        let header = index::read_file_header(&mut file)?;

        let mut in_memory = HashMap::with_capacity(header.num_records as usize);
        for slot in 0..header.num_records as usize {
            let (key, record_header) = index::read_index_slot(&mut file, slot)?;
            in_memory.insert(key, record_header);
        }

        Ok(Self {
            state: Mutex::new(StoreState {
                file,
                mode,
                num_records: header.num_records,
                data_start_ptr: header.data_start_ptr,
                index: in_memory,
            }),
        })
    }

    /// Inserts `data` under `key`. Fails with [`Error::KeyExists`] if the
    /// key is already present, or [`Error::KeyTooLarge`] if the encoded
    /// key doesn't fit in the fixed key slot.
    pub fn insert(&self, key: &str, data: &[u8]) -> Result<(), Error> {
        // Validate before taking the lock or mutating anything: a
        // too-large key must leave the store untouched.
        key::encode(key)?;

        let mut state = self.state.lock();
        Self::insert_locked(&mut state, key, data)
    }

    /// Replaces the payload stored under `key`. If the new payload is
    /// larger than the record's current capacity, the record is deleted
    /// and reinserted, which may change its `dataPointer`. Fails with
    /// [`Error::KeyNotFound`] if the key is absent.
    ///
    /// The grow path reclaims and reallocates under the single lock this
    /// method already holds rather than recursing into the public
    /// `delete`/`insert`, so the whole operation stays totally ordered
    /// against concurrent callers -- no other thread can observe the key
    /// as absent, or steal it with its own `insert`, mid-update.
    pub fn update(&self, key: &str, data: &[u8]) -> Result<(), Error> {
        let mut state = self.state.lock();
        if state.mode.is_read_only() {
            return Err(Error::ReadOnly);
        }
        let existing = *state.index.get(key).ok_or(Error::KeyNotFound)?;

        if data.len() as u64 > u64::from(existing.data_capacity) {
            Self::delete_locked(&mut state, key)?;
            return Self::insert_locked(&mut state, key, data);
        }

        let mut header = state.write_payload(existing, data)?;
        header.index_position = existing.index_position;
        index::write_index_slot(&mut state.file, existing.index_position, key, header)?;
        state.index.insert(key.to_string(), header);
        Ok(())
    }

    /// Reads the payload stored under `key`. Fails with
    /// [`Error::KeyNotFound`] if the key is absent.
    pub fn read(&self, key: &str) -> Result<Record, Error> {
        let mut state = self.state.lock();
        let header = *state.index.get(key).ok_or(Error::KeyNotFound)?;

        let mut data = vec![0u8; header.data_size as usize];
        state.file.seek(SeekFrom::Start(header.data_pointer))?;
        state.file.read_exact(&mut data)?;

        Ok(Record {
            key: key.to_string(),
            data,
        })
    }

    /// Removes `key` and reclaims its data-region space. Fails with
    /// [`Error::KeyNotFound`] if the key is absent.
    pub fn delete(&self, key: &str) -> Result<(), Error> {
        let mut state = self.state.lock();
        Self::delete_locked(&mut state, key)
    }

    /// Inserts `data` under `key` into an already-locked store. Shared by
    /// [`RecordsStore::insert`] and the grow path of
    /// [`RecordsStore::update`], which calls this under a lock it is
    /// already holding instead of re-entering the public, self-locking
    /// `insert`.
    fn insert_locked(state: &mut StoreState, key: &str, data: &[u8]) -> Result<(), Error> {
        if state.mode.is_read_only() {
            return Err(Error::ReadOnly);
        }
        if state.index.contains_key(key) {
            return Err(Error::KeyExists);
        }

        let required_slots = state.num_records as usize + 1;
        allocator::ensure_index_space(state, required_slots)?;

        let header = allocator::allocate(state, data.len() as u32)?;
        let mut header = state.write_payload(header, data)?;

        let slot = state.num_records as usize;
        header.index_position = slot;
        index::write_index_slot(&mut state.file, slot, key, header)?;

        state.num_records += 1;
        state.persist_header()?;
        state.index.insert(key.to_string(), header);
        Ok(())
    }

    /// Removes `key` from an already-locked store. Shared by
    /// [`RecordsStore::delete`] and the grow path of
    /// [`RecordsStore::update`], for the same reason as
    /// [`RecordsStore::insert_locked`].
    fn delete_locked(state: &mut StoreState, key: &str) -> Result<(), Error> {
        if state.mode.is_read_only() {
            return Err(Error::ReadOnly);
        }
        let victim = *state.index.get(key).ok_or(Error::KeyNotFound)?;

        allocator::reclaim_deleted_space(state, key, victim)?;

        let last_slot = state.num_records as usize - 1;
        if victim.index_position != last_slot {
            let (moved_key, mut moved_header) = index::read_index_slot(&mut state.file, last_slot)?;
            moved_header.index_position = victim.index_position;
            index::write_index_slot(
                &mut state.file,
                victim.index_position,
                &moved_key,
                moved_header,
            )?;
            state.index.insert(moved_key, moved_header);
        }

        state.num_records -= 1;
        state.persist_header()?;
        state.index.remove(key);
        Ok(())
    }

    /// Returns whether `key` is currently present.
    pub fn exists(&self, key: &str) -> bool {
        self.state.lock().index.contains_key(key)
    }

    /// Returns the number of live records.
    pub fn size(&self) -> usize {
        self.state.lock().index.len()
    }

    /// Alias for [`RecordsStore::size`], for parity with the standard
    /// collection traits.
    pub fn len(&self) -> usize {
        self.size()
    }

    /// Whether the store currently holds no records.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns a snapshot of the currently live keys. Swap-with-last
    /// compaction on delete means this is not in insertion order and
    /// ordering may change across any mutating operation.
    pub fn keys(&self) -> Vec<String> {
        self.state.lock().index.keys().cloned().collect()
    }

    /// Forces the underlying file to disk, independent of the store's
    /// [`OpenMode`]. Lets a host pin down a durability point without
    /// paying the cost of an fsync on every mutation.
    pub fn sync(&self) -> Result<(), Error> {
        let state = self.state.lock();
        match state.mode {
            OpenMode::SyncMetadata => state.file.sync_all()?,
            _ => state.file.sync_data()?,
        }
        Ok(())
    }

    /// Closes the store, flushing according to its [`OpenMode`] and
    /// releasing the underlying file handle and in-memory index.
    pub fn close(self) -> Result<(), Error> {
        let mut state = self.state.into_inner();
        state.mode.commit(&state.file)?;
        state.index.clear();
        Ok(())
    }
}
