//! Space selection, splitting, coalescing and index-region growth.
//!
//! This is the algorithmically interesting part of the store: deciding
//! where a new record's payload goes, shrinking and growing records in
//! place, and relocating the first data record out of the way when the
//! index region needs to grow. Every function here operates on a
//! [`StoreState`] that the caller already holds the store's lock for.

use std::io::{Read, Seek, SeekFrom, Write};

use log::{trace, warn};

use crate::error::Error;
use crate::header::{RecordHeader, FILE_HEADER_LEN, INDEX_ENTRY_LEN};
use crate::index::{self, InMemoryIndex};
use crate::store::StoreState;

/// Finds the live record whose `[dataPointer, dataPointer + dataCapacity)`
/// interval contains `offset`, skipping `exclude` if given.
///
/// This is an O(n) scan of the in-memory index, by design (see spec §4.8
/// and §9): the index is an unordered map and there is no ordered
/// structure to binary-search.
fn find_header_at_offset(
    index: &InMemoryIndex,
    offset: u64,
    exclude: Option<&str>,
) -> Option<(String, RecordHeader)> {
    index
        .iter()
        .filter(|(key, _)| exclude.map_or(true, |excluded| key.as_str() != excluded))
        .find(|(_, header)| header.data_pointer <= offset && offset < header.end())
        .map(|(key, header)| (key.clone(), *header))
}

/// Guarantees `16 + 80 * required_slots <= data_start_ptr`, relocating
/// live records out of the index region's way if necessary.
pub(crate) fn ensure_index_space(
    state: &mut StoreState,
    required_slots: usize,
) -> Result<(), Error> {
    let end_index_ptr = FILE_HEADER_LEN + INDEX_ENTRY_LEN * required_slots as u64;

    // Empty-store fast path: nothing to relocate, just grow the file.
    if end_index_ptr > state.file_len()? && state.num_records == 0 {
        state.file.set_len(end_index_ptr)?;
        state.data_start_ptr = end_index_ptr;
        state.persist_header()?;
        return Ok(());
    }

    while end_index_ptr > state.data_start_ptr {
        let (key, record) = match find_header_at_offset(&state.index, state.data_start_ptr, None)
        {
            Some(found) => found,
            // The data region at data_start_ptr is empty slack; a consistent
            // store never reaches this with end_index_ptr still ahead, but
            // bail out rather than loop forever if it somehow does.
            None => return Ok(()),
        };

        trace!("relocating {:?} to make room for the index region", key);

        // Capture the original capacity before it gets overwritten below:
        // data_start_ptr must advance by the full old capacity, not the
        // tightened one.
        let old_capacity = record.data_capacity;

        let mut payload = vec![0u8; record.data_size as usize];
        state.file.seek(SeekFrom::Start(record.data_pointer))?;
        state.file.read_exact(&mut payload)?;

        let mut relocated = record;
        relocated.data_pointer = state.file_len()?;
        relocated.data_capacity = relocated.data_size;

        state
            .file
            .set_len(relocated.data_pointer + u64::from(relocated.data_size))?;
        state.file.seek(SeekFrom::Start(relocated.data_pointer))?;
        state.file.write_all(&payload)?;
        index::write_index_slot(&mut state.file, relocated.index_position, &key, relocated)?;
        state.index.insert(key, relocated);

        state.data_start_ptr += u64::from(old_capacity);
        state.persist_header()?;
    }

    Ok(())
}

/// Chooses a home for a new payload of `data_length` bytes: splits an
/// existing record's trailing free space if one is big enough, otherwise
/// appends at the end of the file.
///
/// The returned header has `index_position` unset (`usize::MAX`); the
/// caller fills it in once it knows which slot the new record will live
/// in.
pub(crate) fn allocate(state: &mut StoreState, data_length: u32) -> Result<RecordHeader, Error> {
    // A record's capacity must be at least 1 even for a zero-length
    // payload, so a zero-capacity donor is never split and a fresh
    // allocation is never zero-sized.
    let needed = data_length.max(1);

    let donor = state
        .index
        .iter()
        .find(|(_, header)| header.free_space() >= needed)
        .map(|(key, header)| (key.clone(), *header));

    if let Some((key, mut donor_header)) = donor {
        trace!("splitting donor {:?} to satisfy allocation of {} bytes", key, data_length);
        let split = RecordHeader {
            data_pointer: donor_header.data_pointer + u64::from(donor_header.data_size),
            data_capacity: donor_header.free_space(),
            data_size: 0,
            index_position: usize::MAX,
        };

        donor_header.data_capacity = donor_header.data_size;
        index::write_index_slot(&mut state.file, donor_header.index_position, &key, donor_header)?;
        state.index.insert(key, donor_header);

        return Ok(split);
    }

    trace!("no donor with {} free bytes, appending at end of file", needed);
    let offset = state.file_len()?;
    state.file.set_len(offset + u64::from(needed))?;
    Ok(RecordHeader {
        data_pointer: offset,
        data_capacity: needed,
        data_size: 0,
        index_position: usize::MAX,
    })
}

/// Reclaims the data-region space of a record about to be deleted from
/// the index, per spec §4.5: truncate if it's the tail, coalesce into a
/// predecessor, or absorb into (and shift) a successor.
pub(crate) fn reclaim_deleted_space(
    state: &mut StoreState,
    victim_key: &str,
    victim: RecordHeader,
) -> Result<(), Error> {
    if state.file_len()? == victim.end() {
        state.file.set_len(victim.data_pointer)?;
        return Ok(());
    }

    if let Some(probe) = victim.data_pointer.checked_sub(1) {
        if let Some((pred_key, mut predecessor)) =
            find_header_at_offset(&state.index, probe, Some(victim_key))
        {
            predecessor.data_capacity += victim.data_capacity;
            index::write_index_slot(
                &mut state.file,
                predecessor.index_position,
                &pred_key,
                predecessor,
            )?;
            state.index.insert(pred_key, predecessor);
            return Ok(());
        }
    }

    if let Some((succ_key, mut successor)) =
        find_header_at_offset(&state.index, victim.end(), Some(victim_key))
    {
        let mut payload = vec![0u8; successor.data_size as usize];
        state.file.seek(SeekFrom::Start(successor.data_pointer))?;
        state.file.read_exact(&mut payload)?;

        successor.data_pointer = victim.data_pointer;
        successor.data_capacity += victim.data_capacity;

        state.file.seek(SeekFrom::Start(successor.data_pointer))?;
        state.file.write_all(&payload)?;
        index::write_index_slot(
            &mut state.file,
            successor.index_position,
            &succ_key,
            successor,
        )?;
        state.index.insert(succ_key, successor);
        return Ok(());
    }

    warn!(
        "record at offset {} being deleted is neither the file tail nor has a live neighbor",
        victim.data_pointer
    );
    Err(Error::Corrupt(format!(
        "record at offset {} has no predecessor, successor or tail position to reclaim into",
        victim.data_pointer
    )))
}
