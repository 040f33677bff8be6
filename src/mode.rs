//! Opening modes.
//!
//! The mode is a hint to the file I/O primitives; the allocator and index
//! never inspect it, they just seek/read/write through whatever [`File`]
//! they are handed.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// How the underlying file should be opened and, for the `Sync*` variants,
/// how aggressively committed writes should be flushed to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-only; mutating operations fail with [`crate::Error::ReadOnly`]
    /// before anything is touched.
    ReadOnly,
    /// Regular read-write, no extra flushing.
    ReadWrite,
    /// Read-write; every commit additionally calls `sync_data`.
    SyncData,
    /// Read-write; every commit additionally calls `sync_all`.
    SyncMetadata,
}

impl OpenMode {
    pub fn is_read_only(self) -> bool {
        matches!(self, OpenMode::ReadOnly)
    }

    pub(crate) fn open_options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        match self {
            OpenMode::ReadOnly => {
                options.read(true);
            }
            OpenMode::ReadWrite | OpenMode::SyncData | OpenMode::SyncMetadata => {
                options.read(true).write(true);
            }
        }
        options
    }

    pub(crate) fn open<P: AsRef<Path>>(self, path: P) -> io::Result<File> {
        self.open_options().open(path)
    }

    /// Flushes `file` according to the durability the mode asks for. A
    /// no-op for [`OpenMode::ReadWrite`] and [`OpenMode::ReadOnly`].
    pub(crate) fn commit(self, file: &File) -> io::Result<()> {
        match self {
            OpenMode::SyncData => file.sync_data(),
            OpenMode::SyncMetadata => file.sync_all(),
            OpenMode::ReadOnly | OpenMode::ReadWrite => Ok(()),
        }
    }
}
