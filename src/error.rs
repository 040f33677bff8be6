use std::io;

use thiserror::Error as ThisError;

/// Errors produced by [`crate::RecordsStore`].
#[derive(ThisError, Debug)]
pub enum Error {
    #[error("a store already exists at this path")]
    AlreadyExists,
    #[error("no store exists at this path")]
    NotFound,
    #[error("key already exists")]
    KeyExists,
    #[error("key not found")]
    KeyNotFound,
    #[error("store is open read-only")]
    ReadOnly,
    #[error("encoded key is {len} bytes, the limit is {max}")]
    KeyTooLarge { len: usize, max: usize },
    #[error("allocator returned a record smaller than its payload, the store is corrupt")]
    RecordDoesNotFit,
    #[error("store consistency error: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}
