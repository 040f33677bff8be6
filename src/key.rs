//! Encoding and decoding of index keys.
//!
//! A key is stored length-prefixed: a 16-bit big-endian byte length followed
//! by that many bytes of UTF-8. The prefix plus the bytes must fit within
//! [`MAX_KEY_LEN`]; the remainder of the 64-byte key slot is unused slack.

use crate::error::Error;
use crate::header::MAX_KEY_LEN;

/// Size, in bytes, of the length prefix in front of an encoded key.
const LEN_PREFIX_SIZE: usize = 2;

/// Encodes `key` as a length-prefixed byte string.
///
/// Fails with [`Error::KeyTooLarge`] if the prefix plus the encoded bytes
/// would not fit inside [`MAX_KEY_LEN`] bytes.
pub fn encode(key: &str) -> Result<Vec<u8>, Error> {
    let bytes = key.as_bytes();
    let total = LEN_PREFIX_SIZE + bytes.len();
    if total > MAX_KEY_LEN {
        return Err(Error::KeyTooLarge {
            len: total,
            max: MAX_KEY_LEN,
        });
    }

    let len = bytes.len() as u16;
    let mut encoded = Vec::with_capacity(total);
    encoded.extend_from_slice(&len.to_be_bytes());
    encoded.extend_from_slice(bytes);
    Ok(encoded)
}

/// Decodes a key previously written by [`encode`] out of a 64-byte slot.
///
/// Only the length prefix and the bytes it names are read; trailing slack
/// in the slot is ignored.
pub fn decode(slot: &[u8]) -> Result<String, Error> {
    let len = u16::from_be_bytes([slot[0], slot[1]]) as usize;
    let end = LEN_PREFIX_SIZE + len;
    if end > slot.len() {
        return Err(Error::Corrupt(format!(
            "key length prefix {} exceeds the {}-byte key slot",
            len,
            slot.len()
        )));
    }
    String::from_utf8(slot[LEN_PREFIX_SIZE..end].to_vec())
        .map_err(|err| Error::Corrupt(format!("key is not valid UTF-8: {err}")))
}
