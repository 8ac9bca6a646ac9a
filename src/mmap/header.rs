//! On-disk header codec.
//!
//! The persistent format is a fixed-offset record followed by the bit array.
//! Fields are encoded at explicit byte offsets with native endianness — a
//! filter file is only portable between hosts sharing byte order, by
//! contract. No implicit struct layout is relied on in either direction.
//!
//! # Layout
//!
//! | Offset | Size | Field                                    |
//! |--------|------|------------------------------------------|
//! | 0      | 24   | magic tag (ASCII)                        |
//! | 24     | 8    | capacity (u64)                           |
//! | 32     | 8    | error rate (f64)                         |
//! | 40     | 8    | saturation counter (u64, mutable)        |
//! | 48     | n*8  | bit array (n 64-bit words, mutable)      |

use crate::error::{Result, ShmBloomError};

/// 24-byte ASCII identification tag at offset 0.
pub const MAGIC: &[u8; 24] = b"SharedMemory BloomFilter";

/// Byte offset of the capacity field.
pub const CAPACITY_OFFSET: usize = 24;
/// Byte offset of the error rate field.
pub const ERROR_RATE_OFFSET: usize = 32;
/// Byte offset of the mutable saturation counter.
pub const COUNTER_OFFSET: usize = 40;
/// Byte offset of the first bit array word; also the total header size.
pub const BITS_OFFSET: usize = 48;

/// The two persisted inputs every derived parameter is recomputed from.
///
/// The counter is not part of this struct: it is mutable shared state,
/// written once at creation and thereafter only touched through the mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Header {
    /// Insertions before the saturation counter triggers a reset.
    pub capacity: u64,
    /// Target false positive rate.
    pub error_rate: f64,
}

impl Header {
    /// Encode the full 48-byte header for a freshly created file.
    ///
    /// The counter slot is initialized to `capacity`: a new filter starts
    /// with its full insertion budget.
    #[must_use]
    pub fn encode(&self) -> [u8; BITS_OFFSET] {
        let mut buf = [0u8; BITS_OFFSET];
        buf[..CAPACITY_OFFSET].copy_from_slice(MAGIC);
        buf[CAPACITY_OFFSET..ERROR_RATE_OFFSET].copy_from_slice(&self.capacity.to_ne_bytes());
        buf[ERROR_RATE_OFFSET..COUNTER_OFFSET]
            .copy_from_slice(&self.error_rate.to_bits().to_ne_bytes());
        buf[COUNTER_OFFSET..BITS_OFFSET].copy_from_slice(&self.capacity.to_ne_bytes());
        buf
    }

    /// Validate and decode a header read back from an existing file.
    ///
    /// # Errors
    ///
    /// [`ShmBloomError::Format`] if fewer than 48 bytes are supplied or the
    /// magic tag does not match. A mismatching file is foreign and must not
    /// be touched further.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < BITS_OFFSET {
            return Err(ShmBloomError::format(format!(
                "truncated header ({} bytes, need {})",
                bytes.len(),
                BITS_OFFSET
            )));
        }
        if &bytes[..CAPACITY_OFFSET] != MAGIC {
            return Err(ShmBloomError::format("magic tag mismatch"));
        }

        let mut word = [0u8; 8];
        word.copy_from_slice(&bytes[CAPACITY_OFFSET..ERROR_RATE_OFFSET]);
        let capacity = u64::from_ne_bytes(word);
        word.copy_from_slice(&bytes[ERROR_RATE_OFFSET..COUNTER_OFFSET]);
        let error_rate = f64::from_bits(u64::from_ne_bytes(word));

        Ok(Self {
            capacity,
            error_rate,
        })
    }
}

/// Total file size for a filter with the given bit array word count.
#[inline]
#[must_use]
pub fn file_len(words: u64) -> u64 {
    BITS_OFFSET as u64 + words * 8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_is_24_ascii_bytes() {
        assert_eq!(MAGIC.len(), 24);
        assert!(MAGIC.iter().all(u8::is_ascii));
    }

    #[test]
    fn test_offsets() {
        assert_eq!(CAPACITY_OFFSET, 24);
        assert_eq!(ERROR_RATE_OFFSET, 32);
        assert_eq!(COUNTER_OFFSET, 40);
        assert_eq!(BITS_OFFSET, 48);
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let header = Header {
            capacity: 1000,
            error_rate: 1.0 / 128.0,
        };
        let buf = header.encode();
        assert_eq!(Header::decode(&buf).unwrap(), header);
    }

    #[test]
    fn test_encode_initializes_counter_to_capacity() {
        let header = Header {
            capacity: 777,
            error_rate: 0.01,
        };
        let buf = header.encode();
        let mut word = [0u8; 8];
        word.copy_from_slice(&buf[COUNTER_OFFSET..BITS_OFFSET]);
        assert_eq!(u64::from_ne_bytes(word), 777);
    }

    #[test]
    fn test_decode_rejects_bad_magic() {
        let header = Header {
            capacity: 1,
            error_rate: 0.5,
        };
        let mut buf = header.encode();
        buf[0] ^= 0xFF;
        let err = Header::decode(&buf).unwrap_err();
        assert!(matches!(err, ShmBloomError::Format { .. }));
    }

    #[test]
    fn test_decode_rejects_truncated() {
        let err = Header::decode(&[0u8; 47]).unwrap_err();
        assert!(matches!(err, ShmBloomError::Format { .. }));
    }

    #[test]
    fn test_file_len() {
        assert_eq!(file_len(0), 48);
        assert_eq!(file_len(4), 48 + 32);
        assert_eq!(file_len(316), 48 + 316 * 8);
    }
}
