//! Framing for the config record in persistent storage.
//!
//! ```text
//! | magic "WDG1" (4) | payload len u16 LE (2) | CRC-8/SMBUS (1) | payload |
//! ```
//!
//! Erased NOR flash reads back as `0xFF`, which never matches the magic,
//! so an unprogrammed slot is reported as [`RecordError::NotFound`].

use crate::codec::MAX_ENCODED_LEN;
use crc::{Crc, CRC_8_SMBUS};

/// CRC-8/SMBUS calculator with 256-byte lookup table.
const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);

/// Marker at the start of every stored record.
pub const RECORD_MAGIC: [u8; 4] = *b"WDG1";

/// Size of the record header.
pub const RECORD_HEADER_LEN: usize = 7;

/// Bytes needed to store the largest record.
pub const MAX_RECORD_LEN: usize = RECORD_HEADER_LEN + MAX_ENCODED_LEN;

/// Error type for record framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordError {
    /// Slot is erased; nothing was ever saved.
    NotFound,
    /// Bad magic, impossible length or checksum mismatch.
    Corrupt,
    /// Payload or output buffer exceeds the allowed size.
    BufferTooSmall,
}

/// Calculate CRC-8 checksum of a byte slice.
#[inline]
#[must_use]
pub fn calculate_crc8(data: &[u8]) -> u8 {
    CRC8.checksum(data)
}

/// Wrap `payload` with the record header into `out`.
///
/// Returns the total number of bytes written.
pub fn frame_record(payload: &[u8], out: &mut [u8]) -> Result<usize, RecordError> {
    let total = RECORD_HEADER_LEN + payload.len();
    if payload.len() > MAX_ENCODED_LEN || out.len() < total {
        return Err(RecordError::BufferTooSmall);
    }

    out[..4].copy_from_slice(&RECORD_MAGIC);
    out[4..6].copy_from_slice(&(payload.len() as u16).to_le_bytes());
    out[6] = calculate_crc8(payload);
    out[RECORD_HEADER_LEN..total].copy_from_slice(payload);

    Ok(total)
}

/// Validate a stored slot and return its payload.
pub fn unframe_record(stored: &[u8]) -> Result<&[u8], RecordError> {
    if stored.len() < RECORD_HEADER_LEN {
        return Err(RecordError::Corrupt);
    }
    if stored[..4].iter().all(|&b| b == 0xFF) {
        return Err(RecordError::NotFound);
    }
    if stored[..4] != RECORD_MAGIC {
        return Err(RecordError::Corrupt);
    }

    let len = u16::from_le_bytes([stored[4], stored[5]]) as usize;
    if len > MAX_ENCODED_LEN || stored.len() < RECORD_HEADER_LEN + len {
        return Err(RecordError::Corrupt);
    }

    let payload = &stored[RECORD_HEADER_LEN..RECORD_HEADER_LEN + len];
    if calculate_crc8(payload) != stored[6] {
        return Err(RecordError::Corrupt);
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc8_empty() {
        assert_eq!(calculate_crc8(&[]), 0x00);
    }

    #[test]
    fn test_frame_then_unframe() {
        let mut slot = [0xFFu8; MAX_RECORD_LEN];
        let len = frame_record(b"15,4800,,,,", &mut slot).unwrap();
        assert_eq!(len, RECORD_HEADER_LEN + 11);
        assert_eq!(&slot[..4], b"WDG1");
        assert_eq!(unframe_record(&slot), Ok(&b"15,4800,,,,"[..]));
    }

    #[test]
    fn test_erased_slot_is_not_found() {
        let slot = [0xFFu8; MAX_RECORD_LEN];
        assert_eq!(unframe_record(&slot), Err(RecordError::NotFound));
    }

    #[test]
    fn test_bad_magic_is_corrupt() {
        let slot = [0u8; MAX_RECORD_LEN];
        assert_eq!(unframe_record(&slot), Err(RecordError::Corrupt));
    }

    #[test]
    fn test_flipped_payload_bit_is_corrupt() {
        let mut slot = [0xFFu8; MAX_RECORD_LEN];
        frame_record(b"15,4800,,,,", &mut slot).unwrap();
        slot[RECORD_HEADER_LEN] ^= 0x01;
        assert_eq!(unframe_record(&slot), Err(RecordError::Corrupt));
    }

    #[test]
    fn test_impossible_length_is_corrupt() {
        let mut slot = [0xFFu8; MAX_RECORD_LEN];
        frame_record(b"15,4800,,,,", &mut slot).unwrap();
        slot[4..6].copy_from_slice(&1000u16.to_le_bytes());
        assert_eq!(unframe_record(&slot), Err(RecordError::Corrupt));
    }

    #[test]
    fn test_frame_rejects_small_output() {
        let mut out = [0u8; 8];
        assert_eq!(
            frame_record(b"15,4800,,,,", &mut out),
            Err(RecordError::BufferTooSmall)
        );
    }
}
