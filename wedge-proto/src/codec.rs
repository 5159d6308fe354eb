//! Text codec for persisting a [`ProtocolConfig`].
//!
//! # Record Format
//!
//! ```text
//! <capture_len>,<baud_rate>,<request hex>,<terminator hex>,<replacement hex>,
//! ```
//!
//! - `capture_len`, `baud_rate` - unsigned decimal
//! - byte sequences - two lowercase hex digits per byte, empty when the
//!   sequence is empty
//! - trailing `,` so an empty last field is still delimited
//!
//! # Example
//!
//! ```
//! use wedge_proto::{decode, encode_to_vec, ProtocolConfig};
//!
//! let config = ProtocolConfig::tc101a();
//! let record = encode_to_vec(&config);
//! assert_eq!(&record[..], b"15,4800,51580d0a,0d0a,09,");
//! assert_eq!(decode(&record), Ok(config));
//! ```

use crate::config::{
    ByteSequence, ConfigError, ConfigField, ProtocolConfig, BAUD_RATE_MAX, CAPTURE_LEN_MAX,
    MAX_SEQUENCE_LEN,
};
use crate::fmt::{decimal_width, parse_hex_u8, parse_u32, write_hex_u8, write_u32};
use heapless::Vec;

/// Field delimiter.
pub const DELIMITER: u8 = b',';

/// Maximum size of an encoded record.
///
/// Breakdown: capture_len(2) + baud_rate(4) + 3 * hex(80) + 5 * delimiter = 251
pub const MAX_ENCODED_LEN: usize = decimal_width(CAPTURE_LEN_MAX as u32)
    + decimal_width(BAUD_RATE_MAX)
    + 3 * 2 * MAX_SEQUENCE_LEN
    + 5;

/// Error type for encoding into a caller-provided buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Output buffer is too small for the record.
    BufferTooSmall,
}

/// Error type for decoding a stored record.
///
/// Any error rejects the whole record; no partial config is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Record ended before this field.
    MissingField(ConfigField),
    /// Empty or non-decimal number.
    InvalidNumber(ConfigField),
    /// Odd length or non-hex digit in a byte sequence.
    InvalidHex(ConfigField),
    /// Well-formed value outside the field bounds.
    OutOfRange(ConfigError),
    /// Data after the final delimiter.
    TrailingData,
}

impl From<ConfigError> for DecodeError {
    fn from(err: ConfigError) -> Self {
        DecodeError::OutOfRange(err)
    }
}

/// Bounds-checked cursor over the output buffer.
struct EncodeBuf<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> EncodeBuf<'a> {
    #[inline]
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    fn write_u32(&mut self, value: u32) -> Result<(), EncodeError> {
        if self.remaining() < decimal_width(value) {
            return Err(EncodeError::BufferTooSmall);
        }
        self.pos += write_u32(&mut self.buf[self.pos..], value);
        Ok(())
    }

    #[inline]
    fn write_hex(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        if self.remaining() < bytes.len() * 2 {
            return Err(EncodeError::BufferTooSmall);
        }
        for &b in bytes {
            self.pos += write_hex_u8(&mut self.buf[self.pos..], b);
        }
        Ok(())
    }

    #[inline]
    fn delimit(&mut self) -> Result<(), EncodeError> {
        if self.remaining() < 1 {
            return Err(EncodeError::BufferTooSmall);
        }
        self.buf[self.pos] = DELIMITER;
        self.pos += 1;
        Ok(())
    }
}

/// Length of the encoded form of `config`.
#[must_use]
pub fn encoded_len(config: &ProtocolConfig) -> usize {
    decimal_width(config.capture_len() as u32)
        + decimal_width(config.baud_rate())
        + 2 * (config.request_command().len()
            + config.terminator().len()
            + config.terminator_replacement().len())
        + 5
}

/// Encode `config` into `buf`, returning the number of bytes written.
pub fn encode(config: &ProtocolConfig, buf: &mut [u8]) -> Result<usize, EncodeError> {
    let mut out = EncodeBuf::new(buf);

    out.write_u32(config.capture_len() as u32)?;
    out.delimit()?;
    out.write_u32(config.baud_rate())?;
    out.delimit()?;
    out.write_hex(config.request_command())?;
    out.delimit()?;
    out.write_hex(config.terminator())?;
    out.delimit()?;
    out.write_hex(config.terminator_replacement())?;
    out.delimit()?;

    Ok(out.pos)
}

/// Encode `config` into a fixed-capacity vector.
#[must_use]
pub fn encode_to_vec(config: &ProtocolConfig) -> Vec<u8, MAX_ENCODED_LEN> {
    let mut buf = [0u8; MAX_ENCODED_LEN];
    // A bounded config always fits MAX_ENCODED_LEN
    let len = encode(config, &mut buf).unwrap_or(0);
    Vec::from_slice(&buf[..len]).unwrap_or_default()
}

/// Decode a record produced by [`encode`].
pub fn decode(record: &[u8]) -> Result<ProtocolConfig, DecodeError> {
    let mut tokens = record.split(|&b| b == DELIMITER);
    let mut next = |field| tokens.next().ok_or(DecodeError::MissingField(field));

    let capture_len = next(ConfigField::CaptureLen)?;
    let baud_rate = next(ConfigField::BaudRate)?;
    let request_command = next(ConfigField::RequestCommand)?;
    let terminator = next(ConfigField::Terminator)?;
    let terminator_replacement = next(ConfigField::TerminatorReplacement)?;

    // The trailing delimiter is optional, anything after it is not
    match (tokens.next(), tokens.next()) {
        (None, _) => {}
        (Some(rest), None) if rest.is_empty() => {}
        _ => return Err(DecodeError::TrailingData),
    }

    let mut config = ProtocolConfig::fallback();
    config.set_capture_len(decode_number(ConfigField::CaptureLen, capture_len)? as usize)?;
    config.set_baud_rate(decode_number(ConfigField::BaudRate, baud_rate)?)?;
    config.set_request_command(&decode_hex(ConfigField::RequestCommand, request_command)?)?;
    config.set_terminator(&decode_hex(ConfigField::Terminator, terminator)?)?;
    config.set_terminator_replacement(&decode_hex(
        ConfigField::TerminatorReplacement,
        terminator_replacement,
    )?)?;

    Ok(config)
}

fn decode_number(field: ConfigField, token: &[u8]) -> Result<u32, DecodeError> {
    parse_u32(token).ok_or(DecodeError::InvalidNumber(field))
}

fn decode_hex(field: ConfigField, token: &[u8]) -> Result<ByteSequence, DecodeError> {
    if token.len() % 2 != 0 {
        return Err(DecodeError::InvalidHex(field));
    }
    field.check((token.len() / 2) as u32)?;

    let mut bytes = ByteSequence::new();
    for pair in token.chunks_exact(2) {
        let byte = parse_hex_u8(pair).ok_or(DecodeError::InvalidHex(field))?;
        bytes
            .push(byte)
            .map_err(|_| DecodeError::InvalidHex(field))?;
    }
    Ok(bytes)
}
