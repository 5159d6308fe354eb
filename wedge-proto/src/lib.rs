//! Protocol data for the serial keyboard wedge.
//!
//! This crate holds everything that describes *what* is exchanged, without
//! any I/O:
//!
//! - **Config record**: [`ProtocolConfig`] with its bounds and validated
//!   setters
//! - **Codec**: [`encode`] / [`decode`] of the persisted text record
//! - **Record framing**: [`frame_record`] / [`unframe_record`] with CRC-8 for
//!   flash storage
//! - **Keymap**: [`us_keystroke`] ASCII to HID usage table
//!
//! # Record Format
//!
//! ```text
//! <capture_len>,<baud_rate>,<request hex>,<terminator hex>,<replacement hex>,
//! ```
//!
//! # Example
//!
//! ```
//! use wedge_proto::{decode, encode_to_vec, ProtocolConfig};
//!
//! let mut config = ProtocolConfig::fallback();
//! config.set_terminator(b"\r\n").unwrap();
//! config.set_terminator_replacement(b"\t").unwrap();
//!
//! let record = encode_to_vec(&config);
//! assert_eq!(&record[..], b"15,4800,,0d0a,09,");
//! assert_eq!(decode(&record).unwrap(), config);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod codec;
pub mod config;
mod fmt;
pub mod keymap;
pub mod record;

pub use codec::{
    decode, encode, encode_to_vec, encoded_len, DecodeError, EncodeError, DELIMITER,
    MAX_ENCODED_LEN,
};
pub use config::{
    ByteSequence, ConfigError, ConfigField, ProtocolConfig, BAUD_RATE_MAX, BAUD_RATE_MIN,
    CAPTURE_LEN_MAX, CAPTURE_LEN_MIN, MAX_FRAME_LEN, MAX_SEQUENCE_LEN,
};
pub use keymap::{us_keystroke, KeyStroke, LEFT_SHIFT, UNMAPPED};
pub use record::{
    calculate_crc8, frame_record, unframe_record, RecordError, MAX_RECORD_LEN,
    RECORD_HEADER_LEN,
};
