//! Protocol parameters of the instrument link and their bounds.

use core::fmt;
use heapless::Vec;

/// Smallest accepted capture length (bytes kept from one response).
pub const CAPTURE_LEN_MIN: usize = 15;
/// Largest accepted capture length.
pub const CAPTURE_LEN_MAX: usize = 99;

/// Slowest supported instrument baud rate.
pub const BAUD_RATE_MIN: u32 = 1200;
/// Fastest supported instrument baud rate.
pub const BAUD_RATE_MAX: u32 = 9600;

/// Maximum length of the request command, terminator and replacement.
pub const MAX_SEQUENCE_LEN: usize = 40;

/// Size of the shared frame buffer: the longest capture, the longest
/// replacement and the NUL terminator.
pub const MAX_FRAME_LEN: usize = CAPTURE_LEN_MAX + MAX_SEQUENCE_LEN + 1;

/// Bounded byte sequence used for command, terminator and replacement.
pub type ByteSequence = Vec<u8, MAX_SEQUENCE_LEN>;

/// Identifies a field of [`ProtocolConfig`] in errors and log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigField {
    CaptureLen,
    BaudRate,
    RequestCommand,
    Terminator,
    TerminatorReplacement,
}

impl ConfigField {
    /// Operator-facing field name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ConfigField::CaptureLen => "Receive Buffer Length",
            ConfigField::BaudRate => "Baud Rate",
            ConfigField::RequestCommand => "Request Command",
            ConfigField::Terminator => "Receive Terminator",
            ConfigField::TerminatorReplacement => "Receive Terminator Replace",
        }
    }

    /// Inclusive `(min, max)` bound of the field.
    ///
    /// Numeric fields are bounded by value, byte sequences by length.
    #[must_use]
    pub const fn bounds(self) -> (u32, u32) {
        match self {
            ConfigField::CaptureLen => (CAPTURE_LEN_MIN as u32, CAPTURE_LEN_MAX as u32),
            ConfigField::BaudRate => (BAUD_RATE_MIN, BAUD_RATE_MAX),
            ConfigField::RequestCommand
            | ConfigField::Terminator
            | ConfigField::TerminatorReplacement => (0, MAX_SEQUENCE_LEN as u32),
        }
    }

    /// Check `actual` against the field bounds.
    pub const fn check(self, actual: u32) -> Result<(), ConfigError> {
        let (min, max) = self.bounds();
        if actual < min || actual > max {
            Err(ConfigError::OutOfRange {
                field: self,
                min,
                max,
                actual,
            })
        } else {
            Ok(())
        }
    }
}

/// Validation error returned by the [`ProtocolConfig`] setters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Value (or sequence length) outside the field's inclusive bounds.
    OutOfRange {
        field: ConfigField,
        min: u32,
        max: u32,
        actual: u32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ConfigError::OutOfRange {
                field,
                min,
                max,
                actual,
            } => {
                if actual < min {
                    write!(f, "{} needs >= {}. input is {}", field.name(), min, actual)
                } else {
                    write!(f, "{} needs <= {}. input is {}", field.name(), max, actual)
                }
            }
        }
    }
}

/// Protocol parameters for one instrument.
///
/// Fields are private so every value stays within its bounds; mutate
/// through the `set_*` methods, which leave the field untouched on error.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProtocolConfig {
    capture_len: usize,
    baud_rate: u32,
    request_command: ByteSequence,
    terminator: ByteSequence,
    terminator_replacement: ByteSequence,
}

impl ProtocolConfig {
    /// Configuration used when nothing valid is stored: 15 byte capture at
    /// 4800 baud, no request command, no terminator, no replacement.
    #[must_use]
    pub const fn fallback() -> Self {
        Self {
            capture_len: CAPTURE_LEN_MIN,
            baud_rate: 4800,
            request_command: Vec::new(),
            terminator: Vec::new(),
            terminator_replacement: Vec::new(),
        }
    }

    /// Preset for the Nikon TC-101A: `QX\r\n` request, CR+LF terminator
    /// replaced by a TAB.
    #[must_use]
    pub fn tc101a() -> Self {
        let mut config = Self::fallback();
        config.request_command.extend_from_slice(b"QX\r\n").ok();
        config.terminator.extend_from_slice(b"\r\n").ok();
        config.terminator_replacement.push(b'\t').ok();
        config
    }

    /// Build a config from raw values, validating every field.
    pub fn new(
        capture_len: usize,
        baud_rate: u32,
        request_command: &[u8],
        terminator: &[u8],
        terminator_replacement: &[u8],
    ) -> Result<Self, ConfigError> {
        let mut config = Self::fallback();
        config.set_capture_len(capture_len)?;
        config.set_baud_rate(baud_rate)?;
        config.set_request_command(request_command)?;
        config.set_terminator(terminator)?;
        config.set_terminator_replacement(terminator_replacement)?;
        Ok(config)
    }

    #[inline]
    #[must_use]
    pub fn capture_len(&self) -> usize {
        self.capture_len
    }

    #[inline]
    #[must_use]
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    #[inline]
    #[must_use]
    pub fn request_command(&self) -> &[u8] {
        &self.request_command
    }

    /// Trailing sequence that ends a response. Empty means any single
    /// received byte completes the capture.
    #[inline]
    #[must_use]
    pub fn terminator(&self) -> &[u8] {
        &self.terminator
    }

    #[inline]
    #[must_use]
    pub fn terminator_replacement(&self) -> &[u8] {
        &self.terminator_replacement
    }

    pub fn set_capture_len(&mut self, len: usize) -> Result<(), ConfigError> {
        ConfigField::CaptureLen.check(saturate(len))?;
        self.capture_len = len;
        Ok(())
    }

    /// Takes effect once the UART is reopened (next boot).
    pub fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), ConfigError> {
        ConfigField::BaudRate.check(baud_rate)?;
        self.baud_rate = baud_rate;
        Ok(())
    }

    pub fn set_request_command(&mut self, bytes: &[u8]) -> Result<(), ConfigError> {
        self.request_command = bounded(ConfigField::RequestCommand, bytes)?;
        Ok(())
    }

    pub fn set_terminator(&mut self, bytes: &[u8]) -> Result<(), ConfigError> {
        self.terminator = bounded(ConfigField::Terminator, bytes)?;
        Ok(())
    }

    pub fn set_terminator_replacement(&mut self, bytes: &[u8]) -> Result<(), ConfigError> {
        self.terminator_replacement = bounded(ConfigField::TerminatorReplacement, bytes)?;
        Ok(())
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self::fallback()
    }
}

#[inline]
fn saturate(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

fn bounded(field: ConfigField, bytes: &[u8]) -> Result<ByteSequence, ConfigError> {
    field.check(saturate(bytes.len()))?;
    // Length was checked against MAX_SEQUENCE_LEN above
    Vec::from_slice(bytes).map_err(|_| ConfigError::OutOfRange {
        field,
        min: 0,
        max: MAX_SEQUENCE_LEN as u32,
        actual: saturate(bytes.len()),
    })
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::string::ToString;

    #[test]
    fn test_fallback_values() {
        let config = ProtocolConfig::fallback();
        assert_eq!(config.capture_len(), 15);
        assert_eq!(config.baud_rate(), 4800);
        assert!(config.request_command().is_empty());
        assert!(config.terminator().is_empty());
        assert!(config.terminator_replacement().is_empty());
    }

    #[test]
    fn test_tc101a_preset() {
        let config = ProtocolConfig::tc101a();
        assert_eq!(config.request_command(), b"QX\r\n");
        assert_eq!(config.terminator(), b"\r\n");
        assert_eq!(config.terminator_replacement(), b"\t");
    }

    #[test]
    fn test_capture_len_bounds() {
        let mut config = ProtocolConfig::fallback();
        assert!(config.set_capture_len(15).is_ok());
        assert!(config.set_capture_len(99).is_ok());
        assert_eq!(config.capture_len(), 99);

        assert_eq!(
            config.set_capture_len(14),
            Err(ConfigError::OutOfRange {
                field: ConfigField::CaptureLen,
                min: 15,
                max: 99,
                actual: 14,
            })
        );
        assert!(config.set_capture_len(100).is_err());
        // Unchanged after failures
        assert_eq!(config.capture_len(), 99);
    }

    #[test]
    fn test_baud_rate_bounds() {
        let mut config = ProtocolConfig::fallback();
        assert!(config.set_baud_rate(1200).is_ok());
        assert!(config.set_baud_rate(9600).is_ok());
        assert!(config.set_baud_rate(1199).is_err());
        assert!(config.set_baud_rate(115_200).is_err());
        assert_eq!(config.baud_rate(), 9600);
    }

    #[test]
    fn test_sequence_setters_reject_overlong() {
        let mut config = ProtocolConfig::tc101a();
        let long = [b'x'; MAX_SEQUENCE_LEN + 1];

        assert!(config.set_request_command(&long).is_err());
        assert!(config.set_terminator(&long).is_err());
        assert!(config.set_terminator_replacement(&long).is_err());

        assert_eq!(config, ProtocolConfig::tc101a());
    }

    #[test]
    fn test_sequence_setters_accept_empty_and_max() {
        let mut config = ProtocolConfig::tc101a();
        let max = [b'x'; MAX_SEQUENCE_LEN];

        config.set_terminator(&[]).unwrap();
        assert!(config.terminator().is_empty());

        config.set_request_command(&max).unwrap();
        assert_eq!(config.request_command().len(), MAX_SEQUENCE_LEN);
    }

    #[test]
    fn test_new_validates_every_field() {
        assert!(ProtocolConfig::new(20, 9600, b"QX\r\n", b"\r\n", b"\t").is_ok());
        assert!(matches!(
            ProtocolConfig::new(20, 300, b"", b"", b""),
            Err(ConfigError::OutOfRange {
                field: ConfigField::BaudRate,
                ..
            })
        ));
    }

    #[test]
    fn test_error_message() {
        let low = ConfigField::BaudRate.check(300).unwrap_err();
        assert_eq!(low.to_string(), "Baud Rate needs >= 1200. input is 300");

        let high = ConfigField::CaptureLen.check(120).unwrap_err();
        assert_eq!(
            high.to_string(),
            "Receive Buffer Length needs <= 99. input is 120"
        );
    }
}
