//! No-std number formatting and parsing helpers for the config record.
//!
//! These functions work directly on byte buffers without heap allocation
//! or the standard library.

/// Lowercase hex digits lookup table.
const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Maximum decimal width of a `u32` ("4294967295").
pub const MAX_U32_DIGITS: usize = 10;

/// Write a u8 as 2 lowercase hex digits.
///
/// Returns the number of bytes written (always 2).
///
/// # Panics
///
/// Panics if `buf.len() < 2`.
#[inline]
pub fn write_hex_u8(buf: &mut [u8], value: u8) -> usize {
    debug_assert!(buf.len() >= 2, "buffer too small for hex u8");
    buf[0] = HEX_DIGITS[(value >> 4) as usize];
    buf[1] = HEX_DIGITS[(value & 0xF) as usize];
    2
}

/// Write a u32 as an unsigned decimal string.
///
/// Returns the number of bytes written (1-10 bytes).
///
/// # Panics
///
/// Panics if `buf` is shorter than the rendered number.
#[inline]
pub fn write_u32(buf: &mut [u8], value: u32) -> usize {
    if value == 0 {
        buf[0] = b'0';
        return 1;
    }

    // Digits come out least significant first
    let mut temp = [0u8; MAX_U32_DIGITS];
    let mut n = value;
    let mut len = 0;
    while n > 0 {
        temp[len] = b'0' + (n % 10) as u8;
        n /= 10;
        len += 1;
    }

    for i in 0..len {
        buf[i] = temp[len - 1 - i];
    }

    len
}

/// Number of decimal digits needed to render `value`.
#[inline]
#[must_use]
pub const fn decimal_width(value: u32) -> usize {
    let mut n = value;
    let mut width = 1;
    while n >= 10 {
        n /= 10;
        width += 1;
    }
    width
}

/// Parse an unsigned decimal number.
///
/// Rejects empty input, signs, whitespace and overflow.
#[inline]
pub fn parse_u32(s: &[u8]) -> Option<u32> {
    if s.is_empty() || s.len() > MAX_U32_DIGITS {
        return None;
    }

    let mut result: u32 = 0;
    for &c in s {
        if !c.is_ascii_digit() {
            return None;
        }
        result = result.checked_mul(10)?.checked_add((c - b'0') as u32)?;
    }

    Some(result)
}

/// Value of a single hex digit (either case).
#[inline]
fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Parse exactly two hex digits into a byte.
#[inline]
pub fn parse_hex_u8(pair: &[u8]) -> Option<u8> {
    match pair {
        [hi, lo] => Some((hex_value(*hi)? << 4) | hex_value(*lo)?),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_hex_u8_is_lowercase() {
        let mut buf = [0u8; 2];

        write_hex_u8(&mut buf, 0x00);
        assert_eq!(&buf, b"00");

        write_hex_u8(&mut buf, 0xFF);
        assert_eq!(&buf, b"ff");

        write_hex_u8(&mut buf, 0x0D);
        assert_eq!(&buf, b"0d");
    }

    #[test]
    fn test_write_u32() {
        let mut buf = [0u8; MAX_U32_DIGITS];

        let len = write_u32(&mut buf, 0);
        assert_eq!(&buf[..len], b"0");

        let len = write_u32(&mut buf, 15);
        assert_eq!(&buf[..len], b"15");

        let len = write_u32(&mut buf, 9600);
        assert_eq!(&buf[..len], b"9600");

        let len = write_u32(&mut buf, u32::MAX);
        assert_eq!(&buf[..len], b"4294967295");
    }

    #[test]
    fn test_decimal_width() {
        assert_eq!(decimal_width(0), 1);
        assert_eq!(decimal_width(9), 1);
        assert_eq!(decimal_width(99), 2);
        assert_eq!(decimal_width(9600), 4);
        assert_eq!(decimal_width(u32::MAX), 10);
    }

    #[test]
    fn test_parse_u32() {
        assert_eq!(parse_u32(b"0"), Some(0));
        assert_eq!(parse_u32(b"4800"), Some(4800));
        assert_eq!(parse_u32(b"4294967295"), Some(u32::MAX));
        assert_eq!(parse_u32(b"4294967296"), None);
        assert_eq!(parse_u32(b""), None);
        assert_eq!(parse_u32(b"-1"), None);
        assert_eq!(parse_u32(b"+1"), None);
        assert_eq!(parse_u32(b"12a"), None);
        assert_eq!(parse_u32(b" 12"), None);
    }

    #[test]
    fn test_parse_hex_u8() {
        assert_eq!(parse_hex_u8(b"0d"), Some(0x0D));
        assert_eq!(parse_hex_u8(b"0D"), Some(0x0D));
        assert_eq!(parse_hex_u8(b"ff"), Some(0xFF));
        assert_eq!(parse_hex_u8(b"g0"), None);
        assert_eq!(parse_hex_u8(b"0"), None);
        assert_eq!(parse_hex_u8(b"000"), None);
    }
}
