//! Character to key stroke lookup.

use wedge_proto::{us_keystroke, KeyStroke};

/// Maps one frame byte to the key stroke that types it.
///
/// A stroke with code `0` means the byte has no key and is skipped.
pub trait KeyMap {
    fn map(&self, byte: u8) -> KeyStroke;
}

/// US keyboard layout for ASCII `0..=127`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsLayout;

impl KeyMap for UsLayout {
    #[inline]
    fn map(&self, byte: u8) -> KeyStroke {
        us_keystroke(byte)
    }
}

impl<F: Fn(u8) -> KeyStroke> KeyMap for F {
    #[inline]
    fn map(&self, byte: u8) -> KeyStroke {
        self(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_us_layout() {
        assert_eq!(UsLayout.map(b'A'), KeyStroke::shifted(0x04));
        assert_eq!(UsLayout.map(b'1'), KeyStroke::plain(0x1E));
        assert!(!UsLayout.map(0x80).is_mapped());
    }

    #[test]
    fn test_closure_keymap() {
        let only_x = |b: u8| {
            if b == b'x' {
                KeyStroke::plain(0x1B)
            } else {
                KeyStroke::NONE
            }
        };
        assert_eq!(only_x.map(b'x').code, 0x1B);
        assert!(!only_x.map(b'y').is_mapped());
    }
}
