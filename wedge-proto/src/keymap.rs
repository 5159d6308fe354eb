//! ASCII to HID keyboard usage mapping (US layout).
//!
//! Usage codes follow the HID Usage Tables, Keyboard/Keypad page (0x07).

/// Usage code meaning "no key"; characters mapped to it are not typed.
pub const UNMAPPED: u8 = 0x00;

/// Left Shift usage code.
pub const LEFT_SHIFT: u8 = 0xE1;

/// First and last modifier usage codes (Left Control .. Right GUI).
pub const MODIFIER_FIRST: u8 = 0xE0;
pub const MODIFIER_LAST: u8 = 0xE7;

/// Key usage and whether Shift must be held to produce the character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyStroke {
    pub code: u8,
    pub shift: bool,
}

impl KeyStroke {
    /// Stroke that produces nothing.
    pub const NONE: Self = Self::plain(UNMAPPED);

    #[inline]
    #[must_use]
    pub const fn plain(code: u8) -> Self {
        Self { code, shift: false }
    }

    #[inline]
    #[must_use]
    pub const fn shifted(code: u8) -> Self {
        Self { code, shift: true }
    }

    #[inline]
    #[must_use]
    pub const fn is_mapped(self) -> bool {
        self.code != UNMAPPED
    }
}

/// Map an ASCII byte to its US-layout key stroke.
///
/// CR and LF both map to Return. Control characters other than TAB, CR
/// and LF, DEL and bytes above 0x7F are unmapped.
#[must_use]
pub const fn us_keystroke(c: u8) -> KeyStroke {
    match c {
        b'a'..=b'z' => KeyStroke::plain(0x04 + (c - b'a')),
        b'A'..=b'Z' => KeyStroke::shifted(0x04 + (c - b'A')),
        b'1'..=b'9' => KeyStroke::plain(0x1E + (c - b'1')),
        b'0' => KeyStroke::plain(0x27),
        b'\r' | b'\n' => KeyStroke::plain(0x28),
        b'\t' => KeyStroke::plain(0x2B),
        b' ' => KeyStroke::plain(0x2C),
        // Shifted digit row
        b'!' => KeyStroke::shifted(0x1E),
        b'@' => KeyStroke::shifted(0x1F),
        b'#' => KeyStroke::shifted(0x20),
        b'$' => KeyStroke::shifted(0x21),
        b'%' => KeyStroke::shifted(0x22),
        b'^' => KeyStroke::shifted(0x23),
        b'&' => KeyStroke::shifted(0x24),
        b'*' => KeyStroke::shifted(0x25),
        b'(' => KeyStroke::shifted(0x26),
        b')' => KeyStroke::shifted(0x27),
        // Punctuation
        b'-' => KeyStroke::plain(0x2D),
        b'_' => KeyStroke::shifted(0x2D),
        b'=' => KeyStroke::plain(0x2E),
        b'+' => KeyStroke::shifted(0x2E),
        b'[' => KeyStroke::plain(0x2F),
        b'{' => KeyStroke::shifted(0x2F),
        b']' => KeyStroke::plain(0x30),
        b'}' => KeyStroke::shifted(0x30),
        b'\\' => KeyStroke::plain(0x31),
        b'|' => KeyStroke::shifted(0x31),
        b';' => KeyStroke::plain(0x33),
        b':' => KeyStroke::shifted(0x33),
        b'\'' => KeyStroke::plain(0x34),
        b'"' => KeyStroke::shifted(0x34),
        b'`' => KeyStroke::plain(0x35),
        b'~' => KeyStroke::shifted(0x35),
        b',' => KeyStroke::plain(0x36),
        b'<' => KeyStroke::shifted(0x36),
        b'.' => KeyStroke::plain(0x37),
        b'>' => KeyStroke::shifted(0x37),
        b'/' => KeyStroke::plain(0x38),
        b'?' => KeyStroke::shifted(0x38),
        _ => KeyStroke::NONE,
    }
}
