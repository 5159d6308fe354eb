//! Key event sink trait and HID keyboard report folding.

use core::future::Future;
use wedge_proto::keymap::{MODIFIER_FIRST, MODIFIER_LAST};

/// Error type for output operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputError {
    /// Report could not be delivered to the host.
    Io,
}

/// A single key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEvent {
    /// HID keyboard usage code.
    pub code: u8,
    pub pressed: bool,
}

impl KeyEvent {
    #[inline]
    #[must_use]
    pub const fn press(code: u8) -> Self {
        Self {
            code,
            pressed: true,
        }
    }

    #[inline]
    #[must_use]
    pub const fn release(code: u8) -> Self {
        Self {
            code,
            pressed: false,
        }
    }
}

/// Async trait for HID keyboard transports.
///
/// Calls complete in order; the dispatcher relies on each event being
/// delivered before the next one is issued.
pub trait KeyEventSink {
    /// Deliver one key press or release to the host.
    fn emit(&mut self, event: KeyEvent) -> impl Future<Output = Result<(), OutputError>>;
}

/// Boot-protocol keyboard input report.
///
/// Layout (8 bytes): modifier bitfield, reserved, six key slots.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    pub modifier: u8,
    pub keycodes: [u8; 6],
}

impl KeyboardReport {
    /// Size of the report in bytes.
    pub const SIZE: usize = 8;

    /// Convert the report to bytes.
    #[must_use]
    pub fn as_bytes(&self) -> [u8; Self::SIZE] {
        let k = self.keycodes;
        [self.modifier, 0, k[0], k[1], k[2], k[3], k[4], k[5]]
    }
}

/// Folds [`KeyEvent`]s into successive [`KeyboardReport`]s.
///
/// Modifier usages (`0xE0..=0xE7`) toggle their bit in the modifier byte;
/// any other usage occupies the first key slot while pressed. Typing is
/// strictly one key at a time, so a single slot is enough.
#[derive(Clone, Copy, Default, Debug)]
pub struct KeyboardState {
    report: KeyboardReport,
}

impl KeyboardState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            report: KeyboardReport {
                modifier: 0,
                keycodes: [0; 6],
            },
        }
    }

    /// Apply `event` and return the report the host should now see.
    pub fn apply(&mut self, event: KeyEvent) -> KeyboardReport {
        if (MODIFIER_FIRST..=MODIFIER_LAST).contains(&event.code) {
            let bit = 1 << (event.code - MODIFIER_FIRST);
            if event.pressed {
                self.report.modifier |= bit;
            } else {
                self.report.modifier &= !bit;
            }
        } else if event.pressed {
            self.report.keycodes[0] = event.code;
        } else if self.report.keycodes[0] == event.code {
            self.report.keycodes[0] = 0;
        }
        self.report
    }

    /// Report with every key released.
    pub fn release_all(&mut self) -> KeyboardReport {
        self.report = KeyboardReport::default();
        self.report
    }
}
