//! Serial port trait and error types.

use core::future::Future;

/// Error type for serial operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialError {
    /// UART/communication I/O error.
    Io,
    /// UART framing error.
    Framing,
    /// Receive FIFO overrun.
    Overrun,
}

/// Byte-level link to the instrument.
///
/// Implementations wrap an already configured UART. Reads are not bounded
/// here; the capture machine races them against its own timeout, so a
/// `read` future must tolerate being dropped before completion.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait SerialPort {
    /// Write `bytes` to the instrument, returning the number written.
    fn write(&mut self, bytes: &[u8]) -> impl Future<Output = Result<usize, SerialError>>;

    /// Wait for at least one byte and read as many as are available.
    fn read(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<usize, SerialError>>;

    /// Drop any bytes already waiting in the receive path.
    fn discard_input(&mut self) -> impl Future<Output = ()>;
}
