//! UART link to the instrument.
//!
//! # Pins
//!
//! Uses UART1:
//! - GPIO 8: TX
//! - GPIO 9: RX

use embassy_futures::select::{select, Either};
use embassy_rp::uart::{Async, Config, DataBits, Error as UartError, Parity, StopBits, UartRx, UartTx};
use embassy_time::Timer;
use wedge_core::{SerialError, SerialPort};

/// Line idle time after which pending input counts as drained.
const DISCARD_IDLE_MS: u64 = 2;

/// Upper bound on bytes dropped by one discard, for instruments that
/// never stop talking.
const DISCARD_LIMIT: usize = 256;

/// Convert UART errors to [`SerialError`].
///
/// This is a helper function instead of a `From` impl to avoid orphan rule issues
/// (both `UartError` and `SerialError` are defined in external crates).
#[inline]
fn uart_error_to_serial_error(e: UartError) -> SerialError {
    match e {
        UartError::Framing => SerialError::Framing,
        UartError::Overrun => SerialError::Overrun,
        _ => SerialError::Io,
    }
}

/// UART settings for the instrument: 8 data bits, 2 stop bits, no parity.
#[must_use]
pub fn instrument_uart_config(baud_rate: u32) -> Config {
    let mut config = Config::default();
    config.baudrate = baud_rate;
    config.data_bits = DataBits::DataBits8;
    config.stop_bits = StopBits::STOP2;
    config.parity = Parity::ParityNone;
    config
}

/// [`SerialPort`] over a DMA-driven UART.
pub struct UartSerial<'d> {
    tx: UartTx<'d, Async>,
    rx: UartRx<'d, Async>,
}

impl<'d> UartSerial<'d> {
    #[must_use]
    pub fn new(tx: UartTx<'d, Async>, rx: UartRx<'d, Async>) -> Self {
        Self { tx, rx }
    }
}

impl SerialPort for UartSerial<'_> {
    async fn write(&mut self, bytes: &[u8]) -> Result<usize, SerialError> {
        self.tx
            .write(bytes)
            .await
            .map_err(uart_error_to_serial_error)?;
        Ok(bytes.len())
    }

    // One byte per call: a DMA read only completes once its buffer is full.
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, SerialError> {
        let Some(byte) = buf.first_mut() else {
            return Ok(0);
        };
        self.rx
            .read(core::slice::from_mut(byte))
            .await
            .map_err(uart_error_to_serial_error)?;
        Ok(1)
    }

    async fn discard_input(&mut self) {
        let mut byte = [0u8; 1];
        for _ in 0..DISCARD_LIMIT {
            match select(self.rx.read(&mut byte), Timer::after_millis(DISCARD_IDLE_MS)).await {
                Either::First(_) => {}
                Either::Second(()) => return,
            }
        }
        defmt::warn!("input still busy after discarding {} bytes", DISCARD_LIMIT);
    }
}
