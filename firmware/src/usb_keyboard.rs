//! USB HID boot keyboard output.

use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_usb::class::hid::{HidBootProtocol, HidSubclass, HidWriter, State};
use embassy_usb::Builder;
use usbd_hid::descriptor::{KeyboardReport as BootKeyboard, SerializedDescriptor};
use wedge_core::{KeyEvent, KeyEventSink, KeyboardReport, KeyboardState, OutputError};

/// HID writer for the 8-byte boot keyboard input report.
pub type KeyboardWriter<'d> = HidWriter<'d, Driver<'d, USB>, { KeyboardReport::SIZE }>;

/// USB keyboard that turns key events into boot reports.
///
/// Keeps the currently pressed keys so every event produces the full
/// report the host expects.
pub struct UsbKeyboard<'d> {
    writer: KeyboardWriter<'d>,
    state: KeyboardState,
}

impl<'d> UsbKeyboard<'d> {
    #[must_use]
    pub fn new(writer: KeyboardWriter<'d>) -> Self {
        Self {
            writer,
            state: KeyboardState::new(),
        }
    }

    /// Wait until the host has configured the device, then release all keys.
    pub async fn wait_ready(&mut self) {
        self.writer.ready().await;
        let report = self.state.release_all();
        if self.writer.write(&report.as_bytes()).await.is_err() {
            defmt::warn!("initial keyboard report failed");
        }
    }
}

impl KeyEventSink for UsbKeyboard<'_> {
    async fn emit(&mut self, event: KeyEvent) -> Result<(), OutputError> {
        let report = self.state.apply(event);
        self.writer
            .write(&report.as_bytes())
            .await
            .map_err(|_| OutputError::Io)
    }
}

/// Configure the HID keyboard class in the USB builder.
///
/// Returns the HID writer for use by the application.
pub fn configure_usb_keyboard<'d>(
    builder: &mut Builder<'d, Driver<'d, USB>>,
    state: &'d mut State<'d>,
) -> KeyboardWriter<'d> {
    let config = embassy_usb::class::hid::Config {
        report_descriptor: BootKeyboard::desc(),
        request_handler: None,
        poll_ms: 10,
        max_packet_size: 8,
        hid_subclass: HidSubclass::Boot,
        hid_boot_protocol: HidBootProtocol::Keyboard,
    };

    HidWriter::new(builder, state, config)
}
