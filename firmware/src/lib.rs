//! RS-232C instrument to USB keyboard wedge for RP2040.
//!
//! A trigger edge makes the firmware query a legacy serial instrument; the
//! reply is typed into the host as keystrokes.
//!
//! # Overview
//!
//! The firmware runs on a Raspberry Pi Pico (RP2040) and:
//! 1. Loads the protocol config from the last flash sector
//! 2. Watches the trigger input and sends the request command over UART
//! 3. Collects the reply until its terminator and substitutes it
//! 4. Types the result on a USB HID boot keyboard
//!
//! # Hardware Configuration
//!
//! | Function | GPIO | Description |
//! |----------|------|-------------|
//! | UART1 TX | 8    | Serial transmit (request command) |
//! | UART1 RX | 9    | Serial receive (instrument reply) |
//! | Trigger  | 15   | Push-button or external trigger, pulled up |
//!
//! # Architecture
//!
//! The firmware uses the Embassy async runtime with three concurrent tasks:
//!
//! - **USB Task**: Manages the USB device stack
//! - **Capture Task**: Samples the trigger and runs the [`CaptureMachine`]
//! - **Dispatch Task**: Types ready frames through the [`Dispatcher`]
//!
//! Capture and dispatch share a single [`FrameHandoff`] placed in a
//! `StaticCell`.
//!
//! # Modules
//!
//! - [`uart_serial`]: UART link to the instrument ([`UartSerial`])
//! - [`usb_keyboard`]: USB HID keyboard output ([`UsbKeyboard`])
//! - [`flash_store`]: Config persistence in flash ([`FlashConfigStore`])
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)
//! - **`tc101a-defaults`** (default): Nikon TC-101A preset when flash holds no config
//! - **`trigger-falling-edge`**: Capture on a high-to-low edge
//!
//! # Re-exports
//!
//! This crate re-exports the [`wedge_core`] types the binary needs.

#![no_std]

#[cfg(all(feature = "dev-panic", feature = "prod-panic"))]
compile_error!("Cannot enable both `dev-panic` and `prod-panic` features");

pub use wedge_core::{
    load_config, CaptureMachine, Dispatcher, FrameHandoff, TriggerEdge, UsLayout,
};
pub use wedge_proto::ProtocolConfig;

pub mod flash_store;
pub mod uart_serial;
pub mod usb_keyboard;

pub use flash_store::FlashConfigStore;
pub use uart_serial::{instrument_uart_config, UartSerial};
pub use usb_keyboard::{configure_usb_keyboard, KeyboardWriter, UsbKeyboard};

/// Config used when flash holds no valid record.
#[must_use]
pub fn default_config() -> ProtocolConfig {
    if cfg!(feature = "tc101a-defaults") {
        ProtocolConfig::tc101a()
    } else {
        ProtocolConfig::fallback()
    }
}

/// Trigger direction selected at build time.
pub const TRIGGER_EDGE: TriggerEdge = if cfg!(feature = "trigger-falling-edge") {
    TriggerEdge::Falling
} else {
    TriggerEdge::Rising
};
