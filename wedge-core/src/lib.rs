//! Platform-agnostic capture, frame handoff and key dispatch for the serial
//! keyboard wedge.
//!
//! This crate holds the behaviour of the wedge without any peripheral
//! dependencies. It runs in embedded `no_std` environments and on the host
//! for testing.
//!
//! # Overview
//!
//! - [`ring_buffer`]: Fixed-capacity byte ring ([`RingBuffer`])
//! - [`capture`]: Trigger-driven request/response capture ([`CaptureMachine`])
//! - [`handoff`]: Lock shared by capture and dispatch ([`FrameHandoff`])
//! - [`dispatch`]: Frame to key event typing ([`Dispatcher`])
//! - [`serial`], [`keyboard`], [`keymap`], [`store`]: Collaborator traits
//!   ([`SerialPort`], [`KeyEventSink`], [`KeyMap`], [`ConfigStore`])
//!
//! # Data Flow
//!
//! ```text
//! trigger --> CaptureMachine --> FrameHandoff --> Dispatcher --> KeyEventSink
//!                 ^    |          (frame + config)
//!          SerialPort <+
//! ```
//!
//! Capture and dispatch run as two independent tasks. The only thing they
//! share is the [`FrameHandoff`], and every acquisition of it is bounded.
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Log through `defmt` (for embedded targets)
//! - **`log`**: Log through the `log` crate

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// Must come first so the logging macros are visible in every module.
mod fmt;

pub mod capture;
pub mod dispatch;
pub mod frame;
pub mod handoff;
pub mod keyboard;
pub mod keymap;
pub mod ring_buffer;
pub mod serial;
pub mod store;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use capture::{CaptureError, CaptureMachine, CaptureOutcome, CaptureTiming, TriggerEdge};
pub use dispatch::{DispatchTiming, Dispatcher};
pub use frame::Frame;
pub use handoff::{FrameHandoff, HandoffError, ReconfigureError, Shared, SharedGuard};
pub use keyboard::{KeyEvent, KeyEventSink, KeyboardReport, KeyboardState, OutputError};
pub use keymap::{KeyMap, UsLayout};
pub use ring_buffer::{RingBuffer, RingBufferError};
pub use serial::{SerialError, SerialPort};
pub use store::{load_config, save_config, try_load_config, ConfigStore, StoreError};
