//! Host-side mocks and a minimal executor for the async tests.

extern crate std;

use core::cell::RefCell;
use core::convert::Infallible;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embedded_hal::digital::{ErrorType, InputPin};
use embedded_hal_async::delay::DelayNs;

use crate::handoff::FrameHandoff;
use crate::keyboard::{KeyEvent, KeyEventSink, OutputError};
use crate::serial::{SerialError, SerialPort};

// Helper to run a future to completion (simple blocking executor)
pub fn block_on<F: Future>(mut f: F) -> F::Output {
    fn noop_raw_waker() -> RawWaker {
        fn noop(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            noop_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);
        RawWaker::new(core::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(noop_raw_waker()) };
    let mut cx = Context::from_waker(&waker);

    // SAFETY: We don't move f after pinning
    let mut f = unsafe { Pin::new_unchecked(&mut f) };

    match f.as_mut().poll(&mut cx) {
        Poll::Ready(result) => result,
        Poll::Pending => panic!("Mock future returned Pending unexpectedly"),
    }
}

/// What the next `read` call on [`MockSerial`] does.
#[derive(Debug, Clone)]
pub enum ReadStep {
    Bytes(Vec<u8>),
    /// No data: the read never completes and the attempt times out.
    Silence,
    Error(SerialError),
}

#[derive(Debug, Default)]
pub struct SerialLog {
    pub written: Vec<Vec<u8>>,
    pub discards: usize,
    pub reads: usize,
    /// Set if a read ran while the frame lock was free.
    pub read_without_lock: bool,
}

pub struct MockSerial {
    steps: VecDeque<ReadStep>,
    pub log: Rc<RefCell<SerialLog>>,
    probe: Option<Rc<FrameHandoff<NoopRawMutex>>>,
    write_limit: Option<usize>,
}

impl MockSerial {
    pub fn new(steps: Vec<ReadStep>) -> Self {
        Self {
            steps: steps.into(),
            log: Rc::new(RefCell::new(SerialLog::default())),
            probe: None,
            write_limit: None,
        }
    }

    /// Accept at most `limit` bytes per write.
    pub fn short_writes(mut self, limit: usize) -> Self {
        self.write_limit = Some(limit);
        self
    }

    /// Check on every read that `handoff` is locked.
    pub fn probing(mut self, handoff: Rc<FrameHandoff<NoopRawMutex>>) -> Self {
        self.probe = Some(handoff);
        self
    }
}

impl SerialPort for MockSerial {
    async fn write(&mut self, bytes: &[u8]) -> Result<usize, SerialError> {
        let n = self.write_limit.map_or(bytes.len(), |limit| bytes.len().min(limit));
        self.log.borrow_mut().written.push(bytes[..n].to_vec());
        Ok(n)
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, SerialError> {
        {
            let mut log = self.log.borrow_mut();
            log.reads += 1;
            if let Some(handoff) = &self.probe {
                log.read_without_lock |= handoff.try_acquire().is_ok();
            }
        }
        match self.steps.pop_front() {
            Some(ReadStep::Bytes(mut bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    bytes.drain(..n);
                    self.steps.push_front(ReadStep::Bytes(bytes));
                }
                Ok(n)
            }
            Some(ReadStep::Error(e)) => Err(e),
            Some(ReadStep::Silence) | None => core::future::pending().await,
        }
    }

    async fn discard_input(&mut self) {
        self.log.borrow_mut().discards += 1;
    }
}

/// Trigger line replaying a fixed level sequence, then holding the last one.
pub struct MockTrigger {
    levels: VecDeque<bool>,
    last: bool,
}

impl MockTrigger {
    pub fn new(levels: &[bool]) -> Self {
        Self {
            levels: levels.iter().copied().collect(),
            last: levels.last().copied().unwrap_or(false),
        }
    }
}

impl ErrorType for MockTrigger {
    type Error = Infallible;
}

impl InputPin for MockTrigger {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.levels.pop_front().unwrap_or(self.last))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Delay that completes immediately and records every requested wait.
#[derive(Clone, Default)]
pub struct MockDelay {
    pub waits_ms: Rc<RefCell<Vec<u32>>>,
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.waits_ms.borrow_mut().push(ns / 1_000_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.waits_ms.borrow_mut().push(ms);
    }
}

/// One observation made by [`MockSink`]: an emitted key event or a wait
/// between events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkEntry {
    Key(KeyEvent),
    Wait(u32),
}

/// Key sink that records events, optionally failing for one usage code.
pub struct MockSink {
    pub log: Rc<RefCell<Vec<SinkEntry>>>,
    fail_code: Option<u8>,
}

impl MockSink {
    pub fn new(log: Rc<RefCell<Vec<SinkEntry>>>) -> Self {
        Self {
            log,
            fail_code: None,
        }
    }

    pub fn failing_on(mut self, code: u8) -> Self {
        self.fail_code = Some(code);
        self
    }
}

impl KeyEventSink for MockSink {
    async fn emit(&mut self, event: KeyEvent) -> Result<(), OutputError> {
        self.log.borrow_mut().push(SinkEntry::Key(event));
        if self.fail_code == Some(event.code) {
            Err(OutputError::Io)
        } else {
            Ok(())
        }
    }
}

/// Delay that writes its waits into a [`MockSink`] log, so event order
/// and timing can be checked together.
pub struct SinkClock {
    pub log: Rc<RefCell<Vec<SinkEntry>>>,
}

impl DelayNs for SinkClock {
    async fn delay_ns(&mut self, ns: u32) {
        self.log.borrow_mut().push(SinkEntry::Wait(ns / 1_000_000));
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.log.borrow_mut().push(SinkEntry::Wait(ms));
    }
}
