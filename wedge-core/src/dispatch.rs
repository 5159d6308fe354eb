//! Dispatcher: types out ready frames as key events.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;
use wedge_proto::LEFT_SHIFT;

use crate::handoff::{FrameHandoff, HandoffError};
use crate::keyboard::{KeyEvent, KeyEventSink};
use crate::keymap::KeyMap;

/// Dispatch timing, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DispatchTiming {
    /// Frame polling period.
    pub poll_interval_ms: u32,
    /// Bounded wait for the frame lock.
    pub lock_wait_ms: u32,
    /// Wait after pressing Shift and before releasing it.
    pub modifier_ms: u32,
    /// How long a key stays pressed.
    pub key_hold_ms: u32,
    /// Gap after each typed character.
    pub inter_key_ms: u32,
}

impl Default for DispatchTiming {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
            lock_wait_ms: 10,
            modifier_ms: 50,
            key_hold_ms: 50,
            inter_key_ms: 50,
        }
    }
}

/// Consumes frames from a [`FrameHandoff`] and emits key events.
///
/// Output errors are logged and typing continues with the next event, so
/// a frame is always consumed once it has been started.
pub struct Dispatcher<K, Map, D> {
    sink: K,
    keymap: Map,
    delay: D,
    timing: DispatchTiming,
}

impl<K, Map, D> Dispatcher<K, Map, D>
where
    K: KeyEventSink,
    Map: KeyMap,
    D: DelayNs,
{
    pub fn new(sink: K, keymap: Map, delay: D) -> Self {
        Self::with_timing(sink, keymap, delay, DispatchTiming::default())
    }

    pub fn with_timing(sink: K, keymap: Map, delay: D, timing: DispatchTiming) -> Self {
        Self {
            sink,
            keymap,
            delay,
            timing,
        }
    }

    /// Run the dispatcher indefinitely.
    pub async fn run<M: RawMutex>(&mut self, handoff: &FrameHandoff<M>) -> ! {
        info!("dispatch started");
        loop {
            self.delay.delay_ms(self.timing.poll_interval_ms).await;
            let _ = self.poll(handoff).await;
        }
    }

    /// Type out the frame if one is ready, then mark it empty.
    ///
    /// Returns the number of characters typed. The lock is held for the
    /// whole frame, so capture never overwrites a frame mid-dispatch.
    pub async fn poll<M: RawMutex>(&mut self, handoff: &FrameHandoff<M>) -> Result<usize, HandoffError> {
        let mut shared = match handoff.acquire(&mut self.delay, self.timing.lock_wait_ms).await {
            Ok(shared) => shared,
            Err(e) => {
                debug!("frame lock busy, dispatch skipped");
                return Err(e);
            }
        };
        if !shared.frame.is_ready() {
            return Ok(0);
        }

        debug!("dispatching {:?}", shared.frame.as_bytes());
        let mut typed = 0;
        for &byte in shared.frame.as_bytes() {
            let stroke = self.keymap.map(byte);
            if !stroke.is_mapped() {
                trace!("no key for {:x}", byte);
                continue;
            }

            if stroke.shift {
                self.emit(KeyEvent::press(LEFT_SHIFT)).await;
                self.delay.delay_ms(self.timing.modifier_ms).await;
            }
            self.emit(KeyEvent::press(stroke.code)).await;
            self.delay.delay_ms(self.timing.key_hold_ms).await;
            self.emit(KeyEvent::release(stroke.code)).await;
            if stroke.shift {
                self.delay.delay_ms(self.timing.modifier_ms).await;
                self.emit(KeyEvent::release(LEFT_SHIFT)).await;
            }
            self.delay.delay_ms(self.timing.inter_key_ms).await;
            typed += 1;
        }

        shared.frame.clear();
        Ok(typed)
    }

    async fn emit(&mut self, event: KeyEvent) {
        if let Err(e) = self.sink.emit(event).await {
            warn!("key event {:?} failed: {:?}", event, e);
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::keymap::UsLayout;
    use crate::ring_buffer::RingBuffer;
    use crate::testing::{block_on, MockDelay, MockSink, SinkClock, SinkEntry};
    use core::cell::RefCell;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use std::rc::Rc;
    use std::vec;
    use std::vec::Vec;
    use wedge_proto::{KeyStroke, ProtocolConfig};

    use SinkEntry::{Key, Wait};

    fn handoff_with(frame: &[u8]) -> FrameHandoff<NoopRawMutex> {
        let handoff = FrameHandoff::new(ProtocolConfig::fallback());
        {
            let mut shared = handoff.try_acquire().unwrap();
            let mut rb = RingBuffer::<64>::with_capacity(64).unwrap();
            for &b in frame {
                rb.push(b).unwrap();
            }
            shared.frame.fill_from(&mut rb, 0, b"");
        }
        handoff
    }

    fn keys(log: &[SinkEntry]) -> Vec<KeyEvent> {
        log.iter()
            .filter_map(|e| match e {
                Key(k) => Some(*k),
                Wait(_) => None,
            })
            .collect()
    }

    fn recording() -> (
        Dispatcher<MockSink, UsLayout, SinkClock>,
        Rc<RefCell<Vec<SinkEntry>>>,
    ) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let dispatcher = Dispatcher::new(
            MockSink::new(log.clone()),
            UsLayout,
            SinkClock { log: log.clone() },
        );
        (dispatcher, log)
    }

    #[test]
    fn test_shift_bracketing_order() {
        let handoff = handoff_with(b"A1");
        let (mut d, log) = recording();

        assert_eq!(block_on(d.poll(&handoff)), Ok(2));

        assert_eq!(
            *log.borrow(),
            vec![
                Key(KeyEvent::press(LEFT_SHIFT)),
                Wait(50),
                Key(KeyEvent::press(4)),
                Wait(50),
                Key(KeyEvent::release(4)),
                Wait(50),
                Key(KeyEvent::release(LEFT_SHIFT)),
                Wait(50),
                Key(KeyEvent::press(30)),
                Wait(50),
                Key(KeyEvent::release(30)),
                Wait(50),
            ]
        );
        assert!(!handoff.try_acquire().unwrap().frame.is_ready());
    }

    #[test]
    fn test_unmapped_bytes_skipped() {
        let handoff = handoff_with(b"\x01a\x7f");
        let (mut d, log) = recording();

        assert_eq!(block_on(d.poll(&handoff)), Ok(1));
        assert_eq!(
            keys(&log.borrow()),
            [KeyEvent::press(4), KeyEvent::release(4)]
        );
    }

    #[test]
    fn test_empty_frame_emits_nothing() {
        let handoff = FrameHandoff::<NoopRawMutex>::new(ProtocolConfig::fallback());
        let (mut d, log) = recording();

        assert_eq!(block_on(d.poll(&handoff)), Ok(0));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_busy_lock_skips_cycle() {
        let handoff = handoff_with(b"x");
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut d = Dispatcher::new(MockSink::new(log.clone()), UsLayout, MockDelay::default());

        {
            let _capture = handoff.try_acquire().unwrap();
            assert_eq!(block_on(d.poll(&handoff)), Err(HandoffError::Busy));
        }
        assert!(log.borrow().is_empty());
        assert!(handoff.try_acquire().unwrap().frame.is_ready());

        // Next cycle goes through
        assert_eq!(block_on(d.poll(&handoff)), Ok(1));
    }

    #[test]
    fn test_output_error_does_not_abort_frame() {
        let handoff = handoff_with(b"ab");
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = MockSink::new(log.clone()).failing_on(4);
        let mut d = Dispatcher::new(sink, UsLayout, MockDelay::default());

        assert_eq!(block_on(d.poll(&handoff)), Ok(2));
        assert_eq!(
            keys(&log.borrow()),
            [
                KeyEvent::press(4),
                KeyEvent::release(4),
                KeyEvent::press(5),
                KeyEvent::release(5),
            ]
        );
        assert!(!handoff.try_acquire().unwrap().frame.is_ready());
    }

    #[test]
    fn test_frame_typed_once() {
        let handoff = handoff_with(b"9");
        let (mut d, log) = recording();

        block_on(d.poll(&handoff)).unwrap();
        block_on(d.poll(&handoff)).unwrap();
        assert_eq!(keys(&log.borrow()).len(), 2);
    }

    #[test]
    fn test_custom_keymap_and_timing() {
        let handoff = handoff_with(b"xy");
        let log = Rc::new(RefCell::new(Vec::new()));
        let timing = DispatchTiming {
            key_hold_ms: 5,
            inter_key_ms: 1,
            ..DispatchTiming::default()
        };
        let map = |b: u8| if b == b'y' { KeyStroke::shifted(0x1C) } else { KeyStroke::NONE };
        let mut d = Dispatcher::with_timing(
            MockSink::new(log.clone()),
            map,
            SinkClock { log: log.clone() },
            timing,
        );

        assert_eq!(block_on(d.poll(&handoff)), Ok(1));
        assert_eq!(
            *log.borrow(),
            vec![
                Key(KeyEvent::press(LEFT_SHIFT)),
                Wait(50),
                Key(KeyEvent::press(0x1C)),
                Wait(5),
                Key(KeyEvent::release(0x1C)),
                Wait(50),
                Key(KeyEvent::release(LEFT_SHIFT)),
                Wait(1),
            ]
        );
    }
}
