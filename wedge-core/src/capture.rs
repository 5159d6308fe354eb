//! Edge-triggered request/response capture.
//!
//! The machine samples the trigger line once per poll. On an edge in the
//! configured direction it takes the [`FrameHandoff`] lock, sends the
//! request command, collects the reply into its ring buffer until the
//! terminator shows up, and publishes the substituted frame:
//!
//! ```text
//! Idle --edge--> Requesting --> Receiving --+--> Completed --+
//!  ^                                        +--> Failed -----+
//!  +--------------------------------------------------------+
//! ```
//!
//! With an empty request command each edge instead toggles a continuous
//! mode in which a capture runs on every poll until the next edge.

use core::pin::pin;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;
use wedge_proto::CAPTURE_LEN_MAX;

use crate::handoff::{FrameHandoff, HandoffError, Shared};
use crate::ring_buffer::{RingBuffer, RingBufferError};
use crate::serial::SerialPort;

/// Error type for a capture cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CaptureError {
    /// Frame lock not obtained within the bounded wait; the edge is dropped.
    Busy,
    /// No terminator within the attempt budget; the frame is untouched.
    ReceptionTimeout,
    /// Ring buffer could not be sized for the configured capture length.
    Allocation,
}

impl From<HandoffError> for CaptureError {
    fn from(err: HandoffError) -> Self {
        match err {
            HandoffError::Busy => CaptureError::Busy,
        }
    }
}

impl From<RingBufferError> for CaptureError {
    fn from(_: RingBufferError) -> Self {
        CaptureError::Allocation
    }
}

/// Result of a successful [`CaptureMachine::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CaptureOutcome {
    /// Nothing to do this cycle.
    Idle,
    /// A frame of the given length was published.
    Completed(usize),
}

/// Trigger direction that starts a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerEdge {
    /// Low to high.
    #[default]
    Rising,
    /// High to low.
    Falling,
}

impl TriggerEdge {
    /// Level the line has right after this edge.
    #[inline]
    #[must_use]
    pub const fn active_level(self) -> bool {
        matches!(self, TriggerEdge::Rising)
    }
}

/// Capture timing, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CaptureTiming {
    /// Trigger sampling period.
    pub poll_interval_ms: u32,
    /// Bounded wait for the frame lock.
    pub lock_wait_ms: u32,
    /// Receive attempts before giving up.
    pub attempts: u8,
    /// Read window of one attempt.
    pub read_timeout_ms: u32,
    /// Pause after an attempt that did not complete.
    pub retry_delay_ms: u32,
    /// Pause after a requested capture before the trigger is sampled again.
    pub settle_ms: u32,
}

impl Default for CaptureTiming {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
            lock_wait_ms: 10,
            attempts: 3,
            read_timeout_ms: 50,
            retry_delay_ms: 100,
            settle_ms: 300,
        }
    }
}

/// Drives one instrument: trigger sampling, request, reception and frame
/// publication.
pub struct CaptureMachine<S, T, D> {
    serial: S,
    trigger: T,
    delay: D,
    ring: RingBuffer<CAPTURE_LEN_MAX>,
    edge: TriggerEdge,
    last_level: bool,
    communicating: bool,
    timing: CaptureTiming,
}

impl<S, T, D> CaptureMachine<S, T, D>
where
    S: SerialPort,
    T: InputPin,
    D: DelayNs,
{
    /// Create a machine with the default timing.
    ///
    /// The line is assumed to sit at the active level at power-up, so a
    /// level that is already active never fires.
    pub fn new(serial: S, trigger: T, delay: D, edge: TriggerEdge) -> Self {
        Self::with_timing(serial, trigger, delay, edge, CaptureTiming::default())
    }

    pub fn with_timing(
        serial: S,
        trigger: T,
        delay: D,
        edge: TriggerEdge,
        timing: CaptureTiming,
    ) -> Self {
        Self {
            serial,
            trigger,
            delay,
            ring: RingBuffer::new(),
            edge,
            last_level: edge.active_level(),
            communicating: false,
            timing,
        }
    }

    /// Whether continuous (toggle) capture is currently on.
    #[inline]
    #[must_use]
    pub fn is_communicating(&self) -> bool {
        self.communicating
    }

    /// Poll forever. Returns only on a fatal [`CaptureError::Allocation`].
    pub async fn run<M: RawMutex>(&mut self, handoff: &FrameHandoff<M>) -> CaptureError {
        info!("capture started");
        loop {
            self.delay.delay_ms(self.timing.poll_interval_ms).await;
            if let Err(CaptureError::Allocation) = self.poll(handoff).await {
                error!("ring buffer allocation failed");
                return CaptureError::Allocation;
            }
        }
    }

    /// Sample the trigger once and run a capture if one is due.
    ///
    /// The edge is consumed even when the lock is busy.
    pub async fn poll<M: RawMutex>(
        &mut self,
        handoff: &FrameHandoff<M>,
    ) -> Result<CaptureOutcome, CaptureError> {
        let level = self.trigger.is_high().unwrap_or(self.last_level);
        let fired = level != self.last_level && level == self.edge.active_level();
        if level != self.last_level {
            debug!("trigger level changed: {} -> {}", self.last_level, level);
        }
        self.last_level = level;

        if !fired && !self.communicating {
            return Ok(CaptureOutcome::Idle);
        }

        let mut shared = match handoff.acquire(&mut self.delay, self.timing.lock_wait_ms).await {
            Ok(shared) => shared,
            Err(e) => {
                warn!("frame lock busy, trigger dropped");
                return Err(e.into());
            }
        };

        let requesting = !shared.config.request_command().is_empty();
        if fired {
            self.communicating = requesting || !self.communicating;
        }
        if !self.communicating {
            debug!("continuous capture stopped");
            return Ok(CaptureOutcome::Idle);
        }

        if fired {
            info!("capture triggered");
        } else {
            trace!("continuous capture");
        }
        let result = self.capture(&mut shared).await;
        drop(shared);

        if requesting {
            self.delay.delay_ms(self.timing.settle_ms).await;
            self.communicating = false;
        }
        result
    }

    async fn capture(&mut self, shared: &mut Shared) -> Result<CaptureOutcome, CaptureError> {
        let capture_len = shared.config.capture_len();
        if self.ring.capacity() == capture_len {
            self.ring.reset();
        } else {
            self.ring.init(capture_len)?;
        }
        self.serial.discard_input().await;

        let request = shared.config.request_command();
        if !request.is_empty() {
            match self.serial.write(request).await {
                Ok(n) if n == request.len() => {}
                Ok(n) => warn!("request truncated: {} of {} bytes", n, request.len()),
                Err(e) => warn!("request write failed: {:?}", e),
            }
        }

        let terminator = shared.config.terminator();
        for attempt in 0..self.timing.attempts {
            if self.receive(terminator).await? {
                let len = shared.frame.fill_from(
                    &mut self.ring,
                    terminator.len(),
                    shared.config.terminator_replacement(),
                );
                info!("frame ready: {:?}", shared.frame.as_bytes());
                return Ok(CaptureOutcome::Completed(len));
            }
            debug!("attempt {} incomplete", attempt + 1);
            self.delay.delay_ms(self.timing.retry_delay_ms).await;
        }

        warn!("no terminator after {} attempts", self.timing.attempts);
        Err(CaptureError::ReceptionTimeout)
    }

    /// One read window. Returns `true` once the response is complete.
    async fn receive(&mut self, terminator: &[u8]) -> Result<bool, CaptureError> {
        let mut chunk = [0u8; CAPTURE_LEN_MAX];
        let mut timeout = pin!(self.delay.delay_ms(self.timing.read_timeout_ms));

        loop {
            let n = match select(self.serial.read(&mut chunk), timeout.as_mut()).await {
                Either::First(Ok(0)) | Either::Second(()) => return Ok(false),
                Either::First(Ok(n)) => n,
                Either::First(Err(e)) => {
                    warn!("serial read failed: {:?}", e);
                    return Ok(false);
                }
            };

            for &byte in &chunk[..n] {
                trace!("received byte {:x}", byte);
                self.ring.push(byte)?;
                let complete = match terminator.last() {
                    None => true,
                    Some(&last) => byte == last && self.ring.ends_with(terminator),
                };
                if complete {
                    return Ok(true);
                }
            }
        }
    }
}
