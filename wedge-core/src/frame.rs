//! The shared frame buffer exchanged between capture and dispatch.

use crate::ring_buffer::RingBuffer;
use wedge_proto::MAX_FRAME_LEN;

/// One terminator-substituted response, NUL-terminated.
///
/// A frame is *ready* when its first byte is non-zero and *empty*
/// otherwise. Dispatch clears it after typing it out.
#[derive(Clone)]
pub struct Frame {
    buf: [u8; MAX_FRAME_LEN],
}

impl Frame {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: [0; MAX_FRAME_LEN],
        }
    }

    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.buf[0] != 0
    }

    /// Frame content up to (not including) the first NUL.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        let end = self
            .buf
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(MAX_FRAME_LEN);
        &self.buf[..end]
    }

    /// Mark the frame empty.
    #[inline]
    pub fn clear(&mut self) {
        self.buf[0] = 0;
    }

    /// Move the ring buffer content into the frame and substitute the
    /// terminator.
    ///
    /// With `n` bytes drained and `k = terminator_len`, the frame becomes
    /// `content[..max(0, n - k)] + replacement` followed by NUL. Returns the
    /// resulting length.
    pub fn fill_from<const N: usize>(
        &mut self,
        ring: &mut RingBuffer<N>,
        terminator_len: usize,
        replacement: &[u8],
    ) -> usize {
        // Leave room for the replacement and the NUL.
        let limit = MAX_FRAME_LEN - 1;
        let n = ring.drain_into(&mut self.buf[..limit]);
        self.buf[n] = 0;
        debug!("frame received {:?}", &self.buf[..n]);

        let base = n.saturating_sub(terminator_len);
        let tail = replacement.len().min(limit - base);
        self.buf[base..base + tail].copy_from_slice(&replacement[..tail]);
        let len = base + tail;
        self.buf[len] = 0;
        len
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Frame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Frame")
            .field("content", &self.as_bytes())
            .finish()
    }
}
