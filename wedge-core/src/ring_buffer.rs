//! Fixed-capacity byte ring that keeps the most recent bytes.

/// Error type for ring buffer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RingBufferError {
    /// Buffer was never initialised (capacity zero).
    Unallocated,
    /// Requested capacity cannot be provided by the backing storage.
    Allocation,
    /// No bytes stored.
    Empty,
}

/// Circular byte buffer with overwrite-oldest-on-full semantics.
///
/// Backing storage is `N` bytes; [`init`](Self::init) selects the active
/// capacity within it. Pushing into a full buffer silently drops the
/// oldest byte, so the buffer always holds the last `capacity` bytes.
///
/// # Example
///
/// ```
/// use wedge_core::RingBuffer;
///
/// let mut rb = RingBuffer::<8>::with_capacity(3).unwrap();
/// for b in b"abcd" {
///     rb.push(*b).unwrap();
/// }
/// assert_eq!(rb.content_length(), 3);
/// assert_eq!(rb.at(0), Ok(b'b'));
/// assert_eq!(rb.at(-1), Ok(b'd'));
/// assert_eq!(rb.pop(), Ok(b'b'));
/// ```
#[derive(Debug, Clone)]
pub struct RingBuffer<const N: usize> {
    buffer: [u8; N],
    capacity: usize,
    head: usize,
    tail: usize,
    full: bool,
}

impl<const N: usize> RingBuffer<N> {
    /// Create an unallocated buffer; every operation fails until
    /// [`init`](Self::init) succeeds.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0; N],
            capacity: 0,
            head: 0,
            tail: 0,
            full: false,
        }
    }

    /// Create a buffer with the given active capacity.
    pub fn with_capacity(capacity: usize) -> Result<Self, RingBufferError> {
        let mut rb = Self::new();
        rb.init(capacity)?;
        Ok(rb)
    }

    /// (Re)size the buffer and empty it.
    ///
    /// Fails with [`RingBufferError::Allocation`] when `capacity` is zero or
    /// larger than the backing storage; the buffer is then left unallocated.
    pub fn init(&mut self, capacity: usize) -> Result<(), RingBufferError> {
        self.capacity = 0;
        self.reset();
        if capacity == 0 || capacity > N {
            return Err(RingBufferError::Allocation);
        }
        self.capacity = capacity;
        Ok(())
    }

    /// Active capacity, zero when unallocated.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of bytes currently stored.
    #[must_use]
    pub fn content_length(&self) -> usize {
        if self.full {
            self.capacity
        } else if self.head >= self.tail {
            self.head - self.tail
        } else {
            self.capacity + self.head - self.tail
        }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content_length() == 0
    }

    /// Empty the buffer without changing its capacity.
    pub fn reset(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.full = false;
    }

    /// Append a byte, dropping the oldest one when full.
    pub fn push(&mut self, byte: u8) -> Result<(), RingBufferError> {
        self.check_allocated()?;

        self.buffer[self.head] = byte;
        self.head = (self.head + 1) % self.capacity;
        if self.full {
            self.tail = self.head;
        }
        self.full = self.head == self.tail;
        Ok(())
    }

    /// Remove and return the oldest byte.
    pub fn pop(&mut self) -> Result<u8, RingBufferError> {
        self.check_allocated()?;
        if !self.full && self.head == self.tail {
            return Err(RingBufferError::Empty);
        }

        let byte = self.buffer[self.tail];
        self.tail = (self.tail + 1) % self.capacity;
        self.full = false;
        Ok(byte)
    }

    /// Read a byte without removing it.
    ///
    /// `offset >= 0` counts from the oldest byte and is clamped to the
    /// newest; `offset < 0` counts back from the newest (`-1`) and is
    /// clamped to the oldest.
    pub fn at(&self, offset: isize) -> Result<u8, RingBufferError> {
        self.check_allocated()?;
        let len = self.content_length();
        if len == 0 {
            return Err(RingBufferError::Empty);
        }

        let index = if offset >= 0 {
            let offset = (offset as usize).min(len - 1);
            (self.tail + offset) % self.capacity
        } else {
            let back = offset.unsigned_abs().min(len);
            (self.head + self.capacity - back) % self.capacity
        };
        Ok(self.buffer[index])
    }

    /// Whether the newest `suffix.len()` bytes equal `suffix`.
    ///
    /// An empty suffix always matches; a suffix longer than the content
    /// never does.
    #[must_use]
    pub fn ends_with(&self, suffix: &[u8]) -> bool {
        let k = suffix.len();
        if k > self.content_length() {
            return false;
        }
        suffix
            .iter()
            .enumerate()
            .all(|(j, &expected)| self.at(j as isize - k as isize) == Ok(expected))
    }

    /// Pop every stored byte into `out` in FIFO order.
    ///
    /// Stops early if `out` is full. Returns the number of bytes moved.
    pub fn drain_into(&mut self, out: &mut [u8]) -> usize {
        let mut n = 0;
        while n < out.len() {
            match self.pop() {
                Ok(byte) => {
                    out[n] = byte;
                    n += 1;
                }
                Err(_) => break,
            }
        }
        n
    }

    #[inline]
    fn check_allocated(&self) -> Result<(), RingBufferError> {
        if self.capacity == 0 {
            Err(RingBufferError::Unallocated)
        } else {
            Ok(())
        }
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
