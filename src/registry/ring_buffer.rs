//! Fixed-capacity ring buffer backing each pane's pre-subscription buffer.
//!
//! When the buffer is full, pushing new bytes silently evicts the oldest
//! bytes from the front. Memory usage is bounded at `capacity` bytes
//! regardless of how much output a pane produces before anyone is
//! listening.
//!
//! # Usage in the registry
//!
//! Each pane entry owns a `RingBuffer`. Output events are appended via
//! [`RingBuffer::push`] as they arrive from the control parser; when a
//! client subscribes to a pane for the first time, the registry hands it
//! [`RingBuffer::to_vec`] as a pre-subscription replay before switching it
//! over to live broadcast.

use std::collections::VecDeque;

use crate::constants::PANE_RING_BUFFER_CAPACITY;

/// Fixed-capacity byte ring buffer.
///
/// Pushing more bytes than `capacity` silently drops the oldest data.
/// The buffer never panics or reallocates beyond its configured limit.
pub struct RingBuffer {
    buf: VecDeque<u8>,
    capacity: usize,
}

impl RingBuffer {
    /// Creates a new ring buffer with the given byte capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be > 0");
        Self { buf: VecDeque::with_capacity(capacity.min(65_536)), capacity }
    }

    /// Creates a ring buffer sized to the pane registry's configured
    /// minimum capacity.
    #[must_use]
    pub fn with_default_capacity() -> Self {
        Self::new(PANE_RING_BUFFER_CAPACITY)
    }

    /// Appends `data` to the buffer, evicting the oldest bytes if needed.
    ///
    /// If `data.len() >= capacity`, only the **last** `capacity` bytes of
    /// `data` are retained (the buffer is cleared first).
    pub fn push(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }

        if data.len() >= self.capacity {
            self.buf.clear();
            let start = data.len() - self.capacity;
            self.buf.extend(&data[start..]);
            return;
        }

        let needed = self.buf.len() + data.len();
        if needed > self.capacity {
            let to_drain = needed - self.capacity;
            self.buf.drain(..to_drain);
        }

        self.buf.extend(data);
    }

    /// Returns a contiguous copy of all buffered bytes (oldest first).
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        let (a, b) = self.buf.as_slices();
        let mut v = Vec::with_capacity(a.len() + b.len());
        v.extend_from_slice(a);
        v.extend_from_slice(b);
        v
    }

    /// Current number of buffered bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True if no bytes are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Discards all buffered bytes without changing capacity.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Configured maximum capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_empty() {
        let rb = RingBuffer::new(1024);
        assert!(rb.is_empty());
        assert_eq!(rb.len(), 0);
        assert_eq!(rb.capacity(), 1024);
        assert!(rb.to_vec().is_empty());
    }

    #[test]
    #[should_panic(expected = "capacity must be > 0")]
    fn zero_capacity_panics() {
        let _ = RingBuffer::new(0);
    }

    #[test]
    fn default_capacity_meets_spec_minimum() {
        let rb = RingBuffer::with_default_capacity();
        assert_eq!(rb.capacity(), PANE_RING_BUFFER_CAPACITY);
        assert!(rb.capacity() >= 64 * 1024);
    }

    #[test]
    fn push_and_read_bytes() {
        let mut rb = RingBuffer::new(64);
        rb.push(b"hello");
        rb.push(b" world");
        assert_eq!(rb.to_vec(), b"hello world");
        assert_eq!(rb.len(), 11);
    }

    #[test]
    fn push_empty_slice_is_noop() {
        let mut rb = RingBuffer::new(64);
        rb.push(b"data");
        rb.push(b"");
        assert_eq!(rb.len(), 4);
        assert_eq!(rb.to_vec(), b"data");
    }

    #[test]
    fn push_exactly_capacity_bytes() {
        let cap = 16usize;
        let mut rb = RingBuffer::new(cap);
        let data = vec![0xAAu8; cap];
        rb.push(&data);
        assert_eq!(rb.len(), cap);
        assert_eq!(rb.to_vec(), data);
    }

    #[test]
    fn overflow_drops_oldest_bytes() {
        let mut rb = RingBuffer::new(8);
        rb.push(b"AAAAAAAA");
        rb.push(b"BB");
        let contents = rb.to_vec();
        assert_eq!(rb.len(), 8);
        assert_eq!(&contents[..6], b"AAAAAA");
        assert_eq!(&contents[6..], b"BB");
    }

    #[test]
    fn overflow_oldest_bytes_not_present() {
        let mut rb = RingBuffer::new(10);
        rb.push(b"12345");
        rb.push(b"67890");
        rb.push(b"ABCDE");
        let contents = rb.to_vec();
        assert_eq!(rb.len(), 10);
        assert!(!contents.starts_with(b"12345"));
        assert_eq!(&contents[..5], b"67890");
        assert_eq!(&contents[5..], b"ABCDE");
    }

    #[test]
    fn single_push_larger_than_capacity_keeps_tail() {
        let mut rb = RingBuffer::new(8);
        rb.push(b"XXXXYYYYZZZZ");
        assert_eq!(rb.len(), 8);
        assert_eq!(rb.to_vec(), b"YYYYZZZZ");
    }

    #[test]
    fn single_push_exactly_2x_capacity_keeps_last_capacity_bytes() {
        let mut rb = RingBuffer::new(4);
        rb.push(b"AAAABBBB");
        assert_eq!(rb.len(), 4);
        assert_eq!(rb.to_vec(), b"BBBB");
    }

    #[test]
    fn incremental_overflow_preserves_order() {
        let mut rb = RingBuffer::new(5);
        for i in 0u8..10 {
            rb.push(&[i]);
        }
        assert_eq!(rb.len(), 5);
        assert_eq!(rb.to_vec(), vec![5, 6, 7, 8, 9]);
    }

    #[test]
    fn clear_empties_buffer() {
        let mut rb = RingBuffer::new(64);
        rb.push(b"some data here");
        assert!(!rb.is_empty());
        rb.clear();
        assert!(rb.is_empty());
        assert_eq!(rb.len(), 0);
        assert!(rb.to_vec().is_empty());
    }

    #[test]
    fn push_after_clear_works() {
        let mut rb = RingBuffer::new(16);
        rb.push(b"old data");
        rb.clear();
        rb.push(b"new");
        assert_eq!(rb.to_vec(), b"new");
    }

    #[test]
    fn to_vec_does_not_consume_buffer() {
        let mut rb = RingBuffer::new(64);
        rb.push(b"hello");
        let v1 = rb.to_vec();
        let v2 = rb.to_vec();
        assert_eq!(v1, v2);
        assert_eq!(rb.len(), 5);
    }

    #[test]
    fn binary_data_round_trips() {
        let mut rb = RingBuffer::new(256);
        let data: Vec<u8> = (0u8..=255).collect();
        rb.push(&data);
        assert_eq!(rb.to_vec(), data);
    }
}
