//! Fixed-capacity word queue backing each NoC endpoint.

use thiserror::Error;

/// Returned by [`RingBuffer::push`] when every usable slot is occupied. The word is not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("ring buffer full")]
pub struct QueueFull;

/// Circular FIFO of 32-bit words over a power-of-two array.
///
/// `head == tail` means empty and `(tail + 1) % N == head` means full, so one slot is always left
/// unused and at most `N - 1` words are queued. There is no internal locking; callers serialise
/// access.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    head: usize,
    tail: usize,
    data: Box<[u32]>,
}

impl RingBuffer {
    /// Creates an empty queue with `capacity` slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is not a power of two or is smaller than 2.
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity >= 2 && capacity.is_power_of_two(),
            "ring buffer capacity must be a power of two >= 2 (got {capacity})"
        );
        Self {
            head: 0,
            tail: 0,
            data: vec![0u32; capacity].into_boxed_slice(),
        }
    }

    /// Number of slots, including the reserved one.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Maximum number of words the queue can hold at once.
    pub fn usable_capacity(&self) -> usize {
        self.data.len() - 1
    }

    pub fn len(&self) -> usize {
        self.tail.wrapping_sub(self.head) & self.mask()
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    pub fn is_full(&self) -> bool {
        self.next(self.tail) == self.head
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn tail(&self) -> usize {
        self.tail
    }

    pub fn push(&mut self, word: u32) -> Result<(), QueueFull> {
        if self.is_full() {
            return Err(QueueFull);
        }
        self.data[self.tail] = word;
        self.tail = self.next(self.tail);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<u32> {
        if self.is_empty() {
            return None;
        }
        let word = self.data[self.head];
        self.head = self.next(self.head);
        Some(word)
    }

    /// Returns the oldest word without consuming it.
    pub fn peek(&self) -> Option<u32> {
        (!self.is_empty()).then(|| self.data[self.head])
    }

    /// Discards every queued word.
    pub fn reset(&mut self) {
        self.head = 0;
        self.tail = 0;
    }

    #[inline]
    fn mask(&self) -> usize {
        self.data.len() - 1
    }

    #[inline]
    fn next(&self, idx: usize) -> usize {
        (idx + 1) & self.mask()
    }
}
