//! Receive ring buffer
//!
//! Single-producer (UART interrupt) / single-consumer (bridge worker) byte
//! queue built on `heapless::spsc`. Neither side takes a lock.
//!
//! # Overflow policy
//!
//! Drop-newest: when the ring is full the incoming byte is discarded and
//! counted. Bytes already queued are never reordered or overwritten, so the
//! consumer always sees a gap-free prefix of what arrived, followed by
//! whatever fits once it catches up.

use heapless::spsc::{Consumer, Producer, Queue};
use portable_atomic::{AtomicU32, Ordering};

/// Default ring size in slots (holds `RX_RING_SIZE - 1` bytes)
pub const RX_RING_SIZE: usize = 512;

/// Fixed-capacity receive ring
///
/// `N` is the number of slots; one slot is kept free to tell full from
/// empty, so the ring holds `N - 1` bytes.
pub struct ByteRing<const N: usize> {
    queue: Queue<u8, N>,
    dropped: AtomicU32,
}

impl<const N: usize> Default for ByteRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ByteRing<N> {
    /// Create an empty ring
    pub const fn new() -> Self {
        Self {
            queue: Queue::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Number of bytes the ring can hold
    pub const fn capacity() -> usize {
        N - 1
    }

    /// Split into the interrupt-side writer and the task-side reader
    pub fn split(&mut self) -> (RingWriter<'_, N>, RingReader<'_, N>) {
        let (producer, consumer) = self.queue.split();
        (
            RingWriter {
                producer,
                dropped: &self.dropped,
            },
            RingReader {
                consumer,
                dropped: &self.dropped,
            },
        )
    }
}

/// Producer half, owned by the interrupt relay
pub struct RingWriter<'a, const N: usize> {
    producer: Producer<'a, u8, N>,
    dropped: &'a AtomicU32,
}

impl<'a, const N: usize> RingWriter<'a, N> {
    /// Push one byte
    ///
    /// Returns `false` if the ring was full and the byte was dropped.
    pub fn push(&mut self, byte: u8) -> bool {
        match self.producer.enqueue(byte) {
            Ok(()) => true,
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Push a burst, dropping whatever does not fit
    ///
    /// Returns the number of bytes accepted.
    pub fn push_slice(&mut self, bytes: &[u8]) -> usize {
        let mut accepted = 0;
        for &byte in bytes {
            if self.push(byte) {
                accepted += 1;
            }
        }
        accepted
    }
}

/// Consumer half, owned by the bridge worker
pub struct RingReader<'a, const N: usize> {
    consumer: Consumer<'a, u8, N>,
    dropped: &'a AtomicU32,
}

impl<'a, const N: usize> RingReader<'a, N> {
    /// Pop the oldest byte
    pub fn pop(&mut self) -> Option<u8> {
        self.consumer.dequeue()
    }

    /// Pop up to `buf.len()` bytes in arrival order
    pub fn pop_into(&mut self, buf: &mut [u8]) -> usize {
        let mut n = 0;
        for slot in buf.iter_mut() {
            match self.consumer.dequeue() {
                Some(byte) => {
                    *slot = byte;
                    n += 1;
                }
                None => break,
            }
        }
        n
    }

    /// Check if no bytes are waiting
    pub fn is_empty(&self) -> bool {
        self.consumer.peek().is_none()
    }

    /// Discard everything queued; returns how many bytes were discarded
    pub fn clear(&mut self) -> usize {
        let mut n = 0;
        while self.consumer.dequeue().is_some() {
            n += 1;
        }
        n
    }

    /// Bytes dropped on overflow since the last call
    pub fn take_dropped(&mut self) -> u32 {
        self.dropped.swap(0, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut ring: ByteRing<8> = ByteRing::new();
        let (mut tx, mut rx) = ring.split();

        assert_eq!(tx.push_slice(b"abc"), 3);
        assert_eq!(rx.pop(), Some(b'a'));
        assert_eq!(rx.pop(), Some(b'b'));
        assert_eq!(rx.pop(), Some(b'c'));
        assert_eq!(rx.pop(), None);
        assert!(rx.is_empty());
    }

    #[test]
    fn test_drop_newest_on_overflow() {
        let mut ring: ByteRing<4> = ByteRing::new();
        assert_eq!(ByteRing::<4>::capacity(), 3);
        let (mut tx, mut rx) = ring.split();

        assert_eq!(tx.push_slice(&[1, 2, 3, 4, 5]), 3);
        assert!(!tx.push(6));
        assert_eq!(rx.take_dropped(), 3);
        assert_eq!(rx.take_dropped(), 0);

        let mut buf = [0u8; 8];
        assert_eq!(rx.pop_into(&mut buf), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
    }

    #[test]
    fn test_wraparound_keeps_order() {
        let mut ring: ByteRing<4> = ByteRing::new();
        let (mut tx, mut rx) = ring.split();

        for round in 0u8..10 {
            assert!(tx.push(round));
            assert!(tx.push(round.wrapping_add(100)));
            assert_eq!(rx.pop(), Some(round));
            assert_eq!(rx.pop(), Some(round.wrapping_add(100)));
        }
    }

    #[test]
    fn test_clear() {
        let mut ring: ByteRing<8> = ByteRing::new();
        let (mut tx, mut rx) = ring.split();

        tx.push_slice(b"stale");
        assert_eq!(rx.clear(), 5);
        assert!(rx.is_empty());
        assert!(tx.push(b'x'));
        assert_eq!(rx.pop(), Some(b'x'));
    }
}
