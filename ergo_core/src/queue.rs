//! Single-producer single-consumer bounded queue used to hand raw impulses from
//! interrupt context to the main task without ever holding a lock across the
//! ISR boundary.
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::types::Impulse;

/// A fixed-capacity ring buffer with one producer (the ISR) and one consumer
/// (the main task). Capacity is rounded up to the next power of two.
///
/// `push` is called from `on_edge`: it must never block and never allocate.
/// `pop` is called from the main task's drain loop.
pub struct EdgeQueue {
    buf: Box<[UnsafeCell<MaybeUninit<Impulse>>]>,
    mask: usize,
    head: AtomicUsize,
    tail: AtomicUsize,
}

// Safety: `head`/`tail` are the only synchronization points. The producer only
// writes the slot at `tail` before publishing the new `tail` with `Release`;
// the consumer only reads the slot at `head` after observing `tail` with
// `Acquire`, and only ever advances `head` itself. No slot is ever written and
// read concurrently.
unsafe impl Sync for EdgeQueue {}
unsafe impl Send for EdgeQueue {}

impl EdgeQueue {
    /// `capacity` is rounded up to the next power of two (minimum 2).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2).next_power_of_two();
        let buf = (0..capacity)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            buf,
            mask: capacity - 1,
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// ISR-safe. Returns `false` (dropping the impulse) if the queue is full;
    /// the conditioner never blocks.
    pub fn push(&self, impulse: Impulse) -> bool {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        if tail.wrapping_sub(head) >= self.capacity() {
            return false;
        }
        let slot = &self.buf[tail & self.mask];
        // Safety: this index is owned exclusively by the producer until the
        // `Release` store below publishes it.
        unsafe {
            (*slot.get()).write(impulse);
        }
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        true
    }

    /// Pops the oldest queued impulse, if any.
    pub fn pop(&self) -> Option<Impulse> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        if head == tail {
            return None;
        }
        let slot = &self.buf[head & self.mask];
        // Safety: the `Acquire` load above synchronizes with the producer's
        // `Release` store, so the write is visible; this index will not be
        // touched by the producer again until `head` is published below.
        let impulse = unsafe { (*slot.get()).assume_init_read() };
        self.head.store(head.wrapping_add(1), Ordering::Release);
        Some(impulse)
    }

    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        tail.wrapping_sub(head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_preserved() {
        let q = EdgeQueue::new(4);
        for i in 0..4u64 {
            assert!(q.push(Impulse {
                timestamp_us: i,
                delta_us: 0
            }));
        }
        for i in 0..4u64 {
            assert_eq!(q.pop().unwrap().timestamp_us, i);
        }
        assert!(q.pop().is_none());
    }

    #[test]
    fn full_queue_rejects_push() {
        let q = EdgeQueue::new(2);
        assert!(q.push(Impulse {
            timestamp_us: 1,
            delta_us: 0
        }));
        assert!(q.push(Impulse {
            timestamp_us: 2,
            delta_us: 0
        }));
        assert!(!q.push(Impulse {
            timestamp_us: 3,
            delta_us: 0
        }));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn concurrent_producer_consumer_preserves_order() {
        use std::sync::Arc;
        use std::thread;

        let q = Arc::new(EdgeQueue::new(64));
        let producer = {
            let q = Arc::clone(&q);
            thread::spawn(move || {
                for i in 0..10_000u64 {
                    while !q.push(Impulse {
                        timestamp_us: i,
                        delta_us: 0,
                    }) {
                        thread::yield_now();
                    }
                }
            })
        };
        let mut seen = Vec::with_capacity(10_000);
        while seen.len() < 10_000 {
            if let Some(i) = q.pop() {
                seen.push(i.timestamp_us);
            } else {
                thread::yield_now();
            }
        }
        producer.join().unwrap();
        assert!(seen.windows(2).all(|w| w[1] == w[0] + 1));
    }
}
