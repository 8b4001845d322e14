//! Bounded single-producer single-consumer ring of channel groups.
//!
//! Backs the logging queue: the audio tick pushes one group of channel blocks
//! per cycle, the storage loop pops them at its own pace. Head and tail are
//! atomics so the two sides may run in different priority contexts.
//!
//! # Safety Contract
//!
//! - Only ONE context may call [`push()`](GroupRing::push) (the producer).
//! - Only ONE context may call [`pop()`](GroupRing::pop) (the consumer).
//!
//! One slot is always left empty so that `head == tail` means empty and
//! `head + 1 == tail` means full; a ring of `N` slots holds at most `N - 1`
//! groups. A push into a full ring hands the value back untouched.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Fixed-capacity SPSC ring with `N` slots (`N - 1` usable).
pub struct GroupRing<T, const N: usize> {
    slots: [UnsafeCell<MaybeUninit<T>>; N],
    /// Next slot to write (producer-owned).
    head: AtomicUsize,
    /// Next slot to read (consumer-owned).
    tail: AtomicUsize,
}

// SAFETY: values cross contexts, hence T: Send. Each index is advanced by one
// side only, and release/acquire pairs publish slot contents before the index.
unsafe impl<T: Send, const N: usize> Sync for GroupRing<T, N> {}
unsafe impl<T: Send, const N: usize> Send for GroupRing<T, N> {}

impl<T, const N: usize> GroupRing<T, N> {
    /// Create an empty ring.
    ///
    /// # Panics
    ///
    /// `N` must be at least 2.
    pub const fn new() -> Self {
        assert!(N >= 2, "ring needs at least 2 slots (1 usable)");

        GroupRing {
            // SAFETY: an array of MaybeUninit needs no initialization.
            slots: unsafe { MaybeUninit::<[UnsafeCell<MaybeUninit<T>>; N]>::uninit().assume_init() },
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Maximum number of queued values.
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Enqueue (producer side). A full ring returns `Err(val)` and is not modified.
    pub fn push(&self, val: T) -> Result<(), T> {
        let head = self.head.load(Ordering::Relaxed);
        let next = (head + 1) % N;
        if next == self.tail.load(Ordering::Acquire) {
            return Err(val);
        }

        // SAFETY: only the producer writes at `head`, and `next != tail`
        // means the consumer is not reading this slot.
        unsafe { (*self.slots[head].get()).write(val) };
        self.head.store(next, Ordering::Release);
        Ok(())
    }

    /// Dequeue the oldest value (consumer side).
    pub fn pop(&self) -> Option<T> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: `tail != head`, so the producer has published this slot.
        let val = unsafe { (*self.slots[tail].get()).assume_init_read() };
        self.tail.store((tail + 1) % N, Ordering::Release);
        Some(val)
    }

    /// Number of queued values.
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (head + N - tail) % N
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == N - 1
    }

    /// Raw `(head, tail)` indices.
    pub fn indices(&self) -> (usize, usize) {
        (
            self.head.load(Ordering::Acquire),
            self.tail.load(Ordering::Acquire),
        )
    }

    /// Drop everything queued (consumer side).
    pub fn clear(&self) {
        while self.pop().is_some() {}
    }
}

impl<T, const N: usize> Default for GroupRing<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Drop for GroupRing<T, N> {
    fn drop(&mut self) {
        self.clear();
    }
}
