use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicU32, AtomicU8, AtomicUsize, Ordering};

use crate::constants::{AUDIO_BLOCK_SAMPLES, POOL_SIZE};

use super::ref_types::AudioBlockMut;

/// Number of 32-bit bitmap words needed to cover [`POOL_SIZE`] slots.
///
/// Cortex-M7 has no 64-bit atomics, so the allocation bitmap is split into
/// words that can each be claimed with a single CAS.
const BITMAP_WORDS: usize = POOL_SIZE.div_ceil(32);

/// Raw audio block storage: 128 signed 16-bit samples, 4-byte aligned.
#[repr(C, align(4))]
pub struct AudioBlockData {
    pub samples: [i16; AUDIO_BLOCK_SAMPLES],
}

impl AudioBlockData {
    const fn zeroed() -> Self {
        AudioBlockData {
            samples: [0i16; AUDIO_BLOCK_SAMPLES],
        }
    }
}

/// Lock-free, fixed-capacity pool of audio blocks.
///
/// An atomic bitmap tracks which slots are allocated, and per-slot atomic
/// reference counts implement shared ownership. All operations are lock-free
/// and ISR-safe.
///
/// Pools are ordinary values, usually placed in a `static`; every block handle
/// remembers the pool it was taken from and returns itself there on drop.
pub struct AudioBlockPool {
    /// Bit N of word N/32 set means slot N is allocated.
    bitmap: [AtomicU32; BITMAP_WORDS],
    /// Per-slot reference counts.
    refcounts: [AtomicU8; POOL_SIZE],
    /// Number of usable slots (`<= POOL_SIZE`).
    capacity: usize,
    /// Largest number of simultaneously allocated blocks seen.
    max_allocated: AtomicUsize,
    storage: UnsafeCell<[MaybeUninit<AudioBlockData>; POOL_SIZE]>,
}

// SAFETY: all shared state is atomic. A storage slot is only touched through
// a handle that either exclusively owns it (claimed via the bitmap CAS) or
// shares it read-only (refcount > 1).
unsafe impl Sync for AudioBlockPool {}

impl AudioBlockPool {
    /// Create a pool using every one of the [`POOL_SIZE`] slots.
    pub const fn new() -> Self {
        Self::with_capacity(POOL_SIZE)
    }

    /// Create a pool that hands out at most `capacity` blocks.
    ///
    /// The equivalent of Teensy's `AudioMemory(n)`.
    ///
    /// # Panics
    ///
    /// If `capacity` is zero or larger than [`POOL_SIZE`].
    #[allow(clippy::declare_interior_mut_const)]
    pub const fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0 && capacity <= POOL_SIZE, "pool capacity out of range");

        const ZERO_WORD: AtomicU32 = AtomicU32::new(0);
        const ZERO_REFCOUNT: AtomicU8 = AtomicU8::new(0);
        AudioBlockPool {
            bitmap: [ZERO_WORD; BITMAP_WORDS],
            refcounts: [ZERO_REFCOUNT; POOL_SIZE],
            capacity,
            max_allocated: AtomicUsize::new(0),
            storage: UnsafeCell::new(unsafe {
                MaybeUninit::<[MaybeUninit<AudioBlockData>; POOL_SIZE]>::zeroed().assume_init()
            }),
        }
    }

    /// Mask of usable slots within bitmap word `word`.
    fn usable_mask(&self, word: usize) -> u32 {
        let first = word * 32;
        if self.capacity <= first {
            0
        } else if self.capacity - first >= 32 {
            u32::MAX
        } else {
            (1u32 << (self.capacity - first)) - 1
        }
    }

    /// Claim a free slot. Returns the slot index, or `None` if the pool is exhausted.
    ///
    /// The returned slot has refcount = 1 and its data is zeroed.
    pub fn alloc(&self) -> Option<u8> {
        for (word_idx, word) in self.bitmap.iter().enumerate() {
            let usable = self.usable_mask(word_idx);
            loop {
                let bits = word.load(Ordering::Acquire);
                let free = !bits & usable;
                if free == 0 {
                    break; // try the next word
                }
                let bit_idx = free.trailing_zeros();
                let bit = 1u32 << bit_idx;
                match word.compare_exchange_weak(
                    bits,
                    bits | bit,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                ) {
                    Ok(_) => {
                        let slot = word_idx * 32 + bit_idx as usize;
                        self.refcounts[slot].store(1, Ordering::Release);
                        // SAFETY: we just exclusively claimed this slot via the bitmap CAS.
                        unsafe {
                            let block_ptr = (*self.storage.get())[slot].as_mut_ptr();
                            *block_ptr = AudioBlockData::zeroed();
                        }
                        self.max_allocated
                            .fetch_max(self.allocated_count(), Ordering::Relaxed);
                        return Some(slot as u8);
                    }
                    Err(_) => continue, // an ISR raced us, retry
                }
            }
        }
        None
    }

    /// Allocate a zeroed block and wrap it in an exclusive handle.
    pub fn alloc_block(&'static self) -> Option<AudioBlockMut> {
        self.alloc().map(|slot| AudioBlockMut::new(self, slot))
    }

    /// Increment the reference count for a slot (used by `AudioBlockRef::clone`).
    pub fn inc_ref(&self, slot: u8) {
        debug_assert!((slot as usize) < self.capacity);
        let old = self.refcounts[slot as usize].fetch_add(1, Ordering::AcqRel);
        debug_assert!(old > 0, "inc_ref on unallocated slot");
        debug_assert!(old < 255, "refcount overflow");
    }

    /// Decrement the reference count for a slot, freeing it when it reaches zero.
    pub fn dec_ref(&self, slot: u8) {
        debug_assert!((slot as usize) < self.capacity);
        let old = self.refcounts[slot as usize].fetch_sub(1, Ordering::AcqRel);
        debug_assert!(old > 0, "dec_ref on slot with refcount 0");
        if old == 1 {
            let slot = slot as usize;
            self.bitmap[slot / 32].fetch_and(!(1u32 << (slot % 32)), Ordering::Release);
        }
    }

    /// Current reference count for a slot.
    pub fn refcount(&self, slot: u8) -> u8 {
        self.refcounts[slot as usize].load(Ordering::Acquire)
    }

    /// Get a pointer to the block data for a given slot.
    ///
    /// # Safety
    /// Caller must ensure the slot is currently allocated.
    pub unsafe fn data_ptr(&self, slot: u8) -> *mut AudioBlockData {
        let storage = self.storage.get();
        unsafe { (*storage)[slot as usize].as_mut_ptr() }
    }

    /// Number of usable slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of currently allocated blocks.
    pub fn allocated_count(&self) -> usize {
        self.bitmap
            .iter()
            .map(|w| w.load(Ordering::Acquire).count_ones() as usize)
            .sum()
    }

    /// Highest number of blocks allocated at the same time since creation
    /// or the last [`reset_max_allocated`](Self::reset_max_allocated).
    pub fn max_allocated(&self) -> usize {
        self.max_allocated.load(Ordering::Relaxed)
    }

    /// Restart high-water tracking from the current usage.
    pub fn reset_max_allocated(&self) {
        self.max_allocated
            .store(self.allocated_count(), Ordering::Relaxed);
    }
}

impl Default for AudioBlockPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_returns_slot() {
        static POOL: AudioBlockPool = AudioBlockPool::new();
        let slot = POOL.alloc().unwrap();
        assert!((slot as usize) < POOL_SIZE);
        assert_eq!(POOL.refcount(slot), 1);
    }

    #[test]
    fn alloc_zeroes_reused_slot() {
        static POOL: AudioBlockPool = AudioBlockPool::with_capacity(1);
        let slot = POOL.alloc().unwrap();
        unsafe { (*POOL.data_ptr(slot)).samples.fill(-7) };
        POOL.dec_ref(slot);

        let again = POOL.alloc().unwrap();
        assert_eq!(again, slot);
        let data = unsafe { &*POOL.data_ptr(again) };
        assert!(data.samples.iter().all(|&s| s == 0));
    }

    #[test]
    fn alloc_spans_bitmap_words() {
        static POOL: AudioBlockPool = AudioBlockPool::new();
        let mut slots = [0u8; POOL_SIZE];
        for s in slots.iter_mut() {
            *s = POOL.alloc().unwrap();
        }
        slots.sort();
        for (i, &s) in slots.iter().enumerate() {
            assert_eq!(s as usize, i);
        }
        assert!(POOL.alloc().is_none());
        assert_eq!(POOL.allocated_count(), POOL_SIZE);
    }

    #[test]
    fn capacity_limits_allocation() {
        static POOL: AudioBlockPool = AudioBlockPool::with_capacity(5);
        for _ in 0..5 {
            assert!(POOL.alloc().is_some());
        }
        assert!(POOL.alloc().is_none());
        assert_eq!(POOL.capacity(), 5);
    }

    #[test]
    fn refcount_lifecycle() {
        static POOL: AudioBlockPool = AudioBlockPool::new();
        let slot = POOL.alloc().unwrap();

        POOL.inc_ref(slot);
        assert_eq!(POOL.refcount(slot), 2);

        POOL.dec_ref(slot);
        assert_eq!(POOL.allocated_count(), 1);

        POOL.dec_ref(slot);
        assert_eq!(POOL.allocated_count(), 0);
    }

    #[test]
    fn high_water_mark() {
        static POOL: AudioBlockPool = AudioBlockPool::new();
        let a = POOL.alloc().unwrap();
        let b = POOL.alloc().unwrap();
        let c = POOL.alloc().unwrap();
        POOL.dec_ref(b);
        POOL.dec_ref(c);
        assert_eq!(POOL.allocated_count(), 1);
        assert_eq!(POOL.max_allocated(), 3);

        POOL.reset_max_allocated();
        assert_eq!(POOL.max_allocated(), 1);
        POOL.dec_ref(a);
    }
}
