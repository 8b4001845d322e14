use core::ops::{Deref, DerefMut};

use crate::constants::AUDIO_BLOCK_SAMPLES;

use super::pool::AudioBlockPool;

/// Exclusive (mutable) handle to an audio block in a pool.
///
/// There is exactly one `AudioBlockMut` per allocated slot.
/// Provides `DerefMut` access to the underlying `[i16; 128]` samples.
/// Dropping it releases the block back to its pool.
pub struct AudioBlockMut {
    pool: &'static AudioBlockPool,
    slot: u8,
}

impl AudioBlockMut {
    /// Wrap a freshly claimed slot.
    ///
    /// The slot must have just been allocated with refcount = 1 and no other
    /// handle may exist for it.
    pub(crate) fn new(pool: &'static AudioBlockPool, slot: u8) -> Self {
        AudioBlockMut { pool, slot }
    }

    /// Convert this exclusive handle into a shared one.
    /// Zero-cost: no data copy, no refcount change.
    pub fn into_shared(self) -> AudioBlockRef {
        let (pool, slot) = (self.pool, self.slot);
        core::mem::forget(self); // don't run Drop (don't dec_ref)
        AudioBlockRef { pool, slot }
    }

    /// Pool slot index.
    pub fn slot(&self) -> u8 {
        self.slot
    }
}

impl Deref for AudioBlockMut {
    type Target = [i16; AUDIO_BLOCK_SAMPLES];

    fn deref(&self) -> &Self::Target {
        // SAFETY: we hold exclusive access (refcount == 1, unique AudioBlockMut).
        unsafe { &(*self.pool.data_ptr(self.slot)).samples }
    }
}

impl DerefMut for AudioBlockMut {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: we hold exclusive access (refcount == 1, unique AudioBlockMut).
        unsafe { &mut (*self.pool.data_ptr(self.slot)).samples }
    }
}

impl Drop for AudioBlockMut {
    fn drop(&mut self) {
        self.pool.dec_ref(self.slot);
    }
}

/// Shared (read-only) handle to an audio block in a pool.
///
/// Cloning increments the refcount; dropping decrements it. The slot is
/// freed when the last reference goes away.
pub struct AudioBlockRef {
    pool: &'static AudioBlockPool,
    slot: u8,
}

impl AudioBlockRef {
    /// Pool slot index.
    pub fn slot(&self) -> u8 {
        self.slot
    }
}

impl Deref for AudioBlockRef {
    type Target = [i16; AUDIO_BLOCK_SAMPLES];

    fn deref(&self) -> &Self::Target {
        // SAFETY: slot is allocated and data is immutable through shared references.
        unsafe { &(*self.pool.data_ptr(self.slot)).samples }
    }
}

impl Clone for AudioBlockRef {
    fn clone(&self) -> Self {
        self.pool.inc_ref(self.slot);
        AudioBlockRef {
            pool: self.pool,
            slot: self.slot,
        }
    }
}

impl Drop for AudioBlockRef {
    fn drop(&mut self) {
        self.pool.dec_ref(self.slot);
    }
}
