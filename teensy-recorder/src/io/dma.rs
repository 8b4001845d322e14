//! Circular DMA receive buffer.
//!
//! The receiver's DMA channel runs in circular mode over an [`RxRing`] and
//! raises an interrupt at the half-complete and complete points. Which half
//! is safe to read is derived from the DMA destination address at the time
//! of the interrupt, never from a software toggle: a missed interrupt then
//! costs one half of audio instead of leaving the reader permanently on the
//! wrong half.
//!
//! ```text
//!            ┌──────────── RxRing<N> (128 frames) ───────────┐
//!            │  First half: 64 frames  │ Second half: 64 fr. │
//!            └─────────────────────────┴─────────────────────┘
//!  DMA writing First  ──► ISR reads Second
//!  DMA writing Second ──► ISR reads First
//! ```

use crate::constants::{AUDIO_BLOCK_SAMPLES, HALF_BLOCK_SAMPLES};

/// One half of a circular DMA buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaHalf {
    First,
    Second,
}

impl DmaHalf {
    /// The other half.
    pub const fn other(self) -> Self {
        match self {
            DmaHalf::First => DmaHalf::Second,
            DmaHalf::Second => DmaHalf::First,
        }
    }
}

/// Receive ring: [`AUDIO_BLOCK_SAMPLES`] interleaved frames of `N` samples.
///
/// Written only by the DMA engine and read only by the capture interrupt.
/// Cache-line aligned so it can live in DMA-visible memory.
#[repr(C, align(32))]
pub struct RxRing<const N: usize> {
    frames: [[i16; N]; AUDIO_BLOCK_SAMPLES],
}

impl<const N: usize> RxRing<N> {
    /// Size of the ring in bytes.
    pub const BYTES: usize = AUDIO_BLOCK_SAMPLES * N * core::mem::size_of::<i16>();

    /// Create a zeroed ring.
    pub const fn new() -> Self {
        RxRing {
            frames: [[0; N]; AUDIO_BLOCK_SAMPLES],
        }
    }

    /// Address of the first byte, as programmed into the DMA destination.
    pub fn base_address(&self) -> usize {
        self.frames.as_ptr() as usize
    }

    /// Half the DMA engine is currently writing, given its destination address.
    pub fn active_half(&self, write_address: usize) -> DmaHalf {
        if write_address < self.base_address() + Self::BYTES / 2 {
            DmaHalf::First
        } else {
            DmaHalf::Second
        }
    }

    /// The frames of one half.
    pub fn half(&self, half: DmaHalf) -> &[[i16; N]] {
        match half {
            DmaHalf::First => &self.frames[..HALF_BLOCK_SAMPLES],
            DmaHalf::Second => &self.frames[HALF_BLOCK_SAMPLES..],
        }
    }

    /// Mutable access to all frames (DMA setup and host-side simulation).
    pub fn frames_mut(&mut self) -> &mut [[i16; N]; AUDIO_BLOCK_SAMPLES] {
        &mut self.frames
    }
}

impl<const N: usize> Default for RxRing<N> {
    fn default() -> Self {
        Self::new()
    }
}
