//! DMA-driven multichannel I2S input.
//!
//! [`AudioInputI2S`] de-interleaves the receive DMA ring into one audio block
//! per channel and hands completed blocks to the stream graph once per tick.
//!
//! ## Architecture
//!
//! ```text
//! SAI RX            RxRing<N> (DMAMEM)                 ChannelSet
//! ┌────────┐       ┌──────────┬──────────┐           ┌─────────────┐
//! │ RDR[0] │─DMA──►│  Half A  │  Half B  │──deint.──►│ ch0 … chN-1 │
//! │ RDR[1] │       │ 64 frames│ 64 frames│           └─────────────┘
//! └────────┘       └──────────┴──────────┘                  │ handoff()
//!                                                           ▼
//!                                                    stream graph
//! ```
//!
//! ## Contexts
//!
//! [`isr()`](AudioInputI2S::isr) runs in the DMA interrupt;
//! [`handoff()`](AudioInputI2S::handoff) (or [`AudioNode::update`]) runs once
//! per tick in the cooperative context. The channel set and the fill offset
//! are the only state the two share, and both sides touch them only inside
//! `critical_section::with`. The hand-off allocates before and releases after
//! its critical section, so interrupts are masked for a pointer swap and a
//! counter reset only.
//!
//! ## Usage with RTIC
//!
//! ```ignore
//! static POOL: AudioBlockPool = AudioBlockPool::new();
//! static INPUT: AudioInputI2SQuad = AudioInputI2S::new(&POOL, true);
//! static mut RING: RxRing<4> = RxRing::new();
//!
//! // init: program the DMA destination with RING.base_address(), then
//! INPUT.begin(&mut sai_rx)?;
//!
//! // DMA half/complete interrupt:
//! if INPUT.service(&sai_rx, unsafe { &RING }) {
//!     graph.update_all();
//! }
//! ```

use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, Ordering};

use critical_section::Mutex;
use heapless::Vec;

use crate::block::{AudioBlockMut, AudioBlockPool, AudioBlockRef};
use crate::constants::{AUDIO_BLOCK_SAMPLES, HALF_BLOCK_SAMPLES};
use crate::control::{CaptureControl, ChannelConfig};
use crate::node::AudioNode;

use super::dma::{DmaHalf, RxRing};
use super::interleave::deinterleave_channel;

/// Two-channel input on one data line.
pub type AudioInputI2SStereo = AudioInputI2S<2>;
/// Four-channel input on two data lines.
pub type AudioInputI2SQuad = AudioInputI2S<4>;

/// State shared between the interrupt and the hand-off.
struct CaptureState<const N: usize> {
    /// Blocks being filled. All `N` present or none at all.
    blocks: Option<[AudioBlockMut; N]>,
    /// Samples per channel already written into `blocks` (0, 64 or 128).
    offset: usize,
}

/// DMA-driven multichannel I2S input node.
///
/// Implements [`AudioNode`] with 0 inputs and `N` outputs.
pub struct AudioInputI2S<const N: usize> {
    state: Mutex<RefCell<CaptureState<N>>>,
    pool: &'static AudioBlockPool,
    /// If `true`, this node's ISR drives the graph update cycle.
    update_responsibility: bool,
    /// Half-buffers the ISR could not store anywhere.
    missed_halves: AtomicU32,
    /// Hand-offs that could not get a fresh channel set.
    alloc_failures: AtomicU32,
}

impl<const N: usize> AudioInputI2S<N> {
    const CONFIG: ChannelConfig = match ChannelConfig::from_channels(N) {
        Some(config) => config,
        None => panic!("I2S capture supports 2 or 4 channels"),
    };

    /// Create an input node that takes its blocks from `pool`.
    ///
    /// # Arguments
    ///
    /// - `update_responsibility`: if `true`, [`isr()`](Self::isr) reports
    ///   when the graph should run, making this input the timing source.
    pub const fn new(pool: &'static AudioBlockPool, update_responsibility: bool) -> Self {
        let _ = Self::CONFIG;

        AudioInputI2S {
            state: Mutex::new(RefCell::new(CaptureState {
                blocks: None,
                offset: 0,
            })),
            pool,
            update_responsibility,
            missed_halves: AtomicU32::new(0),
            alloc_failures: AtomicU32::new(0),
        }
    }

    /// Start the receiver and its DMA stream.
    pub fn begin<C: CaptureControl>(&self, control: &mut C) -> Result<(), C::Error> {
        control.start_capture(Self::CONFIG)?;
        info!("I2S capture started: {=usize} channels", Self::CONFIG.channels());
        Ok(())
    }

    /// Handle a DMA half-complete or complete interrupt.
    ///
    /// Reads the half of `ring` the hardware is not writing (derived from
    /// `write_address`) and de-interleaves it into the working blocks at the
    /// current offset. Without working blocks, or with blocks already full,
    /// the data is dropped and counted in [`missed_halves`](Self::missed_halves).
    ///
    /// # Returns
    ///
    /// `true` if the graph should be updated now: the hardware has just
    /// wrapped into the first half and this input has update responsibility.
    pub fn isr(&self, ring: &RxRing<N>, write_address: usize) -> bool {
        let active = ring.active_half(write_address);
        let src = ring.half(active.other());

        critical_section::with(|cs| {
            let mut guard = self.state.borrow_ref_mut(cs);
            let state = &mut *guard;
            let offset = state.offset;
            match state.blocks.as_mut() {
                Some(blocks) if offset <= HALF_BLOCK_SAMPLES => {
                    for (channel, block) in blocks.iter_mut().enumerate() {
                        deinterleave_channel(
                            src,
                            channel,
                            &mut block[offset..offset + HALF_BLOCK_SAMPLES],
                        );
                    }
                    state.offset = offset + HALF_BLOCK_SAMPLES;
                }
                _ => {
                    self.missed_halves.fetch_add(1, Ordering::Relaxed);
                }
            }
        });

        active == DmaHalf::First && self.update_responsibility
    }

    /// [`isr()`](Self::isr) using the write address reported by `control`.
    pub fn service<C: CaptureControl>(&self, control: &C, ring: &RxRing<N>) -> bool {
        self.isr(ring, control.write_address())
    }

    /// Exchange the working blocks for fresh ones once a cycle is complete.
    ///
    /// Call once per tick from the cooperative context. Returns the filled
    /// channel set when the ISR has written a full block, `None` otherwise.
    /// Fresh blocks are all-or-nothing: if the pool cannot supply `N` blocks,
    /// none are taken and capture stops storing audio until a later tick
    /// succeeds.
    pub fn handoff(&self) -> Option<[AudioBlockMut; N]> {
        let mut fresh = self.alloc_set();
        if fresh.is_none() {
            self.alloc_failures.fetch_add(1, Ordering::Relaxed);
        }

        let filled = critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            if state.offset >= AUDIO_BLOCK_SAMPLES {
                state.offset = 0;
                core::mem::replace(&mut state.blocks, fresh.take())
            } else {
                if state.blocks.is_none() && fresh.is_some() {
                    state.blocks = fresh.take();
                    state.offset = 0;
                }
                None
            }
        });

        // Unneeded fresh blocks go back to the pool here, with interrupts enabled.
        drop(fresh);
        filled
    }

    /// Take `N` blocks from the pool, or none at all.
    fn alloc_set(&self) -> Option<[AudioBlockMut; N]> {
        let mut set: Vec<AudioBlockMut, N> = Vec::new();
        for _ in 0..N {
            // On failure `set` drops here, releasing the blocks already taken.
            set.push(self.pool.alloc_block()?).ok()?;
        }
        set.into_array().ok()
    }

    /// Whether this input is responsible for triggering graph updates.
    pub fn has_update_responsibility(&self) -> bool {
        self.update_responsibility
    }

    /// Whether a channel set is installed for the ISR to fill.
    pub fn has_working_blocks(&self) -> bool {
        critical_section::with(|cs| self.state.borrow_ref(cs).blocks.is_some())
    }

    /// Current fill offset into the working blocks.
    pub fn block_offset(&self) -> usize {
        critical_section::with(|cs| self.state.borrow_ref(cs).offset)
    }

    /// Half-buffers dropped because no working blocks were available.
    pub fn missed_halves(&self) -> u32 {
        self.missed_halves.load(Ordering::Relaxed)
    }

    /// Hand-offs that failed to allocate a fresh channel set.
    pub fn alloc_failures(&self) -> u32 {
        self.alloc_failures.load(Ordering::Relaxed)
    }
}

impl<const N: usize> AudioNode for AudioInputI2S<N> {
    const NUM_INPUTS: usize = 0;
    const NUM_OUTPUTS: usize = N;

    fn update(
        &mut self,
        _inputs: &[Option<AudioBlockRef>],
        outputs: &mut [Option<AudioBlockMut>],
    ) {
        if let Some(filled) = self.handoff() {
            for (out, block) in outputs.iter_mut().zip(filled) {
                *out = Some(block);
            }
        }
    }
}
