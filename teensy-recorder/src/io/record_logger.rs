//! Graph-to-storage logging queue.
//!
//! [`AudioRecordLogger`] sits at the end of the stream graph and collects one
//! group of `NC` channel blocks per tick into a ring of `NQ` slots. The
//! storage loop drains `NA` groups at a time into one interleaved write
//! buffer. The ring absorbs the difference between the per-tick production
//! rate and the much coarser, jittery write cadence of an SD card.
//!
//! ## Backpressure
//!
//! When the ring is full the incoming group is released and counted as an
//! overrun; queued groups are never overwritten, so channel alignment and
//! ordering of everything already queued survive a slow card.
//!
//! ## Usage
//!
//! ```ignore
//! let logger: AudioRecordLogger<4, 8, 2> = AudioRecordLogger::new();
//! logger.begin();
//!
//! // audio tick (graph update): logger.update(&inputs, &mut [])
//!
//! // main loop:
//! let mut buf = [0u8; AudioRecordLogger::<4, 8, 2>::WRITE_BYTES];
//! if let Some(n) = logger.drain(&mut buf) {
//!     card.write(&buf[..n]);
//! }
//! ```

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use heapless::Vec;

use crate::block::{AudioBlockMut, AudioBlockRef};
use crate::constants::AUDIO_BLOCK_SAMPLES;
use crate::logger::Drain;
use crate::node::AudioNode;

use super::interleave::interleave_group;
use super::ring::GroupRing;

/// Why a group was not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dropped {
    /// Logging is not enabled.
    Disabled,
    /// The queue was full.
    Overrun,
}

/// Multichannel logging queue.
///
/// - `NC`: channels per group (inputs of this node)
/// - `NQ`: ring slots; at most `NQ - 1` groups are queued
/// - `NA`: groups per storage write
///
/// Implements [`AudioNode`] with `NC` inputs and 0 outputs.
pub struct AudioRecordLogger<const NC: usize, const NQ: usize, const NA: usize> {
    queue: GroupRing<[AudioBlockRef; NC], NQ>,
    enabled: AtomicBool,
    overruns: AtomicU32,
}

impl<const NC: usize, const NQ: usize, const NA: usize> AudioRecordLogger<NC, NQ, NA> {
    /// Bytes produced by one [`drain`](Drain::drain).
    pub const WRITE_BYTES: usize = NA * NC * AUDIO_BLOCK_SAMPLES * core::mem::size_of::<i16>();

    const GROUP_BYTES: usize = NC * AUDIO_BLOCK_SAMPLES * core::mem::size_of::<i16>();

    /// Create a disabled, empty logger.
    ///
    /// # Panics
    ///
    /// Compile-time assertions: `NC >= 1`, and `1 <= NA < NQ` so a full
    /// write can ever be queued.
    pub const fn new() -> Self {
        assert!(NC >= 1, "logger needs at least one channel");
        assert!(NA >= 1 && NA < NQ, "groups per write must fit in the queue");

        AudioRecordLogger {
            queue: GroupRing::new(),
            enabled: AtomicBool::new(false),
            overruns: AtomicU32::new(0),
        }
    }

    /// Discard anything queued and start accepting groups.
    ///
    /// Call from the consumer context.
    pub fn begin(&self) {
        self.clear();
        self.enabled.store(true, Ordering::Release);
    }

    /// Stop accepting groups. Queued groups can still be drained.
    pub fn end(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    /// Whether incoming groups are queued.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Release every queued group (consumer side).
    pub fn clear(&self) {
        self.queue.clear();
    }

    /// Queue one group of channel blocks (producer side).
    ///
    /// Never blocks. A rejected group is released before returning.
    pub fn push(&self, group: [AudioBlockRef; NC]) -> Result<(), Dropped> {
        if !self.is_enabled() {
            return Err(Dropped::Disabled);
        }
        match self.queue.push(group) {
            Ok(()) => Ok(()),
            Err(_group) => {
                self.overruns.fetch_add(1, Ordering::Relaxed);
                Err(Dropped::Overrun)
            }
        }
    }

    /// Number of queued groups.
    pub fn depth(&self) -> usize {
        self.queue.len()
    }

    /// Raw ring `(head, tail)` indices.
    pub fn indices(&self) -> (usize, usize) {
        self.queue.indices()
    }
}

impl<const NC: usize, const NQ: usize, const NA: usize> Drain for AudioRecordLogger<NC, NQ, NA> {
    /// Pop exactly `NA` groups, oldest first, and interleave them into `buf`.
    ///
    /// Returns the number of bytes written ([`WRITE_BYTES`](Self::WRITE_BYTES)),
    /// or `None` without touching the queue when fewer than `NA` groups are
    /// waiting or `buf` is too small.
    fn drain(&self, buf: &mut [u8]) -> Option<usize> {
        if buf.len() < Self::WRITE_BYTES {
            warn!(
                "drain buffer too small: {=usize} < {=usize}",
                buf.len(),
                Self::WRITE_BYTES
            );
            return None;
        }
        if self.queue.len() < NA {
            return None;
        }

        for chunk in buf[..Self::WRITE_BYTES].chunks_exact_mut(Self::GROUP_BYTES) {
            interleave_group(self.queue.pop(), chunk);
        }
        Some(Self::WRITE_BYTES)
    }

    fn write_len(&self) -> usize {
        Self::WRITE_BYTES
    }

    fn overruns(&self) -> u32 {
        self.overruns.load(Ordering::Relaxed)
    }
}

impl<const NC: usize, const NQ: usize, const NA: usize> Default for AudioRecordLogger<NC, NQ, NA> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const NC: usize, const NQ: usize, const NA: usize> AudioNode for AudioRecordLogger<NC, NQ, NA> {
    const NUM_INPUTS: usize = NC;
    const NUM_OUTPUTS: usize = 0;

    fn update(
        &mut self,
        inputs: &[Option<AudioBlockRef>],
        _outputs: &mut [Option<AudioBlockMut>],
    ) {
        let group: Vec<AudioBlockRef, NC> = inputs
            .iter()
            .take(NC)
            .map_while(|block| block.clone())
            .collect();
        // A channel missing this tick: nothing is queued.
        let Ok(group) = group.into_array() else {
            return;
        };
        if let Err(Dropped::Overrun) = self.push(group) {
            trace!("logging queue overrun");
        }
    }
}
