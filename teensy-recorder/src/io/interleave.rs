//! Frame de-interleaving (capture side) and sample interleaving (storage side).
//!
//! ## Receive frame layout
//!
//! A frame in the DMA ring holds one sample per slot. With one data line
//! (stereo) the slots are `[ch0, ch1]`. With two data lines (quad) the
//! receiver alternates lines inside each half-frame, so the slots arrive as
//! `[ch0, ch2, ch1, ch3]`.
//!
//! ## Storage layout
//!
//! Written buffers are sample-major: sample 0 of every channel, then sample 1
//! of every channel, and so on, each `i16` little-endian.

use crate::block::AudioBlockRef;
use crate::constants::AUDIO_BLOCK_SAMPLES;

/// Slot within an `N`-slot receive frame that carries `channel`.
pub const fn frame_slot<const N: usize>(channel: usize) -> usize {
    if N == 4 {
        // swaps channels 1 and 2, its own inverse
        [0, 2, 1, 3][channel]
    } else {
        channel
    }
}

/// Copy one channel out of a run of interleaved frames.
///
/// # Panics
///
/// Debug-asserts that `dest` holds exactly one sample per frame.
pub fn deinterleave_channel<const N: usize>(src: &[[i16; N]], channel: usize, dest: &mut [i16]) {
    debug_assert_eq!(src.len(), dest.len());

    let slot = frame_slot::<N>(channel);
    for (d, frame) in dest.iter_mut().zip(src) {
        *d = frame[slot];
    }
}

/// Interleave one group of channel blocks into `dest` as little-endian bytes.
///
/// `dest` must hold `NC * AUDIO_BLOCK_SAMPLES * 2` bytes. Blocks are released
/// one by one as soon as they have been copied. `None` writes silence.
pub fn interleave_group<const NC: usize>(group: Option<[AudioBlockRef; NC]>, dest: &mut [u8]) {
    debug_assert_eq!(dest.len(), NC * AUDIO_BLOCK_SAMPLES * 2);

    let Some(group) = group else {
        dest.fill(0);
        return;
    };
    for (channel, block) in group.into_iter().enumerate() {
        for (j, &sample) in block.iter().enumerate() {
            let at = (j * NC + channel) * 2;
            dest[at..at + 2].copy_from_slice(&sample.to_le_bytes());
        }
        drop(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::AudioBlockPool;

    fn block(pool: &'static AudioBlockPool, base: i16) -> AudioBlockRef {
        let mut b = pool.alloc_block().unwrap();
        for (i, s) in b.iter_mut().enumerate() {
            *s = base.wrapping_add(i as i16);
        }
        b.into_shared()
    }

    fn sample_at(buf: &[u8], index: usize) -> i16 {
        i16::from_le_bytes([buf[index * 2], buf[index * 2 + 1]])
    }

    #[test]
    fn stereo_slots_are_identity() {
        assert_eq!(frame_slot::<2>(0), 0);
        assert_eq!(frame_slot::<2>(1), 1);
    }

    #[test]
    fn quad_slots_swap_middle_channels() {
        let slots: [usize; 4] = core::array::from_fn(frame_slot::<4>);
        assert_eq!(slots, [0, 2, 1, 3]);
    }

    #[test]
    fn deinterleave_quad_frames() {
        // slot order on the wire: ch0, ch2, ch1, ch3
        let src = [[10, 30, 20, 40], [11, 31, 21, 41]];
        let mut out = [[0i16; 2]; 4];
        for (ch, dest) in out.iter_mut().enumerate() {
            deinterleave_channel(&src, ch, dest);
        }
        assert_eq!(out, [[10, 11], [20, 21], [30, 31], [40, 41]]);
    }

    #[test]
    fn deinterleave_extreme_values() {
        let src = [[i16::MIN, i16::MAX], [i16::MAX, i16::MIN]];
        let mut left = [0i16; 2];
        let mut right = [0i16; 2];
        deinterleave_channel(&src, 0, &mut left);
        deinterleave_channel(&src, 1, &mut right);
        assert_eq!(left, [i16::MIN, i16::MAX]);
        assert_eq!(right, [i16::MAX, i16::MIN]);
    }

    #[test]
    fn interleave_is_sample_major() {
        static POOL: AudioBlockPool = AudioBlockPool::new();
        let group = [block(&POOL, 0), block(&POOL, 1000), block(&POOL, -1000)];
        let mut buf = [0xAAu8; 3 * AUDIO_BLOCK_SAMPLES * 2];

        interleave_group(Some(group), &mut buf);

        for j in 0..AUDIO_BLOCK_SAMPLES {
            assert_eq!(sample_at(&buf, j * 3), j as i16);
            assert_eq!(sample_at(&buf, j * 3 + 1), 1000 + j as i16);
            assert_eq!(sample_at(&buf, j * 3 + 2), -1000 + j as i16);
        }
        assert_eq!(POOL.allocated_count(), 0, "blocks released after copy");
    }

    #[test]
    fn interleave_writes_little_endian() {
        static POOL: AudioBlockPool = AudioBlockPool::new();
        let mut b = POOL.alloc_block().unwrap();
        b[0] = 0x1234;
        let mut buf = [0u8; AUDIO_BLOCK_SAMPLES * 2];
        interleave_group(Some([b.into_shared()]), &mut buf);
        assert_eq!(&buf[..2], &[0x34, 0x12]);
    }

    #[test]
    fn missing_group_is_silence() {
        let mut buf = [0xFFu8; 2 * AUDIO_BLOCK_SAMPLES * 2];
        interleave_group::<2>(None, &mut buf);
        assert!(buf.iter().all(|&b| b == 0));
    }
}
