/// Number of 16-bit samples per audio block.
pub const AUDIO_BLOCK_SAMPLES: usize = 128;

/// Number of samples per channel delivered by one half of the DMA ring.
pub const HALF_BLOCK_SAMPLES: usize = AUDIO_BLOCK_SAMPLES / 2;

/// Maximum number of audio blocks a pool can hold.
pub const POOL_SIZE: usize = 64;

/// Exact audio sample rate in Hz (matches Teensy hardware PLL configuration).
pub const AUDIO_SAMPLE_RATE_EXACT: f32 = 44_117.647;

/// Bytes reserved for each log file when it is opened (100 MiB).
pub const DEFAULT_PREALLOCATE_BYTES: u64 = 100 << 20;

/// Longest file name the logger will format.
pub const MAX_FILENAME_LEN: usize = 80;
