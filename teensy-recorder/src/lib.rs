//! # teensy-recorder
//!
//! A `no_std`, zero-allocation multichannel audio recorder for the
//! [Teensy 4.x](https://www.pjrc.com/teensy/) (i.MX RT1062, Cortex-M7).
//! An I2S receiver streams 2 or 4 channels by DMA into a circular buffer;
//! the DMA interrupt de-interleaves each completed half into per-channel
//! audio blocks; once per tick the filled blocks travel through the stream
//! graph into a logging queue, and the main loop drains that queue into a
//! rotating sequence of files.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Memory | [`block`] | Fixed-size audio block pool with refcounted handles |
//! | Trait | [`node`] / [`control`] | `AudioNode` and `CaptureControl` traits |
//! | I/O | [`io`] | DMA ring, I2S capture engine, logging queue |
//! | Graph | [`graph`] | [`audio_graph!`] macro for declarative wiring |
//! | Storage | [`storage`] / [`logger`] | Storage seam and file rotation |
//!
//! ## Quick start
//!
//! ```ignore
//! use teensy_recorder::audio_graph;
//! use teensy_recorder::block::AudioBlockPool;
//! use teensy_recorder::io::*;
//! use teensy_recorder::logger::{FileLogger, LoggerConfig, SaveStatus};
//!
//! static POOL: AudioBlockPool = AudioBlockPool::with_capacity(60);
//!
//! audio_graph! {
//!     pub struct Recorder {
//!         input: AudioInputI2SQuad = AudioInputI2S::new(&POOL, true) => {},
//!         logger: AudioRecordLogger<4, 8, 2> => {
//!             (input, 0), (input, 1), (input, 2), (input, 3)
//!         },
//!     }
//! }
//!
//! let mut g = Recorder::new();
//! g.input.begin(&mut sai_rx)?;
//! g.logger.begin();
//!
//! // DMA half/complete interrupt:
//! if g.input.service(&sai_rx, &RING) {
//!     g.update_all();
//! }
//!
//! // Main loop:
//! let files: FileLogger<_, _, { AudioRecordLogger::<4, 8, 2>::WRITE_BYTES }> =
//!     FileLogger::new(sd, rtc_now, LoggerConfig::new("REC_{:04}.BIN", 100, 5000))?;
//! while files.save(&g.logger) != SaveStatus::Stop {}
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `defmt` | no | Logging through [`defmt`](https://docs.rs/defmt) |
//!
//! ## Audio parameters
//!
//! - **Block size:** 128 samples ([`constants::AUDIO_BLOCK_SAMPLES`])
//! - **Sample rate:** 44 117.647 Hz ([`constants::AUDIO_SAMPLE_RATE_EXACT`])
//! - **Sample format:** `i16` (signed 16-bit), stored little-endian
//! - **Block pool:** up to 64 blocks ([`constants::POOL_SIZE`])

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod constants;
pub mod block;
pub mod node;
pub mod control;
pub mod io;
pub mod graph;
pub mod storage;
pub mod logger;
