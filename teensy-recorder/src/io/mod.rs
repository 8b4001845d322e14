//! Capture and logging nodes of the recording pipeline.
//!
//! ## Components
//!
//! | Node | Inputs | Outputs | Description |
//! |------|--------|---------|-------------|
//! | [`AudioInputI2S`] | 0 | N (2 or 4) | DMA-driven multichannel I2S input |
//! | [`AudioRecordLogger`] | NC | 0 | Audio graph → storage loop |
//!
//! ## Utilities
//!
//! - [`dma`] — Circular receive ring and half detection
//! - [`interleave`] — Frame de-interleave and storage interleave
//! - [`ring`] — Lock-free single-producer single-consumer group ring
//!
//! ## Data path
//!
//! ```text
//! DMA ─► RxRing ─isr()─► ChannelSet ─update_all()─► AudioRecordLogger
//!                                                        │ drain()
//!                                                        ▼
//!                                                  FileLogger::save()
//! ```

pub mod dma;
pub mod interleave;
pub mod ring;
pub mod input_i2s;
pub mod record_logger;

pub use dma::{DmaHalf, RxRing};
pub use input_i2s::{AudioInputI2S, AudioInputI2SQuad, AudioInputI2SStereo};
pub use record_logger::{AudioRecordLogger, Dropped};
