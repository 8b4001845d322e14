//! Storage and wall-clock seams consumed by the file logger.
//!
//! The logger never touches an SD card or filesystem directly. Board support
//! code implements [`Storage`] on top of its filesystem driver (SDIO + FAT
//! on a Teensy 4.1) and [`Clock`] on top of the RTC.

mod fat_time;

#[cfg(test)]
pub(crate) mod mock;

pub use fat_time::FatDateTime;

/// Minimal file API needed to record into a sequence of files.
///
/// All calls come from the cooperative (main loop) context and may block.
pub trait Storage {
    /// Open file handle.
    type File;
    /// Driver error.
    type Error: core::fmt::Debug;

    /// Create `name` (truncating an existing file) for writing.
    fn open(&mut self, name: &str, created: FatDateTime) -> Result<Self::File, Self::Error>;

    /// Reserve `bytes` of contiguous space so writes never wait on cluster
    /// allocation.
    fn preallocate(&mut self, file: &mut Self::File, bytes: u64) -> Result<(), Self::Error>;

    /// Append `data`; returns the number of bytes written.
    fn write(&mut self, file: &mut Self::File, data: &[u8]) -> Result<usize, Self::Error>;

    /// Drop any preallocated space past the current position.
    fn truncate(&mut self, file: &mut Self::File) -> Result<(), Self::Error>;

    /// Flush and close.
    fn close(&mut self, file: Self::File) -> Result<(), Self::Error>;
}

/// Wall-clock source for file timestamps.
pub trait Clock {
    /// Seconds since the Unix epoch, UTC.
    fn now(&self) -> u32;
}

impl<F: Fn() -> u32> Clock for F {
    fn now(&self) -> u32 {
        self()
    }
}
