//! File rotation: drains the logging queue into a bounded sequence of files.
//!
//! [`FileLogger::save`] is called repeatedly from the main loop. Each call
//! advances a small state machine by at most one storage write:
//!
//! ```text
//!            open ok                 write count reached / write error
//! Closed ──────────────► Open ─────────────────────────────► Closing
//!   ▲  │                  │ ▲ nothing ready / write ok          │
//!   │  │ index > max      └─┘                                   │
//!   │  ▼                                      truncate + close  │
//!   │ Terminated (Stop forever)                                 │
//!   └───────────────────────────────────────────────────────────┘
//! ```
//!
//! A transition into `Closing` finishes within the same call. Storage errors
//! are recorded (see [`FileLogger::take_error`]) and the affected file is
//! skipped, never retried.
//!
//! ## Re-entrancy
//!
//! `save` is guarded by an atomic busy flag taken with a non-blocking
//! try-lock. A nested or concurrent call returns [`SaveStatus::Busy`] without
//! touching the session.

mod error;
mod filename;

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::constants::DEFAULT_PREALLOCATE_BYTES;
use crate::storage::{Clock, FatDateTime, Storage};

pub use error::{FilenameError, LoggerError};
pub use filename::{format_filename, FileName};

/// Source of ready-to-write interleaved sample buffers.
pub trait Drain {
    /// Fill `buf` with one write's worth of data and return its length, or
    /// `None` (with no side effects) when not enough data is queued.
    fn drain(&self, buf: &mut [u8]) -> Option<usize>;

    /// Bytes produced by one successful [`drain`](Drain::drain).
    fn write_len(&self) -> usize;

    /// Cumulative count of groups dropped because the queue was full.
    fn overruns(&self) -> u32;
}

/// Rotation limits and file naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Name with one `{}` or `{:0W}` placeholder for the 1-based file index.
    pub name_template: &'static str,
    /// Files to record before terminating.
    pub max_files: u32,
    /// Successful writes per file; 0 means unlimited.
    pub max_writes_per_file: u32,
    /// Space reserved at open; 0 skips preallocation.
    pub preallocate_bytes: u64,
}

impl LoggerConfig {
    pub const fn new(name_template: &'static str, max_files: u32, max_writes_per_file: u32) -> Self {
        LoggerConfig {
            name_template,
            max_files,
            max_writes_per_file,
            preallocate_bytes: DEFAULT_PREALLOCATE_BYTES,
        }
    }

    pub const fn with_preallocate(mut self, bytes: u64) -> Self {
        self.preallocate_bytes = bytes;
        self
    }
}

/// Rotation state. Discriminants are stable (1 is unused).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FileState {
    Closed = 0,
    Open = 2,
    Closing = 3,
    Terminated = 4,
}

impl FileState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            2 => FileState::Open,
            3 => FileState::Closing,
            4 => FileState::Terminated,
            _ => FileState::Closed,
        }
    }
}

/// Outcome of one [`FileLogger::save`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SaveStatus {
    /// Keep calling.
    Progress,
    /// All files recorded; stop acquisition.
    Stop,
    /// Another call is in progress.
    Busy,
}

/// Counters for the current (or most recently closed) file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoggerStats {
    /// 1-based index; 0 before the first open.
    pub file_index: u32,
    pub writes: u32,
    /// Groups dropped by the queue while this file was open.
    pub overruns: u32,
    pub bytes_written: u64,
}

struct Session<S: Storage, C, const NB: usize> {
    storage: S,
    clock: C,
    config: LoggerConfig,
    state: FileState,
    file: Option<S::File>,
    name: FileName,
    stats: LoggerStats,
    overrun_base: u32,
    error: Option<LoggerError<S::Error>>,
    buffer: [u8; NB],
}

impl<S: Storage, C: Clock, const NB: usize> Session<S, C, NB> {
    fn step(&mut self, drain: &impl Drain) -> SaveStatus {
        match self.state {
            FileState::Terminated => return SaveStatus::Stop,
            FileState::Closed => return self.open_next(drain),
            FileState::Open => self.write_next(drain),
            FileState::Closing => {}
        }
        if self.state == FileState::Closing {
            self.close_current(drain);
        }
        SaveStatus::Progress
    }

    fn open_next(&mut self, drain: &impl Drain) -> SaveStatus {
        let needed = drain.write_len();
        if needed > NB {
            self.record(LoggerError::BufferTooSmall {
                needed,
                capacity: NB,
            });
            self.state = FileState::Terminated;
            return SaveStatus::Stop;
        }

        let index = match self.stats.file_index.checked_add(1) {
            Some(index) if index <= self.config.max_files => index,
            _ => {
                info!("recorded {=u32} files, terminating", self.config.max_files);
                self.state = FileState::Terminated;
                return SaveStatus::Stop;
            }
        };
        self.stats.file_index = index;

        self.name = match format_filename(self.config.name_template, index) {
            Ok(name) => name,
            Err(err) => {
                self.record(err.into());
                return SaveStatus::Progress;
            }
        };
        let created = FatDateTime::from_unix(self.clock.now());
        let mut file = match self.storage.open(&self.name, created) {
            Ok(file) => file,
            Err(err) => {
                self.record(LoggerError::Open(err));
                return SaveStatus::Progress;
            }
        };
        info!("opened {=str}", self.name.as_str());

        self.stats.writes = 0;
        self.stats.overruns = 0;
        self.stats.bytes_written = 0;
        self.overrun_base = drain.overruns();

        let prealloc = match self.config.preallocate_bytes {
            0 => Ok(()),
            bytes => self.storage.preallocate(&mut file, bytes),
        };
        self.file = Some(file);
        self.state = FileState::Open;
        if let Err(err) = prealloc {
            self.record(LoggerError::Preallocate(err));
            self.state = FileState::Closing;
            self.close_current(drain);
        }
        SaveStatus::Progress
    }

    fn write_next(&mut self, drain: &impl Drain) {
        self.stats.overruns = drain.overruns().wrapping_sub(self.overrun_base);
        let Some(file) = self.file.as_mut() else {
            self.state = FileState::Closing;
            return;
        };
        let Some(len) = drain.drain(&mut self.buffer) else {
            return;
        };

        match self.storage.write(file, &self.buffer[..len]) {
            Ok(written) if written == len => {
                self.stats.writes = self.stats.writes.saturating_add(1);
                self.stats.bytes_written = self.stats.bytes_written.saturating_add(len as u64);
                let limit = self.config.max_writes_per_file;
                if limit != 0 && self.stats.writes >= limit {
                    self.state = FileState::Closing;
                }
            }
            Ok(written) => {
                self.record(LoggerError::ShortWrite {
                    expected: len,
                    written,
                });
                self.state = FileState::Closing;
            }
            Err(err) => {
                self.record(LoggerError::Write(err));
                self.state = FileState::Closing;
            }
        }
    }

    fn close_current(&mut self, drain: &impl Drain) {
        if let Some(mut file) = self.file.take() {
            if let Err(err) = self.storage.truncate(&mut file) {
                self.record(LoggerError::Truncate(err));
            }
            if let Err(err) = self.storage.close(file) {
                self.record(LoggerError::Close(err));
            }
            self.stats.overruns = drain.overruns().wrapping_sub(self.overrun_base);
            info!(
                "closed {=str}: {=u32} writes, {=u32} overruns, {=u64} bytes",
                self.name.as_str(),
                self.stats.writes,
                self.stats.overruns,
                self.stats.bytes_written
            );
        }
        self.state = FileState::Closed;
    }

    fn record(&mut self, err: LoggerError<S::Error>) {
        error!(
            "{=str} failed on file {=u32}",
            err.operation(),
            self.stats.file_index
        );
        self.error = Some(err);
    }
}

/// Records a [`Drain`] into a rotating sequence of files.
///
/// `NB` is the write buffer size in bytes and must be at least the drain's
/// [`write_len`](Drain::write_len) (e.g.
/// [`AudioRecordLogger::WRITE_BYTES`](crate::io::AudioRecordLogger::WRITE_BYTES)).
/// A smaller buffer records [`LoggerError::BufferTooSmall`] on the first
/// `save` and terminates without opening a file.
pub struct FileLogger<S: Storage, C: Clock, const NB: usize> {
    busy: AtomicBool,
    state: AtomicU8,
    session: UnsafeCell<Session<S, C, NB>>,
}

// SAFETY: the session is only reached through `BusyGuard`, which grants exclusive
// access; everything else is atomic.
unsafe impl<S, C, const NB: usize> Sync for FileLogger<S, C, NB>
where
    S: Storage + Send,
    S::File: Send,
    S::Error: Send,
    C: Clock + Send,
{
}

/// Held while a call owns the session; releases the flag on drop.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| BusyGuard(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: Storage, C: Clock, const NB: usize> FileLogger<S, C, NB> {
    /// Create a logger in the `Closed` state; the first `save` opens file 1.
    ///
    /// Fails if `config.name_template` cannot name every file up to
    /// `max_files`.
    pub fn new(storage: S, clock: C, config: LoggerConfig) -> Result<Self, FilenameError> {
        format_filename(config.name_template, config.max_files.max(1))?;

        Ok(FileLogger {
            busy: AtomicBool::new(false),
            state: AtomicU8::new(FileState::Closed as u8),
            session: UnsafeCell::new(Session {
                storage,
                clock,
                config,
                state: FileState::Closed,
                file: None,
                name: FileName::new(),
                stats: LoggerStats::default(),
                overrun_base: 0,
                error: None,
                buffer: [0; NB],
            }),
        })
    }

    /// Advance the rotation by at most one write.
    pub fn save(&self, drain: &impl Drain) -> SaveStatus {
        self.with_session(|session| session.step(drain))
            .unwrap_or(SaveStatus::Busy)
    }

    /// Close any open file and stop for good.
    pub fn terminate(&self, drain: &impl Drain) -> SaveStatus {
        self.with_session(|session| {
            if session.state != FileState::Terminated {
                session.close_current(drain);
                session.state = FileState::Terminated;
            }
            SaveStatus::Stop
        })
        .unwrap_or(SaveStatus::Busy)
    }

    /// Current rotation state.
    pub fn state(&self) -> FileState {
        FileState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Counters of the current or last file; `None` while a call is in progress.
    pub fn stats(&self) -> Option<LoggerStats> {
        self.with_session(|session| session.stats)
    }

    /// Name of the current or last file.
    pub fn file_name(&self) -> Option<FileName> {
        self.with_session(|session| session.name.clone())
    }

    /// Take the most recent storage error.
    pub fn take_error(&self) -> Option<LoggerError<S::Error>> {
        self.with_session(|session| session.error.take()).flatten()
    }

    /// The storage backend.
    pub fn storage(&mut self) -> &mut S {
        &mut self.session.get_mut().storage
    }

    fn with_session<R>(&self, f: impl FnOnce(&mut Session<S, C, NB>) -> R) -> Option<R> {
        let _busy = BusyGuard::try_acquire(&self.busy)?;
        // SAFETY: `_busy` is the only way to reach the session and at most
        // one exists at a time.
        let session = unsafe { &mut *self.session.get() };
        let result = f(&mut *session);
        self.state.store(session.state as u8, Ordering::Release);
        Some(result)
    }
}
