use thiserror::Error;

/// Filename template problems.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilenameError {
    #[error("template has no `{{}}` placeholder")]
    MissingPlaceholder,

    #[error("unsupported placeholder, expected `{{}}` or `{{:0W}}`")]
    BadPlaceholder,

    #[error("filename longer than {max} bytes")]
    TooLong { max: usize },
}

/// A failed storage operation, recorded by the file logger.
///
/// The logger never retries: the affected file is closed and recording moves
/// on to the next index. [`LoggerError::BufferTooSmall`] is the exception and
/// terminates the logger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoggerError<E> {
    #[error("filename: {0}")]
    Filename(FilenameError),

    #[error("open failed: {0:?}")]
    Open(E),

    #[error("preallocate failed: {0:?}")]
    Preallocate(E),

    #[error("write failed: {0:?}")]
    Write(E),

    #[error("short write: {written} of {expected} bytes")]
    ShortWrite { expected: usize, written: usize },

    #[error("truncate failed: {0:?}")]
    Truncate(E),

    #[error("close failed: {0:?}")]
    Close(E),

    #[error("write buffer holds {capacity} bytes, drain writes {needed}")]
    BufferTooSmall { needed: usize, capacity: usize },
}

impl<E> LoggerError<E> {
    /// Name of the operation that failed.
    pub fn operation(&self) -> &'static str {
        match self {
            LoggerError::Filename(_) => "filename",
            LoggerError::Open(_) => "open",
            LoggerError::Preallocate(_) => "preallocate",
            LoggerError::Write(_) | LoggerError::ShortWrite { .. } => "write",
            LoggerError::Truncate(_) => "truncate",
            LoggerError::Close(_) => "close",
            LoggerError::BufferTooSmall { .. } => "buffer",
        }
    }
}

impl<E> From<FilenameError> for LoggerError<E> {
    fn from(err: FilenameError) -> Self {
        LoggerError::Filename(err)
    }
}
