//! In-memory [`Storage`] for host tests, with failure injection.

use std::string::{String, ToString};
use std::vec::Vec;

use super::{FatDateTime, Storage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    Open,
    Preallocate,
    Write,
    Truncate,
    Close,
}

#[derive(Debug, Default)]
pub struct MockFile {
    pub name: String,
    pub created: Option<FatDateTime>,
    pub preallocated: u64,
    pub data: Vec<u8>,
    pub truncated: bool,
    pub closed: bool,
}

/// Handle is an index into [`MockStorage::files`].
#[derive(Debug)]
pub struct Handle(usize);

#[derive(Debug, Default)]
pub struct MockStorage {
    pub files: Vec<MockFile>,
    pub writes: usize,
    /// Fail the n-th `open` call (1-based).
    pub fail_open: Option<usize>,
    pub fail_preallocate: bool,
    /// Fail the n-th `write` call (1-based, counted across files).
    pub fail_write: Option<usize>,
    /// Make the n-th `write` call write one byte less than asked.
    pub short_write: Option<usize>,
    pub fail_truncate: bool,
    pub fail_close: bool,
    opens: usize,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.name.as_str()).collect()
    }
}

impl Storage for MockStorage {
    type File = Handle;
    type Error = MockError;

    fn open(&mut self, name: &str, created: FatDateTime) -> Result<Handle, MockError> {
        self.opens += 1;
        if self.fail_open == Some(self.opens) {
            return Err(MockError::Open);
        }
        self.files.push(MockFile {
            name: name.to_string(),
            created: Some(created),
            ..MockFile::default()
        });
        Ok(Handle(self.files.len() - 1))
    }

    fn preallocate(&mut self, file: &mut Handle, bytes: u64) -> Result<(), MockError> {
        if self.fail_preallocate {
            return Err(MockError::Preallocate);
        }
        self.files[file.0].preallocated = bytes;
        Ok(())
    }

    fn write(&mut self, file: &mut Handle, data: &[u8]) -> Result<usize, MockError> {
        self.writes += 1;
        if self.fail_write == Some(self.writes) {
            return Err(MockError::Write);
        }
        let n = if self.short_write == Some(self.writes) {
            data.len() - 1
        } else {
            data.len()
        };
        self.files[file.0].data.extend_from_slice(&data[..n]);
        Ok(n)
    }

    fn truncate(&mut self, file: &mut Handle) -> Result<(), MockError> {
        if self.fail_truncate {
            return Err(MockError::Truncate);
        }
        self.files[file.0].truncated = true;
        Ok(())
    }

    fn close(&mut self, file: Handle) -> Result<(), MockError> {
        if self.fail_close {
            return Err(MockError::Close);
        }
        self.files[file.0].closed = true;
        Ok(())
    }
}
