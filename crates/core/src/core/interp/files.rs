//! Host files opened by the program.
//!
//! Descriptors 0, 1 and 2 are the console; user files start at
//! [`FIRST_USER_FD`] and are handed out in increasing order. Relative names
//! resolve against the directory of the root source file.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::common::constants::FIRST_USER_FD;

/// Open mode selected by the flags argument of the open syscall.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenMode {
    /// Flags `0`.
    Read,
    /// Flags `1`: create or truncate.
    Write,
    /// Flags `9`: create or append.
    Append,
}

impl OpenMode {
    /// Maps the syscall flags; any other value is rejected.
    pub const fn from_flags(flags: i32) -> Option<Self> {
        match flags {
            0 => Some(Self::Read),
            1 => Some(Self::Write),
            9 => Some(Self::Append),
            _ => None,
        }
    }
}

/// Descriptor table of one run.
#[derive(Debug)]
pub struct FileTable {
    base: PathBuf,
    next: i32,
    open: BTreeMap<i32, File>,
}

impl FileTable {
    /// Creates an empty table resolving relative names against `base`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            next: FIRST_USER_FD,
            open: BTreeMap::new(),
        }
    }

    /// Opens `name`.
    ///
    /// # Returns
    ///
    /// The new descriptor, or `-1` when the flags are unknown or the host refuses.
    pub fn open(&mut self, name: &str, flags: i32) -> i32 {
        let Some(mode) = OpenMode::from_flags(flags) else {
            return -1;
        };
        let path = self.resolve(name);
        let mut options = OpenOptions::new();
        let _ = match mode {
            OpenMode::Read => options.read(true),
            OpenMode::Write => options.write(true).create(true).truncate(true),
            OpenMode::Append => options.append(true).create(true),
        };
        match options.open(&path) {
            Ok(file) => {
                let fd = self.next;
                self.next += 1;
                let _ = self.open.insert(fd, file);
                debug!(fd, path = %path.display(), ?mode, "file opened");
                fd
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "open failed");
                -1
            }
        }
    }

    /// Reads up to `len` bytes from `fd`; `None` for an unknown descriptor or a host error.
    pub fn read(&mut self, fd: i32, len: usize) -> Option<Vec<u8>> {
        let file = self.open.get_mut(&fd)?;
        let mut buf = vec![0; len];
        let n = file.read(&mut buf).ok()?;
        buf.truncate(n);
        Some(buf)
    }

    /// Writes `data` to `fd`; returns the byte count, or `None` on failure.
    pub fn write(&mut self, fd: i32, data: &[u8]) -> Option<usize> {
        let file = self.open.get_mut(&fd)?;
        file.write_all(data).ok()?;
        Some(data.len())
    }

    /// Closes `fd`; closing an unknown descriptor does nothing.
    pub fn close(&mut self, fd: i32) {
        if self.open.remove(&fd).is_some() {
            debug!(fd, "file closed");
        }
    }

    /// Closes every user file.
    pub fn close_all(&mut self) {
        self.open.clear();
    }

    /// True if `fd` names an open user file.
    pub fn is_open(&self, fd: i32) -> bool {
        self.open.contains_key(&fd)
    }

    fn resolve(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        }
    }
}
