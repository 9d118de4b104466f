// SPDX-License-Identifier: Apache-2.0

use super::{Host, OpenMode, Stream};

use std::collections::HashMap;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use libc::{EBADF, EFBIG};

/// Largest file the memory host stores by default (64 MiB).
pub const MAX_FILE_SIZE: usize = 64 << 20;

type Files = Arc<Mutex<HashMap<String, Vec<u8>>>>;

#[inline]
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A host keeping files in a key/value store and capturing guest output.
///
/// Nothing leaves the process, which makes it suitable for sandboxed runs and
/// for inspecting what a guest did.
pub struct Memory {
    files: Files,
    output: Mutex<Vec<String>>,
    limit: usize,
}

impl Default for Memory {
    fn default() -> Self {
        Self::with_limit(MAX_FILE_SIZE)
    }
}

impl Memory {
    /// Creates a host whose files may not grow beyond `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            files: Files::default(),
            output: Mutex::default(),
            limit,
        }
    }

    /// Stores `data` under `name`, replacing any previous content.
    pub fn insert(&self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        lock(&self.files).insert(name.into(), data.into());
    }

    /// Returns a copy of the file stored under `name`.
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        lock(&self.files).get(name).cloned()
    }

    /// Names of all stored files, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = lock(&self.files).keys().cloned().collect();
        names.sort();
        names
    }

    /// Lines printed by the guest so far.
    pub fn output(&self) -> Vec<String> {
        lock(&self.output).clone()
    }
}

impl Host for Memory {
    #[inline]
    fn name(&self) -> &'static str {
        "memory"
    }

    fn file_read(&self, name: &str) -> io::Result<Vec<u8>> {
        self.get(name)
            .ok_or_else(|| io::Error::new(ErrorKind::NotFound, name.to_string()))
    }

    fn file_write(&self, name: &str, data: &[u8]) -> io::Result<()> {
        self.insert(name, data);
        Ok(())
    }

    fn open(&self, name: &str, mode: OpenMode) -> io::Result<Box<dyn Stream>> {
        let mut files = lock(&self.files);
        match files.get_mut(name) {
            Some(_) if mode.exclusive => {
                return Err(io::Error::new(ErrorKind::AlreadyExists, name.to_string()))
            }
            Some(data) if mode.truncate => data.clear(),
            Some(_) => {}
            None if mode.create => {
                files.insert(name.to_string(), Vec::new());
            }
            None => return Err(io::Error::new(ErrorKind::NotFound, name.to_string())),
        }

        Ok(Box::new(MemoryFile {
            files: self.files.clone(),
            name: name.to_string(),
            mode,
            pos: 0,
            limit: self.limit,
        }))
    }

    fn println(&self, line: &str) {
        lock(&self.output).push(line.to_string());
    }

    fn timestamp(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default()
    }
}

/// Stream over one entry of a [`Memory`] host.
///
/// Reads and writes go straight to the shared store, so other streams and
/// [`Memory::get`] observe them immediately.
struct MemoryFile {
    files: Files,
    name: String,
    mode: OpenMode,
    pos: u64,
    limit: usize,
}

impl MemoryFile {
    fn with_data<T>(&self, f: impl FnOnce(&mut Vec<u8>) -> T) -> T {
        let mut files = lock(&self.files);
        f(files.entry(self.name.clone()).or_default())
    }
}

impl Read for MemoryFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.mode.read {
            return Err(io::Error::from_raw_os_error(EBADF));
        }
        let pos = self.pos;
        let n = self.with_data(|data| {
            let start = (pos as usize).min(data.len());
            let n = buf.len().min(data.len() - start);
            buf[..n].copy_from_slice(&data[start..start + n]);
            n
        });
        self.pos += n as u64;
        Ok(n)
    }
}

impl Write for MemoryFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.mode.writable() {
            return Err(io::Error::from_raw_os_error(EBADF));
        }
        if buf.is_empty() {
            return Ok(0);
        }
        let (append, pos, limit) = (self.mode.append, self.pos, self.limit);
        let end = self.with_data(|data| {
            let start = match append {
                true => data.len(),
                false => usize::try_from(pos).unwrap_or(usize::MAX),
            };
            if start >= limit {
                return Err(io::Error::from_raw_os_error(EFBIG));
            }
            let end = start + buf.len().min(limit - start);
            if data.len() < end {
                data.resize(end, 0);
            }
            data[start..end].copy_from_slice(&buf[..end - start]);
            Ok((start, end))
        });
        let (start, end) = end?;
        self.pos = end as u64;
        Ok(end - start)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for MemoryFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = self.with_data(|data| data.len() as u64);
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(offset) => self.pos.checked_add_signed(offset),
            SeekFrom::End(offset) => len.checked_add_signed(offset),
        };
        match target {
            Some(target) => {
                self.pos = target;
                Ok(target)
            }
            None => Err(io::Error::new(
                ErrorKind::InvalidInput,
                "seek to a negative offset",
            )),
        }
    }
}
