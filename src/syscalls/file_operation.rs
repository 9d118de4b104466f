// SPDX-License-Identifier: Apache-2.0

use super::{set_result, Syscalls};
use crate::host::{Host, OpenMode, Stream};
use crate::item::Number;
use crate::machine::registers::{A0, A1, A2, A3, A7};
use crate::machine::Machine;
use crate::{Error, Result};

use std::collections::HashMap;
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use log::{trace, warn};

/// Largest transfer a single `fread`/`fwrite` may request.
pub const MAX_TRANSFER: u64 = 3 * 1024 * 1024;

/// C `EOF`
const EOF: i64 = -1;

struct Handle {
    stream: Box<dyn Stream>,
    eof: bool,
    error: bool,
}

impl Handle {
    fn new(stream: Box<dyn Stream>) -> Self {
        Self {
            stream,
            eof: false,
            error: false,
        }
    }

    /// Reads until `buf` is full, end of file or an error.
    fn fill(&mut self, buf: &mut [u8]) -> usize {
        let mut filled = 0;
        while filled < buf.len() {
            match self.stream.read(&mut buf[filled..]) {
                Ok(0) => {
                    self.eof = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    trace!("read failed: {e}");
                    self.error = true;
                    break;
                }
            }
        }
        filled
    }

    /// Writes as much of `data` as the stream accepts.
    fn drain(&mut self, data: &[u8]) -> usize {
        let mut written = 0;
        while written < data.len() {
            match self.stream.write(&data[written..]) {
                Ok(0) => {
                    self.error = true;
                    break;
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    trace!("write failed: {e}");
                    self.error = true;
                    break;
                }
            }
        }
        written
    }
}

/// C stdio file access on host files (`fopen` .. `fwrite`).
///
/// Streams are named by non-zero handles owned by this handler; `0` stands
/// for the null `FILE *`. Streams still open when the handler is dropped are
/// closed.
pub struct FileOperation {
    host: Arc<dyn Host>,
    handles: HashMap<u64, Handle>,
    next: u64,
}

impl FileOperation {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self {
            host,
            handles: HashMap::new(),
            next: 1,
        }
    }

    /// Number of streams currently open.
    pub fn open_streams(&self) -> usize {
        self.handles.len()
    }

    fn open(&self, path: &[u8], mode: &[u8]) -> Option<Box<dyn Stream>> {
        let path = String::from_utf8_lossy(path);
        let mode = match OpenMode::parse(mode) {
            Some(mode) => mode,
            None => {
                warn!("invalid mode {:?} for {:?}", String::from_utf8_lossy(mode), path);
                return None;
            }
        };

        self.host
            .open(&path, mode)
            .map_err(|e| warn!("failed to open {:?}: {}", path, e))
            .ok()
    }

    fn fopen(&mut self, path: &[u8], mode: &[u8]) -> i64 {
        match self.open(path, mode) {
            Some(stream) => {
                let handle = self.next;
                self.next += 1;
                self.handles.insert(handle, Handle::new(stream));
                handle as i64
            }
            None => 0,
        }
    }

    fn freopen(&mut self, path: &[u8], mode: &[u8], handle: u64) -> i64 {
        if self.handles.remove(&handle).is_none() {
            return 0;
        }
        match self.open(path, mode) {
            Some(stream) => {
                self.handles.insert(handle, Handle::new(stream));
                handle as i64
            }
            None => 0,
        }
    }

    fn fread(&mut self, machine: &mut impl Machine, argv: [u64; 4]) -> Result<i64> {
        let [ptr, size, nitems, handle] = argv;
        let total = transfer_len(Number::Fread, size, nitems)?;
        let handle = match self.handles.get_mut(&handle) {
            Some(handle) if total > 0 => handle,
            _ => return Ok(0),
        };

        let mut buf = vec![0u8; total as usize];
        let filled = handle.fill(&mut buf) as u64;
        let items = filled / size;
        machine.store_bytes(ptr, &buf[..(items * size) as usize])?;
        Ok(items as i64)
    }

    fn fwrite(&mut self, machine: &mut impl Machine, argv: [u64; 4]) -> Result<i64> {
        let [ptr, size, nitems, handle] = argv;
        let total = transfer_len(Number::Fwrite, size, nitems)?;
        let handle = match self.handles.get_mut(&handle) {
            Some(handle) if total > 0 => handle,
            _ => return Ok(0),
        };

        let data = machine.load_bytes(ptr, total)?;
        let written = handle.drain(&data) as u64;
        Ok((written / size) as i64)
    }

    fn fgetc(&mut self, handle: u64) -> i64 {
        let handle = match self.handles.get_mut(&handle) {
            Some(handle) => handle,
            None => return EOF,
        };
        let mut byte = [0u8; 1];
        match handle.fill(&mut byte) {
            1 => byte[0] as i64,
            _ => EOF,
        }
    }

    fn fclose(&mut self, handle: u64) -> i64 {
        match self.handles.remove(&handle) {
            Some(mut handle) => match handle.stream.flush() {
                Ok(()) => 0,
                Err(_) => EOF,
            },
            None => EOF,
        }
    }

    fn ftell(&mut self, handle: u64) -> i64 {
        self.handles
            .get_mut(&handle)
            .and_then(|h| h.stream.stream_position().ok())
            .map_or(-1, |pos| pos as i64)
    }

    fn fseek(&mut self, handle: u64, offset: i64, whence: u64) -> i64 {
        let handle = match self.handles.get_mut(&handle) {
            Some(handle) => handle,
            None => return -1,
        };
        let pos = match (whence, offset) {
            (0, offset) if offset >= 0 => SeekFrom::Start(offset as u64),
            (1, offset) => SeekFrom::Current(offset),
            (2, offset) => SeekFrom::End(offset),
            _ => return -1,
        };
        match handle.stream.seek(pos) {
            Ok(_) => {
                handle.eof = false;
                0
            }
            Err(_) => -1,
        }
    }

    fn flag(&self, handle: u64, f: impl Fn(&Handle) -> bool) -> i64 {
        self.handles.get(&handle).map_or(0, |h| f(h) as i64)
    }
}

/// `size * nitems`, refusing transfers larger than [`MAX_TRANSFER`].
fn transfer_len(num: Number, size: u64, nitems: u64) -> Result<u64> {
    match size.checked_mul(nitems) {
        Some(total) if total <= MAX_TRANSFER => Ok(total),
        total => Err(Error::HostcallLimit {
            num: num.into(),
            len: total.unwrap_or(u64::MAX),
        }),
    }
}

impl<M: Machine> Syscalls<M> for FileOperation {
    fn initialize(&mut self, _machine: &mut M) -> Result<()> {
        Ok(())
    }

    fn ecall(&mut self, machine: &mut M) -> Result<bool> {
        let num = match Number::try_from(machine.register(A7)) {
            Ok(num) => num,
            Err(_) => return Ok(false),
        };
        let argv = [A0, A1, A2, A3].map(|idx| machine.register(idx));
        let [arg0, arg1, arg2, _] = argv;

        let ret = match num {
            Number::Fopen => {
                let path = machine.load_c_string(arg0)?;
                let mode = machine.load_c_string(arg1)?;
                self.fopen(&path, &mode)
            }
            Number::Freopen => {
                let path = machine.load_c_string(arg0)?;
                let mode = machine.load_c_string(arg1)?;
                self.freopen(&path, &mode, arg2)
            }
            Number::Fread => self.fread(machine, argv)?,
            Number::Feof => self.flag(arg0, |h| h.eof),
            Number::Ferror => self.flag(arg0, |h| h.error),
            Number::Fgetc => self.fgetc(arg0),
            Number::Fclose => self.fclose(arg0),
            Number::Ftell => self.ftell(arg0),
            Number::Fseek => self.fseek(arg0, arg1 as i64, arg2),
            Number::Fwrite => self.fwrite(machine, argv)?,
            _ => return Ok(false),
        };

        set_result(machine, ret);
        Ok(true)
    }
}
