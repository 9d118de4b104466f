// SPDX-License-Identifier: Apache-2.0

//! Guest side of the host call interface.
//!
//! [`Guest`] drives a [`Machine`] exactly the way compiled guest code would:
//! arguments are placed in guest memory and in `a0..a5`, the number in `a7`,
//! and the result is read back from `a0`.

use crate::item::Number;
use crate::machine::registers::{ARGUMENTS, A0, A7, SP};
use crate::machine::Machine;
use crate::syscalls::Dispatcher;
use crate::{Error, Result};

use libc::{STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use log::trace;

/// Guest memory below this address is never handed out, so that `0` stays
/// an invalid pointer.
pub const HEAP_START: u64 = 0x1000;

/// A running guest: machine state, the host call handlers and a bump
/// allocator over guest memory.
pub struct Guest<M> {
    machine: M,
    dispatcher: Dispatcher<M>,
    heap: u64,
}

impl<M: Machine> Guest<M> {
    /// Initializes all handlers and prepares the heap.
    pub fn new(mut machine: M, mut dispatcher: Dispatcher<M>) -> Result<Self> {
        dispatcher.initialize(&mut machine)?;
        machine.set_register(SP, machine.memory_size());
        Ok(Self {
            machine,
            dispatcher,
            heap: HEAP_START,
        })
    }

    pub fn machine(&self) -> &M {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut M {
        &mut self.machine
    }

    /// Number of host calls serviced so far.
    pub fn hostcalls(&self) -> u64 {
        self.dispatcher.served()
    }

    /// Tears the guest down, dropping its handlers.
    pub fn into_machine(self) -> M {
        self.machine
    }

    /// Reserves `len` bytes aligned to `align` (a power of two).
    pub fn alloc(&mut self, len: u64, align: u64) -> Result<u64> {
        debug_assert!(align.is_power_of_two());
        let fault = Error::MemOutOfBound {
            addr: self.heap,
            len,
        };
        let addr = self
            .heap
            .checked_add(align - 1)
            .map(|a| a & !(align - 1))
            .ok_or_else(|| fault.clone())?;
        let end = addr.checked_add(len).ok_or_else(|| fault.clone())?;
        if end > self.machine.memory_size() {
            return Err(fault);
        }
        self.heap = end;
        Ok(addr)
    }

    /// Copies `bytes` into freshly allocated guest memory.
    pub fn alloc_bytes(&mut self, bytes: &[u8]) -> Result<u64> {
        let addr = self.alloc(bytes.len() as u64, 1)?;
        self.machine.store_bytes(addr, bytes)?;
        Ok(addr)
    }

    /// Copies `s` and a NUL terminator into freshly allocated guest memory.
    pub fn alloc_c_string(&mut self, s: &str) -> Result<u64> {
        let addr = self.alloc(s.len() as u64 + 1, 1)?;
        self.machine.store_bytes(addr, s.as_bytes())?;
        self.machine.store_bytes(addr + s.len() as u64, &[0])?;
        Ok(addr)
    }

    /// Issues host call `num` with six arguments and returns `a0`.
    pub fn syscall(&mut self, num: impl Into<u64>, argv: [u64; 6]) -> Result<u64> {
        let num = num.into();
        for (idx, arg) in ARGUMENTS.into_iter().zip(argv) {
            self.machine.set_register(idx, arg);
        }
        self.machine.set_register(A7, num);
        self.dispatcher.ecall(&mut self.machine)?;
        let ret = self.machine.register(A0);
        trace!("syscall {num} returned {}", ret as i64);
        Ok(ret)
    }

    fn call(&mut self, num: Number, argv: [u64; 6]) -> Result<i64> {
        self.syscall(num, argv).map(|ret| ret as i64)
    }

    /// `file_write(path, ptr, size)`: `0` on success, `-1` on failure.
    pub fn file_write(&mut self, path: u64, ptr: u64, size: u64) -> Result<i64> {
        self.call(Number::FileWrite, [path, ptr, size, 0, 0, 0])
    }

    pub fn timestamp(&mut self) -> Result<u64> {
        self.syscall(Number::Timestamp, [0; 6])
    }

    pub fn random(&mut self) -> Result<u64> {
        self.syscall(Number::Random, [0; 6])
    }

    pub fn read_stream(&mut self, buf: u64, len_ptr: u64) -> Result<i64> {
        self.call(Number::ReadStream, [buf, len_ptr, 0, 0, 0, 0])
    }

    /// Returns a stream handle, `0` on failure.
    pub fn fopen(&mut self, path: u64, mode: u64) -> Result<u64> {
        self.syscall(Number::Fopen, [path, mode, 0, 0, 0, 0])
    }

    pub fn freopen(&mut self, path: u64, mode: u64, stream: u64) -> Result<u64> {
        self.syscall(Number::Freopen, [path, mode, stream, 0, 0, 0])
    }

    pub fn fread(&mut self, ptr: u64, size: u64, nitems: u64, stream: u64) -> Result<u64> {
        self.syscall(Number::Fread, [ptr, size, nitems, stream, 0, 0])
    }

    pub fn fwrite(&mut self, ptr: u64, size: u64, nitems: u64, stream: u64) -> Result<u64> {
        self.syscall(Number::Fwrite, [ptr, size, nitems, stream, 0, 0])
    }

    pub fn feof(&mut self, stream: u64) -> Result<i64> {
        self.call(Number::Feof, [stream, 0, 0, 0, 0, 0])
    }

    pub fn ferror(&mut self, stream: u64) -> Result<i64> {
        self.call(Number::Ferror, [stream, 0, 0, 0, 0, 0])
    }

    pub fn fgetc(&mut self, stream: u64) -> Result<i64> {
        self.call(Number::Fgetc, [stream, 0, 0, 0, 0, 0])
    }

    pub fn fclose(&mut self, stream: u64) -> Result<i64> {
        self.call(Number::Fclose, [stream, 0, 0, 0, 0, 0])
    }

    pub fn ftell(&mut self, stream: u64) -> Result<i64> {
        self.call(Number::Ftell, [stream, 0, 0, 0, 0, 0])
    }

    pub fn fseek(&mut self, stream: u64, offset: i64, whence: u64) -> Result<i64> {
        self.call(Number::Fseek, [stream, offset as u64, whence, 0, 0, 0])
    }

    pub fn read(&mut self, fd: u64, ptr: u64, count: u64) -> Result<i64> {
        self.call(Number::Read, [fd, ptr, count, 0, 0, 0])
    }

    pub fn write(&mut self, fd: u64, ptr: u64, count: u64) -> Result<i64> {
        self.call(Number::Write, [fd, ptr, count, 0, 0, 0])
    }

    pub fn close(&mut self, fd: u64) -> Result<i64> {
        self.call(Number::Close, [fd, 0, 0, 0, 0, 0])
    }

    /// Writes `s` to standard output. The scratch memory is released again.
    pub fn print(&mut self, s: &str) -> Result<i64> {
        let mark = self.heap;
        let ret = self
            .alloc_bytes(s.as_bytes())
            .and_then(|ptr| self.write(STDOUT_FILENO as u64, ptr, s.len() as u64));
        self.heap = mark;
        ret
    }

    /// Closes the standard descriptors, as a C runtime does on exit.
    pub fn exit(&mut self) -> Result<()> {
        for fd in [STDIN_FILENO, STDOUT_FILENO, STDERR_FILENO] {
            self.close(fd as u64)?;
        }
        Ok(())
    }
}
