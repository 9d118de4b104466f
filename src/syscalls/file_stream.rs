// SPDX-License-Identifier: Apache-2.0

use super::{set_result, Syscalls};
use crate::item::Number;
use crate::machine::registers::{A0, A1, A7};
use crate::machine::Machine;
use crate::Result;

use log::{debug, warn};

/// `read_stream(buf, len_ptr)`: feeds the debugger's input file to the guest.
///
/// `*len_ptr` holds the capacity of `buf` on entry and the number of bytes
/// copied on return. Returns `0` while data is being delivered, `1` once the
/// input is exhausted and `-1` when the debugger was started without input.
pub struct FileStream {
    content: Option<Vec<u8>>,
    offset: usize,
}

impl FileStream {
    pub fn new(content: Option<Vec<u8>>) -> Self {
        Self { content, offset: 0 }
    }
}

impl<M: Machine> Syscalls<M> for FileStream {
    fn initialize(&mut self, _machine: &mut M) -> Result<()> {
        Ok(())
    }

    fn ecall(&mut self, machine: &mut M) -> Result<bool> {
        if machine.register(A7) != Number::ReadStream as u64 {
            return Ok(false);
        }

        let content = match self.content.as_deref() {
            Some(content) => content,
            None => {
                warn!("read_stream called without an input file");
                set_result(machine, -1);
                return Ok(true);
            }
        };

        let (buf, len_ptr) = (machine.register(A0), machine.register(A1));
        let capacity = machine.load_u64(len_ptr)?;
        let remaining = &content[self.offset..];
        if remaining.is_empty() {
            machine.store_u64(len_ptr, 0)?;
            set_result(machine, 1);
            return Ok(true);
        }

        let len = remaining.len().min(capacity.min(usize::MAX as u64) as usize);
        machine.store_bytes(buf, &remaining[..len])?;
        machine.store_u64(len_ptr, len as u64)?;
        self.offset += len;
        debug!("streamed {} bytes, {} left", len, content.len() - self.offset);

        set_result(machine, 0);
        Ok(true)
    }
}
