// SPDX-License-Identifier: Apache-2.0

use super::{set_result, Syscalls};
use crate::host::Host;
use crate::item::Number;
use crate::machine::registers::{A0, A1, A2, A7};
use crate::machine::Machine;
use crate::Result;

use std::sync::Arc;

use libc::{EBADF, STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};

/// `read`, `write` and `close` on the standard descriptors.
///
/// Guest output is collected into lines and printed through the host. A
/// trailing partial line is printed when the handler is dropped. Standard
/// input is always at end of file.
pub struct Stdio {
    host: Arc<dyn Host>,
    line: Vec<u8>,
}

impl Stdio {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self {
            host,
            line: Vec::new(),
        }
    }

    /// Prints whatever partial line is pending.
    pub fn flush(&mut self) {
        if !self.line.is_empty() {
            self.host.println(&String::from_utf8_lossy(&self.line));
            self.line.clear();
        }
    }

    fn print(&mut self, data: &[u8]) {
        let mut lines = data.split(|b| *b == b'\n');
        let tail = lines.next_back().unwrap_or_default();
        for line in lines {
            self.line.extend_from_slice(line);
            self.host.println(&String::from_utf8_lossy(&self.line));
            self.line.clear();
        }
        self.line.extend_from_slice(tail);
    }
}

impl Drop for Stdio {
    fn drop(&mut self) {
        self.flush();
    }
}

impl<M: Machine> Syscalls<M> for Stdio {
    fn initialize(&mut self, _machine: &mut M) -> Result<()> {
        Ok(())
    }

    fn ecall(&mut self, machine: &mut M) -> Result<bool> {
        let num = match Number::try_from(machine.register(A7)) {
            Ok(num @ (Number::Close | Number::Read | Number::Write)) => num,
            _ => return Ok(false),
        };
        let fd = i32::try_from(machine.register(A0) as i64).unwrap_or(-1);

        let ret = match (num, fd) {
            (Number::Write, STDOUT_FILENO | STDERR_FILENO) => {
                let count = machine.register(A2);
                let data = machine.load_bytes(machine.register(A1), count)?;
                self.print(&data);
                count as i64
            }
            (Number::Read, STDIN_FILENO) => 0,
            (Number::Close, STDIN_FILENO | STDOUT_FILENO | STDERR_FILENO) => 0,
            _ => -EBADF as i64,
        };

        set_result(machine, ret);
        Ok(true)
    }
}
