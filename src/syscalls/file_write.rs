// SPDX-License-Identifier: Apache-2.0

use super::{set_result, Syscalls};
use crate::host::Host;
use crate::item::Number;
use crate::machine::registers::{A0, A1, A2, A7};
use crate::machine::Machine;
use crate::Result;

use std::sync::Arc;

use log::{debug, warn};

/// `file_write(path, buf, size, 0, 0, 0)`
///
/// Creates or truncates the host file `path` and writes `size` bytes of guest
/// memory starting at `buf` to it. Leaves `0` in `a0` on success and `-1` if
/// the host refused the write. `a3..a5` pad the call to six arguments and are
/// ignored.
pub struct FileWriter {
    host: Arc<dyn Host>,
}

impl FileWriter {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host }
    }
}

impl<M: Machine> Syscalls<M> for FileWriter {
    fn initialize(&mut self, _machine: &mut M) -> Result<()> {
        Ok(())
    }

    fn ecall(&mut self, machine: &mut M) -> Result<bool> {
        if machine.register(A7) != Number::FileWrite as u64 {
            return Ok(false);
        }

        let path = machine.load_c_string(machine.register(A0))?;
        let path = String::from_utf8_lossy(&path);
        let data = machine.load_bytes(machine.register(A1), machine.register(A2))?;

        match self.host.file_write(&path, &data) {
            Ok(()) => {
                debug!("wrote {} bytes to {:?}", data.len(), path);
                set_result(machine, 0);
            }
            Err(e) => {
                warn!("failed to write {:?}: {}", path, e);
                set_result(machine, -1);
            }
        }
        Ok(true)
    }
}
