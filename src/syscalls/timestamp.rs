// SPDX-License-Identifier: Apache-2.0

use super::{set_result, Syscalls};
use crate::host::Host;
use crate::item::Number;
use crate::machine::registers::A7;
use crate::machine::Machine;
use crate::Result;

use std::sync::Arc;

/// `timestamp()`: host wall-clock time in nanoseconds.
pub struct Timestamp {
    host: Arc<dyn Host>,
}

impl Timestamp {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host }
    }
}

impl<M: Machine> Syscalls<M> for Timestamp {
    fn initialize(&mut self, _machine: &mut M) -> Result<()> {
        Ok(())
    }

    fn ecall(&mut self, machine: &mut M) -> Result<bool> {
        if machine.register(A7) != Number::Timestamp as u64 {
            return Ok(false);
        }
        set_result(machine, self.host.timestamp() as i64);
        Ok(true)
    }
}
