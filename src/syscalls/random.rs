// SPDX-License-Identifier: Apache-2.0

use super::{set_result, Syscalls};
use crate::host::Host;
use crate::item::Number;
use crate::machine::registers::A7;
use crate::machine::Machine;
use crate::Result;

use std::sync::Arc;

/// `random()`: 64 random bits from the host.
pub struct Random {
    host: Arc<dyn Host>,
}

impl Random {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host }
    }
}

impl<M: Machine> Syscalls<M> for Random {
    fn initialize(&mut self, _machine: &mut M) -> Result<()> {
        Ok(())
    }

    fn ecall(&mut self, machine: &mut M) -> Result<bool> {
        if machine.register(A7) != Number::Random as u64 {
            return Ok(false);
        }
        set_result(machine, self.host.random() as i64);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Memory;
    use crate::machine::registers::A0;
    use crate::machine::FlatMachine;

    #[test]
    fn random() {
        let mut machine = FlatMachine::new(0);
        let mut random = Random::new(Arc::new(Memory::default()));

        machine.set_register(A7, 9001);
        assert_eq!(random.ecall(&mut machine), Ok(false));

        machine.set_register(A7, 9002);
        let values: Vec<u64> = (0..4)
            .map(|_| {
                assert_eq!(random.ecall(&mut machine), Ok(true));
                machine.register(A0)
            })
            .collect();
        assert!(values.windows(2).any(|w| w[0] != w[1]));
    }
}
