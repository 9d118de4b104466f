// SPDX-License-Identifier: Apache-2.0

//! Host call handlers and their dispatcher.

mod file_operation;
mod file_stream;
mod file_write;
mod random;
mod stdio;
mod timestamp;

pub use file_operation::FileOperation;
pub use file_stream::FileStream;
pub use file_write::FileWriter;
pub use random::Random;
pub use stdio::Stdio;
pub use timestamp::Timestamp;

use crate::host::Host;
use crate::item::Hostcall;
use crate::machine::registers::{A0, A7};
use crate::machine::Machine;
use crate::{Error, Result};

use std::sync::Arc;

use log::{debug, trace};

/// A family of host calls.
pub trait Syscalls<M: Machine> {
    /// Called once before the guest starts.
    fn initialize(&mut self, machine: &mut M) -> Result<()>;

    /// Services the host call held in the registers of `machine`.
    ///
    /// Returns `Ok(false)` without touching the machine if the number in
    /// `a7` does not belong to this handler.
    fn ecall(&mut self, machine: &mut M) -> Result<bool>;
}

/// Leaves a signed result in `a0`.
#[inline]
pub(crate) fn set_result(machine: &mut impl Machine, value: i64) {
    machine.set_register(A0, value as u64);
}

/// Offers each host call to a list of handlers, first match wins.
pub struct Dispatcher<M> {
    handlers: Vec<Box<dyn Syscalls<M>>>,
    served: u64,
}

impl<M: Machine> Default for Dispatcher<M> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
            served: 0,
        }
    }
}

impl<M: Machine> Dispatcher<M> {
    /// The handlers a debugging session installs.
    ///
    /// `stream` is the content fed to the guest by the `read_stream` call.
    pub fn debugger(host: Arc<dyn Host>, stream: Option<Vec<u8>>) -> Self {
        let mut dispatcher = Self::default();
        dispatcher.push(FileOperation::new(host.clone()));
        dispatcher.push(FileStream::new(stream));
        dispatcher.push(FileWriter::new(host.clone()));
        dispatcher.push(Random::new(host.clone()));
        dispatcher.push(Stdio::new(host.clone()));
        dispatcher.push(Timestamp::new(host));
        dispatcher
    }

    /// Appends a handler. Earlier handlers take precedence.
    pub fn push(&mut self, handler: impl Syscalls<M> + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Number of host calls serviced so far.
    pub fn served(&self) -> u64 {
        self.served
    }

    pub fn initialize(&mut self, machine: &mut M) -> Result<()> {
        self.handlers
            .iter_mut()
            .try_for_each(|handler| handler.initialize(machine))
    }

    /// Services the host call held in the registers of `machine`.
    pub fn ecall(&mut self, machine: &mut M) -> Result<Hostcall> {
        let call = Hostcall::capture(machine);
        for handler in self.handlers.iter_mut() {
            if handler.ecall(machine)? {
                self.served += 1;
                let call = call.complete(machine);
                debug!("{call}");
                return Ok(call);
            }
        }

        trace!("no handler for {call}");
        Err(Error::InvalidEcall(machine.register(A7)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Memory;
    use crate::item::Number;
    use crate::machine::registers::{A1, A2};
    use crate::machine::FlatMachine;

    struct Counter(u64, usize);

    impl<M: Machine> Syscalls<M> for Counter {
        fn initialize(&mut self, _: &mut M) -> Result<()> {
            self.1 += 1;
            Ok(())
        }

        fn ecall(&mut self, machine: &mut M) -> Result<bool> {
            if machine.register(A7) != self.0 {
                return Ok(false);
            }
            set_result(machine, self.0 as i64 + 1);
            Ok(true)
        }
    }

    #[test]
    fn first_match_wins() {
        let mut machine = FlatMachine::new(0);
        let mut dispatcher = Dispatcher::default();
        dispatcher.push(Counter(7, 0));
        dispatcher.push(Counter(8, 0));
        dispatcher.push(FileWriter::new(Arc::new(Memory::default())));
        dispatcher.initialize(&mut machine).unwrap();

        machine.set_register(A7, 8);
        assert_eq!(dispatcher.ecall(&mut machine).unwrap().ret, 9);
        machine.set_register(A7, 7);
        assert_eq!(dispatcher.ecall(&mut machine).unwrap().ret, 8);
        assert_eq!(dispatcher.served(), 2);
    }

    #[test]
    fn unknown_number() {
        let mut machine = FlatMachine::new(0);
        let mut dispatcher = Dispatcher::debugger(Arc::new(Memory::default()), None);
        machine.set_register(A7, 9999);
        machine.set_register(A0, 5);
        assert_eq!(
            dispatcher.ecall(&mut machine),
            Err(Error::InvalidEcall(9999))
        );
        assert_eq!(machine.register(A0), 5);
        assert_eq!(dispatcher.served(), 0);
    }

    #[test]
    fn debugger_set_handles_every_number() {
        let host = Arc::new(Memory::default());
        let mut machine = FlatMachine::new(0x1000);
        machine.store_bytes(0x100, b"f\0r\0").unwrap();
        let mut dispatcher = Dispatcher::debugger(host, Some(Vec::new()));
        dispatcher.initialize(&mut machine).unwrap();

        for number in Number::ALL {
            machine.set_register(A7, number.into());
            machine.set_register(A0, 0x100);
            machine.set_register(A1, 0x102);
            machine.set_register(A2, 0);
            let call = dispatcher.ecall(&mut machine).unwrap();
            assert_eq!(call.number(), Some(number));
        }
        assert_eq!(dispatcher.served(), Number::ALL.len() as u64);
    }
}
