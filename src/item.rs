// SPDX-License-Identifier: Apache-2.0

//! Host call definitions

use crate::machine::registers::{ARGUMENTS, A0, A7};
use crate::machine::Machine;

use core::convert::TryFrom;
use core::fmt;
use libc::{c_int, EINVAL};

/// A host call as seen in the guest registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hostcall {
    /// The host call number, taken from `a7`.
    pub num: u64,

    /// The argument vector, taken from `a0..a5`.
    pub argv: [u64; 6],

    /// The result, as left in `a0` after the call was serviced.
    pub ret: u64,
}

impl Hostcall {
    /// Snapshots the request currently held in the guest registers.
    pub fn capture(machine: &impl Machine) -> Self {
        Self {
            num: machine.register(A7),
            argv: ARGUMENTS.map(|idx| machine.register(idx)),
            ret: 0,
        }
    }

    /// Records the result the handler left in `a0`.
    pub fn complete(mut self, machine: &impl Machine) -> Self {
        self.ret = machine.register(A0);
        self
    }

    /// Known name of the host call, if any.
    pub fn number(&self) -> Option<Number> {
        Number::try_from(self.num).ok()
    }
}

impl fmt::Display for Hostcall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.number() {
            Some(number) => write!(f, "{number}")?,
            None => write!(f, "{}", self.num)?,
        }
        let [a0, a1, a2, a3, a4, a5] = self.argv;
        write!(
            f,
            "({a0:#x}, {a1:#x}, {a2:#x}, {a3:#x}, {a4:#x}, {a5:#x}) = {}",
            self.ret as i64
        )
    }
}

/// Host call numbers serviced by the debugger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum Number {
    Close = 57,
    Read = 63,
    Write = 64,

    ReadStream = 9000,
    Timestamp = 9001,
    Random = 9002,
    Fopen = 9003,
    Freopen = 9004,
    Fread = 9005,
    Feof = 9006,
    Ferror = 9007,
    Fgetc = 9008,
    Fclose = 9009,
    Ftell = 9010,
    Fseek = 9011,
    Fwrite = 9012,
    FileWrite = 9013,
}

impl Number {
    pub const ALL: [Number; 17] = [
        Number::Close,
        Number::Read,
        Number::Write,
        Number::ReadStream,
        Number::Timestamp,
        Number::Random,
        Number::Fopen,
        Number::Freopen,
        Number::Fread,
        Number::Feof,
        Number::Ferror,
        Number::Fgetc,
        Number::Fclose,
        Number::Ftell,
        Number::Fseek,
        Number::Fwrite,
        Number::FileWrite,
    ];

    /// Name of the call as it appears in guest headers.
    pub fn name(self) -> &'static str {
        match self {
            Number::Close => "close",
            Number::Read => "read",
            Number::Write => "write",
            Number::ReadStream => "read_stream",
            Number::Timestamp => "timestamp",
            Number::Random => "random",
            Number::Fopen => "fopen",
            Number::Freopen => "freopen",
            Number::Fread => "fread",
            Number::Feof => "feof",
            Number::Ferror => "ferror",
            Number::Fgetc => "fgetc",
            Number::Fclose => "fclose",
            Number::Ftell => "ftell",
            Number::Fseek => "fseek",
            Number::Fwrite => "fwrite",
            Number::FileWrite => "file_write",
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u64> for Number {
    type Error = c_int;

    #[inline]
    fn try_from(num: u64) -> Result<Self, Self::Error> {
        Number::ALL
            .into_iter()
            .find(|n| *n as u64 == num)
            .ok_or(EINVAL)
    }
}

impl From<Number> for u64 {
    #[inline]
    fn from(num: Number) -> Self {
        num as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::registers::{A1, A2};
    use crate::machine::FlatMachine;

    #[test]
    fn number_try_from() {
        for (v, expected) in [
            (57u64, Ok(Number::Close)),
            (64, Ok(Number::Write)),
            (9000, Ok(Number::ReadStream)),
            (9012, Ok(Number::Fwrite)),
            (9013, Ok(Number::FileWrite)),
            (0, Err(EINVAL)),
            (9014, Err(EINVAL)),
            (u64::MAX, Err(EINVAL)),
        ] {
            assert_eq!(Number::try_from(v), expected, "Invalid mapping for {v}");
        }
    }

    #[test]
    fn numbers_are_unique() {
        for (i, a) in Number::ALL.iter().enumerate() {
            for b in &Number::ALL[i + 1..] {
                assert_ne!(*a as u64, *b as u64);
                assert_ne!(a.name(), b.name());
            }
        }
    }

    #[test]
    fn capture() {
        let mut machine = FlatMachine::new(0);
        machine.set_register(A7, 9013);
        machine.set_register(A0, 0x1000);
        machine.set_register(A1, 0x2000);
        machine.set_register(A2, 13);

        let call = Hostcall::capture(&machine);
        assert_eq!(
            call,
            Hostcall {
                num: 9013,
                argv: [0x1000, 0x2000, 13, 0, 0, 0],
                ret: 0,
            }
        );

        machine.set_register(A0, -1i64 as u64);
        let call = call.complete(&machine);
        assert_eq!(
            call.to_string(),
            "file_write(0x1000, 0x2000, 0xd, 0x0, 0x0, 0x0) = -1"
        );
    }
}
