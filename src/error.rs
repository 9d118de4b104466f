// SPDX-License-Identifier: Apache-2.0

use std::fmt;

/// A fault that stops the guest.
///
/// Failures of the host itself (a file that cannot be opened, a write that is
/// rejected) are never reported through this type. They are handed back to
/// the guest as result codes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Guest memory access outside of the machine's memory.
    MemOutOfBound { addr: u64, len: u64 },

    /// A C string ran into the end of guest memory without a terminator.
    Unterminated { addr: u64 },

    /// No handler recognised the host call number.
    InvalidEcall(u64),

    /// A host call asked to move more data than the debugger allows.
    HostcallLimit { num: u64, len: u64 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MemOutOfBound { addr, len } => {
                write!(f, "memory out of bound: {len} bytes at {addr:#x}")
            }
            Self::Unterminated { addr } => {
                write!(f, "unterminated string at {addr:#x}")
            }
            Self::InvalidEcall(num) => write!(f, "invalid ecall {num}"),
            Self::HostcallLimit { num, len } => {
                write!(f, "host call {num} exceeds the transfer limit ({len} bytes)")
            }
        }
    }
}

impl std::error::Error for Error {}
