// SPDX-License-Identifier: Apache-2.0

//! Host call emulation for RISC-V guests running under a debugger
//!
//! A guest running inside the VM requests services from the debugger by
//! executing `ecall` with a host call number in `a7` and up to six arguments
//! in `a0..a5`. The debugger offers the call to each registered
//! [handler](syscalls::Syscalls) in turn; the first one that recognises the
//! number performs the request on the [host](host::Host) and leaves its result
//! in `a0`.
//!
//! # Calling convention
//!
//! * `a7`: host call number (see [`item::Number`])
//! * `a0..a5`: arguments; unused slots are passed as zero
//! * `a0`: result
//!
//! Pointers passed in arguments are guest addresses and are resolved against
//! guest [memory](machine::Machine). A pointer that does not resolve is a VM
//! error, not a result code.
//!
//! # Host call 9013
//!
//! `file_write(path, buf, size, 0, 0, 0)` persists `size` bytes starting at
//! `buf` under the NUL-terminated `path`. It returns `0` on success and `-1`
//! if the host could not write the file.

#![deny(clippy::all)]
#![warn(rust_2018_idioms)]

mod error;

pub mod guest;
pub mod host;
pub mod item;
pub mod machine;
pub mod programs;
pub mod syscalls;

pub use error::Error;

/// Result type returned by functionality exposed by this crate.
pub type Result<T> = core::result::Result<T, Error>;

/// The crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
