// SPDX-License-Identifier: Apache-2.0

//! Guest machine state visible to host call handlers.

mod flat;
pub mod registers;

pub use flat::FlatMachine;

use crate::Result;

/// Memory size of a conventional RISC-V guest (4 MiB).
pub const DEFAULT_MEMORY_SIZE: usize = 4 << 20;

/// Register file and memory of a guest, as seen from the host.
pub trait Machine {
    /// Size of guest memory in bytes.
    fn memory_size(&self) -> u64;

    /// Reads integer register `idx` (`x0..x31`).
    fn register(&self, idx: usize) -> u64;

    /// Writes integer register `idx`. Writes to `x0` are discarded.
    fn set_register(&mut self, idx: usize, value: u64);

    /// Copies `len` bytes of guest memory starting at `addr`.
    fn load_bytes(&self, addr: u64, len: u64) -> Result<Vec<u8>>;

    /// Copies `bytes` into guest memory starting at `addr`.
    fn store_bytes(&mut self, addr: u64, bytes: &[u8]) -> Result<()>;

    /// Reads a NUL-terminated string starting at `addr`, without the terminator.
    fn load_c_string(&self, addr: u64) -> Result<Vec<u8>>;

    /// Reads a little-endian `u64` at `addr`.
    fn load_u64(&self, addr: u64) -> Result<u64> {
        let bytes = self.load_bytes(addr, 8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes);
        Ok(u64::from_le_bytes(buf))
    }

    /// Writes a little-endian `u64` at `addr`.
    fn store_u64(&mut self, addr: u64, value: u64) -> Result<()> {
        self.store_bytes(addr, &value.to_le_bytes())
    }
}
