// SPDX-License-Identifier: Apache-2.0

use super::registers::{REGISTER_COUNT, ZERO};
use super::{Machine, DEFAULT_MEMORY_SIZE};
use crate::{Error, Result};

use core::ops::Range;

/// A guest with a single contiguous memory region starting at address 0.
#[derive(Clone, Debug)]
pub struct FlatMachine {
    registers: [u64; REGISTER_COUNT],
    memory: Vec<u8>,
}

impl Default for FlatMachine {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_SIZE)
    }
}

impl FlatMachine {
    /// Creates a machine with `memory_size` bytes of zeroed memory.
    pub fn new(memory_size: usize) -> Self {
        Self {
            registers: [0; REGISTER_COUNT],
            memory: vec![0; memory_size],
        }
    }

    /// Validates `addr..addr + len` and converts it to an index range.
    #[inline]
    fn range(&self, addr: u64, len: u64) -> Result<Range<usize>> {
        let fault = Error::MemOutOfBound { addr, len };
        let end = addr.checked_add(len).ok_or_else(|| fault.clone())?;
        if end > self.memory_size() {
            return Err(fault);
        }
        Ok(addr as usize..end as usize)
    }
}

impl Machine for FlatMachine {
    #[inline]
    fn memory_size(&self) -> u64 {
        self.memory.len() as u64
    }

    #[inline]
    fn register(&self, idx: usize) -> u64 {
        self.registers[idx]
    }

    #[inline]
    fn set_register(&mut self, idx: usize, value: u64) {
        if idx != ZERO {
            self.registers[idx] = value;
        }
    }

    fn load_bytes(&self, addr: u64, len: u64) -> Result<Vec<u8>> {
        let range = self.range(addr, len)?;
        Ok(self.memory[range].to_vec())
    }

    fn store_bytes(&mut self, addr: u64, bytes: &[u8]) -> Result<()> {
        let range = self.range(addr, bytes.len() as u64)?;
        self.memory[range].copy_from_slice(bytes);
        Ok(())
    }

    fn load_c_string(&self, addr: u64) -> Result<Vec<u8>> {
        let start = self.range(addr, 0)?.start;
        match self.memory[start..].iter().position(|b| *b == 0) {
            Some(len) => Ok(self.memory[start..start + len].to_vec()),
            None => Err(Error::Unterminated { addr }),
        }
    }
}
