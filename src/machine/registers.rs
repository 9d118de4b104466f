// SPDX-License-Identifier: Apache-2.0

//! RISC-V integer register indices (ABI names).

pub const ZERO: usize = 0;
pub const SP: usize = 2;

pub const A0: usize = 10;
pub const A1: usize = 11;
pub const A2: usize = 12;
pub const A3: usize = 13;
pub const A4: usize = 14;
pub const A5: usize = 15;
pub const A7: usize = 17;

/// Number of integer registers.
pub const REGISTER_COUNT: usize = 32;

/// Argument registers of a host call, in order.
pub const ARGUMENTS: [usize; 6] = [A0, A1, A2, A3, A4, A5];
