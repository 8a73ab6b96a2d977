use std::fmt;

use crate::{Bus, Registers};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CpuError {
    /// The core met an opcode it does not implement. `prefix` is 0x00 for
    /// the unprefixed table.
    UnsupportedOpcode { prefix: u8, opcode: u8, pc: u16 },
}

impl fmt::Display for CpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedOpcode { prefix: 0x00, opcode, pc } => {
                write!(f, "unsupported opcode 0x{opcode:02x} at #0x{pc:04x}")
            }
            Self::UnsupportedOpcode { prefix, opcode, pc } => {
                write!(
                    f,
                    "unsupported opcode 0x{prefix:02x} 0x{opcode:02x} at #0x{pc:04x}"
                )
            }
        }
    }
}

impl std::error::Error for CpuError {}

/*
 * Cpu
 * The seam between the harness and any Z80 execution engine. An engine owns
 * its register file and its cumulative t-state counter; the harness only
 * exchanges whole register snapshots with it and single-steps it until the
 * counter reaches a target.
 */
pub trait Cpu {
    /// Return all registers and the t-state counter to engine defaults.
    fn reset(&mut self);

    /// Execute exactly one instruction, add its cost to the cumulative
    /// t-state counter and return that cost.
    fn step(&mut self, bus: &mut dyn Bus) -> Result<u8, CpuError>;

    fn registers(&self) -> Registers;

    fn set_registers(&mut self, registers: &Registers);

    /// Cumulative t-states since the last reset.
    fn tstates(&self) -> u64;
}
