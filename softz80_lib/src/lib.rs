mod bus;
mod cpu;
pub mod memory;
mod registers;
mod z80;

pub use bus::Bus;
pub use cpu::{Cpu, CpuError};
pub use memory::{Memory, MemoryError, CANARY, MEMORY_SIZE};
pub use registers::Registers;
pub use z80::{Z80, CF, HF, NF, PF, SF, XF, YF, ZF};
