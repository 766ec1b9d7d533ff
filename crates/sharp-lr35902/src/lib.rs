//! Sharp LR35902 CPU, the Game Boy's Z80/8080 hybrid.
//!
//! The core is instruction-stepped rather than cycle-stepped. Callers fetch
//! an opcode and its operand bytes, look up the cost in [`opcodes`], then
//! call [`Lr35902::execute`]. Cycle accounting lives with the machine.

mod cpu;
mod error;
mod flags;
pub mod opcodes;
mod registers;

pub use cpu::{Cond, Instruction, Lr35902, Reg8, Reg16, decode};
pub use error::ExecError;
pub use flags::{CF, HF, NF, ZF};
pub use registers::Registers;
