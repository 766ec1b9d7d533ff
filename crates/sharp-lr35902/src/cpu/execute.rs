//! Instruction execution.
//!
//! Flag behaviour follows the documented quirks of this core rather than
//! textbook LR35902 results:
//! - `inc`/`dec` derive H from the result's low nibble ($0 / $F);
//! - `add [hl]` sets Z only when the raw sum is exactly $100;
//! - `sub`/`cp` set Z by comparing the operands;
//! - `xor a` clears Z even though A becomes zero.

use emu_core::Bus;
use log::warn;

use super::decode::{Cond, Instruction, decode};
use super::Lr35902;
use crate::error::ExecError;
use crate::opcodes::{CB_PREFIX, CbOperation, CbTarget, lookup_cb};

/// Extra cycle reported when a conditional branch is taken.
const BRANCH_TAKEN: u8 = 1;

impl Lr35902 {
    // =========================================================================
    // Primary opcodes
    // =========================================================================

    /// Execute one primary opcode whose operand bytes have already been
    /// fetched (PC points past them). `operand` is the little-endian operand
    /// value, or 0 when the opcode takes none.
    ///
    /// Returns the cycles to add on top of the opcode's base cost.
    pub fn execute<B: Bus>(&mut self, bus: &mut B, opcode: u8, operand: u16) -> Result<u8, ExecError> {
        if opcode == CB_PREFIX {
            return self.execute_cb(bus, operand as u8);
        }
        let Some(instruction) = decode(opcode) else {
            warn!("unimplemented opcode ${opcode:02X}");
            return Err(ExecError::Unimplemented { opcode });
        };
        Ok(self.run(bus, instruction, operand))
    }

    fn run<B: Bus>(&mut self, bus: &mut B, instruction: Instruction, operand: u16) -> u8 {
        use Instruction as I;

        let imm8 = operand as u8;

        match instruction {
            I::Nop | I::DisableInterrupts => {}

            // Loads
            I::LoadR16Imm(rr) => self.set_reg16(rr, operand),
            I::LoadR8Imm(r) => self.set_reg8(r, imm8),
            I::LoadR8R8 { dst, src } => self.set_reg8(dst, self.reg8(src)),
            I::StoreAIndirect(rr) => bus.write(self.reg16(rr), self.regs.a),
            I::LoadAIndirect(rr) => self.regs.a = bus.read(self.reg16(rr)),
            I::StoreAHlInc => {
                let hl = self.regs.hl();
                bus.write(hl, self.regs.a);
                self.regs.set_hl(hl.wrapping_add(1));
            }
            I::StoreAHlDec => {
                let hl = self.regs.hl();
                bus.write(hl, self.regs.a);
                self.regs.set_hl(hl.wrapping_sub(1));
            }
            I::StoreHlImm => bus.write(self.regs.hl(), imm8),
            I::StoreAAbsolute => bus.write(operand, self.regs.a),
            I::StoreSpAbsolute => {
                bus.write(operand, self.regs.sp as u8);
                bus.write(operand.wrapping_add(1), (self.regs.sp >> 8) as u8);
            }
            I::StoreAHigh => bus.write(0xFF00 | u16::from(imm8), self.regs.a),
            I::LoadAHigh => self.regs.a = bus.read(0xFF00 | u16::from(imm8)),
            I::StoreAHighC => bus.write(0xFF00 | u16::from(self.regs.c), self.regs.a),

            // Increment / decrement
            I::IncR8(r) => {
                let value = self.reg8(r).wrapping_add(1);
                self.set_reg8(r, value);
                self.regs.set_zero(value == 0);
                self.regs.set_subtract(false);
                self.regs.set_half_carry(value & 0x0F == 0x00);
            }
            I::DecR8(r) => {
                let value = self.reg8(r).wrapping_sub(1);
                self.set_reg8(r, value);
                self.regs.set_zero(value == 0);
                self.regs.set_subtract(true);
                self.regs.set_half_carry(value & 0x0F == 0x0F);
            }
            I::IncR16(rr) => self.set_reg16(rr, self.reg16(rr).wrapping_add(1)),

            // Rotates on A
            I::Rlca => {
                let carry = self.regs.a & 0x80 != 0;
                self.regs.a = self.regs.a.rotate_left(1);
                self.regs.set_carry(carry);
                self.regs.set_subtract(false);
                self.regs.set_half_carry(false);
                self.regs.set_zero(self.regs.a == 0);
            }
            I::Rla => {
                let value = self.rotate_left_through_carry(self.regs.a);
                self.regs.a = value;
            }

            // Arithmetic
            I::AddHlIndirect => {
                let value = bus.read(self.regs.hl());
                let a = self.regs.a;
                let sum = u16::from(a) + u16::from(value);
                self.regs.set_zero(sum == 0x100);
                self.regs.set_subtract(false);
                self.regs.set_half_carry((a & 0x0F) + (value & 0x0F) > 0x0F);
                self.regs.set_carry(sum > 0xFF);
                self.regs.a = sum as u8;
            }
            I::SubR8(r) => {
                let value = self.reg8(r);
                self.compare(value);
                self.regs.a = self.regs.a.wrapping_sub(value);
            }
            I::CpHlIndirect => {
                let value = bus.read(self.regs.hl());
                self.compare(value);
            }
            I::CpImm => self.compare(imm8),
            I::XorA => {
                self.regs.a = 0;
                self.regs.set_zero(false);
                self.regs.set_subtract(false);
                self.regs.set_half_carry(false);
                self.regs.set_carry(false);
            }

            // Control flow
            I::JumpRelative(cond) => {
                let taken = match cond {
                    Cond::Always => true,
                    Cond::NotZero => !self.regs.zero(),
                    Cond::Zero => self.regs.zero(),
                };
                if taken {
                    let offset = i16::from(imm8 as i8);
                    self.regs.pc = self.regs.pc.wrapping_add_signed(offset);
                    if cond != Cond::Always {
                        return BRANCH_TAKEN;
                    }
                }
            }
            I::Jump => self.regs.pc = operand,
            I::Call => {
                self.stack_push(bus, self.regs.pc);
                self.regs.pc = operand;
            }
            I::Ret => self.regs.pc = self.stack_pop(bus),
            I::Push(rr) => self.stack_push(bus, self.reg16(rr)),
            I::Pop(rr) => {
                let value = self.stack_pop(bus);
                self.set_reg16(rr, value);
            }
        }
        0
    }

    /// Flags for `sub`/`cp` against A. A itself is not modified.
    fn compare(&mut self, value: u8) {
        let a = self.regs.a;
        self.regs.set_zero(a == value);
        self.regs.set_subtract(true);
        self.regs.set_half_carry((a & 0x0F) < (value & 0x0F));
        self.regs.set_carry(a < value);
    }

    /// 9-bit rotate left: old carry enters bit 0, bit 7 leaves into carry.
    fn rotate_left_through_carry(&mut self, value: u8) -> u8 {
        let carry_out = value & 0x80 != 0;
        let result = (value << 1) | u8::from(self.regs.carry());
        self.regs.set_carry(carry_out);
        self.regs.set_zero(result == 0);
        self.regs.set_subtract(false);
        self.regs.set_half_carry(false);
        result
    }

    // =========================================================================
    // CB-prefixed opcodes
    // =========================================================================

    /// Execute a CB-prefixed sub-opcode. The `[hl]` extra cycle is accounted
    /// by the caller from the CB table, so this returns 0 on success.
    pub fn execute_cb<B: Bus>(&mut self, _bus: &mut B, sub_opcode: u8) -> Result<u8, ExecError> {
        let desc = lookup_cb(sub_opcode);
        match (desc.operation, desc.target) {
            (CbOperation::Rl, CbTarget::C) => {
                self.regs.c = self.rotate_left_through_carry(self.regs.c);
            }
            (CbOperation::Bit(7), CbTarget::H) => {
                self.regs.set_zero(self.regs.h & 0x80 == 0);
                self.regs.set_subtract(false);
                self.regs.set_half_carry(true);
            }
            _ => {
                warn!("unimplemented CB opcode ${sub_opcode:02X} ({desc})");
                return Err(ExecError::UnimplementedCb { opcode: sub_opcode });
            }
        }
        Ok(0)
    }
}
