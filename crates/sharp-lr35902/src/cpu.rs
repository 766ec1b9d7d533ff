//! LR35902 CPU core.
//!
//! The core is instruction-stepped: the machine fetches the opcode and its
//! operand bytes, then hands them to [`Lr35902::execute`]. The CPU reaches
//! memory only through the `Bus` passed into each call.

mod decode;
mod execute;

pub use decode::{Cond, Instruction, Reg8, Reg16, decode};

use emu_core::{Bus, Cpu, Observable, Value};

use crate::flags::{CF, HF, NF, ZF};
use crate::registers::Registers;

/// Sharp LR35902 CPU.
pub struct Lr35902 {
    pub regs: Registers,
    /// Registers restored by `reset()`.
    power_on: Registers,
}

impl Lr35902 {
    /// CPU in the post-boot register state.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registers(Registers::POST_BOOT)
    }

    /// CPU with an explicit power-on register state.
    #[must_use]
    pub fn with_registers(regs: Registers) -> Self {
        Self {
            regs,
            power_on: regs,
        }
    }

    /// Push a 16-bit value: high byte at SP-1, low byte at SP-2.
    pub fn stack_push<B: Bus>(&mut self, bus: &mut B, value: u16) {
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.write(self.regs.sp, (value >> 8) as u8);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.write(self.regs.sp, value as u8);
    }

    /// Pop a 16-bit value pushed by `stack_push`.
    pub fn stack_pop<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = bus.read(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let hi = bus.read(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        (u16::from(hi) << 8) | u16::from(lo)
    }

    /// Fetch the byte at PC and advance PC.
    pub fn fetch<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let byte = bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        byte
    }

    fn reg8(&self, r: Reg8) -> u8 {
        match r {
            Reg8::A => self.regs.a,
            Reg8::B => self.regs.b,
            Reg8::C => self.regs.c,
            Reg8::D => self.regs.d,
            Reg8::E => self.regs.e,
            Reg8::H => self.regs.h,
            Reg8::L => self.regs.l,
        }
    }

    fn set_reg8(&mut self, r: Reg8, value: u8) {
        match r {
            Reg8::A => self.regs.a = value,
            Reg8::B => self.regs.b = value,
            Reg8::C => self.regs.c = value,
            Reg8::D => self.regs.d = value,
            Reg8::E => self.regs.e = value,
            Reg8::H => self.regs.h = value,
            Reg8::L => self.regs.l = value,
        }
    }

    fn reg16(&self, rr: Reg16) -> u16 {
        match rr {
            Reg16::Bc => self.regs.bc(),
            Reg16::De => self.regs.de(),
            Reg16::Hl => self.regs.hl(),
            Reg16::Sp => self.regs.sp,
        }
    }

    fn set_reg16(&mut self, rr: Reg16, value: u16) {
        match rr {
            Reg16::Bc => self.regs.set_bc(value),
            Reg16::De => self.regs.set_de(value),
            Reg16::Hl => self.regs.set_hl(value),
            Reg16::Sp => self.regs.sp = value,
        }
    }
}

impl Default for Lr35902 {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu for Lr35902 {
    type Registers = Registers;

    fn pc(&self) -> u32 {
        u32::from(self.regs.pc)
    }

    fn registers(&self) -> Registers {
        self.regs
    }

    fn reset(&mut self) {
        self.regs = self.power_on;
    }
}

impl Observable for Lr35902 {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "a" => Some(self.regs.a.into()),
            "f" => Some(self.regs.f.into()),
            "b" => Some(self.regs.b.into()),
            "c" => Some(self.regs.c.into()),
            "d" => Some(self.regs.d.into()),
            "e" => Some(self.regs.e.into()),
            "h" => Some(self.regs.h.into()),
            "l" => Some(self.regs.l.into()),

            "af" => Some(self.regs.af().into()),
            "bc" => Some(self.regs.bc().into()),
            "de" => Some(self.regs.de().into()),
            "hl" => Some(self.regs.hl().into()),

            "sp" => Some(self.regs.sp.into()),
            "pc" => Some(self.regs.pc.into()),

            "flags.z" => Some(self.regs.flag(ZF).into()),
            "flags.n" => Some(self.regs.flag(NF).into()),
            "flags.h" => Some(self.regs.flag(HF).into()),
            "flags.c" => Some(self.regs.flag(CF).into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "a", "f", "b", "c", "d", "e", "h", "l", "af", "bc", "de", "hl", "sp", "pc", "flags.z",
            "flags.n", "flags.h", "flags.c",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_core::SimpleBus;

    #[test]
    fn push_stores_high_byte_above_low_byte() {
        let mut bus = SimpleBus::new();
        let mut cpu = Lr35902::new();
        cpu.regs.sp = 0xFFFE;
        cpu.stack_push(&mut bus, 0xBEEF);
        assert_eq!(cpu.regs.sp, 0xFFFC);
        assert_eq!(bus.peek(0xFFFD), 0xBE);
        assert_eq!(bus.peek(0xFFFC), 0xEF);
    }

    #[test]
    fn stack_round_trip_restores_sp_and_value() {
        let mut bus = SimpleBus::new();
        let mut cpu = Lr35902::new();
        for (sp, value) in [(0xFFFE, 0x1234), (0x0001, 0xABCD), (0x0000, 0x00FF), (0xC000, 0xFFFF)] {
            cpu.regs.sp = sp;
            cpu.stack_push(&mut bus, value);
            assert_eq!(cpu.stack_pop(&mut bus), value);
            assert_eq!(cpu.regs.sp, sp);
        }
    }

    #[test]
    fn stack_pointer_wraps_at_zero() {
        let mut bus = SimpleBus::new();
        let mut cpu = Lr35902::new();
        cpu.regs.sp = 0x0001;
        cpu.stack_push(&mut bus, 0x1234);
        assert_eq!(cpu.regs.sp, 0xFFFF);
        assert_eq!(bus.peek(0x0000), 0x12);
        assert_eq!(bus.peek(0xFFFF), 0x34);
    }

    #[test]
    fn reset_restores_power_on_state() {
        let mut cpu = Lr35902::new();
        cpu.regs.a = 0x00;
        cpu.regs.pc = 0x1234;
        cpu.reset();
        assert_eq!(cpu.registers(), Registers::POST_BOOT);
    }

    #[test]
    fn observable_registers_and_flags() {
        let cpu = Lr35902::new();
        assert_eq!(cpu.query("pc"), Some(Value::U16(0x00FE)));
        assert_eq!(cpu.query("af"), Some(Value::U16(0x1180)));
        assert_eq!(cpu.query("flags.z"), Some(Value::Bool(true)));
        assert_eq!(cpu.query("flags.c"), Some(Value::Bool(false)));
        assert_eq!(cpu.query("ix"), None);
    }
}
