//! LR35902 register file.

use crate::flags::{CF, HF, NF, ZF};

/// LR35902 registers.
///
/// Eight 8-bit registers plus SP and PC. The 16-bit pairs are not stored;
/// they are composed big-endian from their halves on demand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Registers {
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
}

impl Registers {
    /// Register state left behind by the boot program just before its final
    /// instruction (the write that unmaps the boot overlay at $00FE).
    pub const POST_BOOT: Self = Self {
        a: 0x11,
        f: 0x80,
        b: 0xDB,
        c: 0x00,
        d: 0x00,
        e: 0x08,
        h: 0x00,
        l: 0x7C,
        sp: 0xFFFE,
        pc: 0x00FE,
    };

    /// Build a register file from a byte source, as real hardware powers
    /// up with undefined contents. PC always starts at $0000.
    pub fn randomized(mut next_byte: impl FnMut() -> u8) -> Self {
        let sp_hi = next_byte();
        let sp_lo = next_byte();
        let sp = (u16::from(sp_hi) << 8) | u16::from(sp_lo);
        Self {
            a: next_byte(),
            f: next_byte(),
            b: next_byte(),
            c: next_byte(),
            d: next_byte(),
            e: next_byte(),
            h: next_byte(),
            l: next_byte(),
            sp,
            pc: 0x0000,
        }
    }

    /// AF pair. Read-only: nothing in the instruction subset writes it.
    #[must_use]
    pub const fn af(&self) -> u16 {
        (self.a as u16) << 8 | self.f as u16
    }

    #[must_use]
    pub const fn bc(&self) -> u16 {
        (self.b as u16) << 8 | self.c as u16
    }

    #[must_use]
    pub const fn de(&self) -> u16 {
        (self.d as u16) << 8 | self.e as u16
    }

    #[must_use]
    pub const fn hl(&self) -> u16 {
        (self.h as u16) << 8 | self.l as u16
    }

    pub fn set_bc(&mut self, value: u16) {
        self.b = (value >> 8) as u8;
        self.c = value as u8;
    }

    pub fn set_de(&mut self, value: u16) {
        self.d = (value >> 8) as u8;
        self.e = value as u8;
    }

    pub fn set_hl(&mut self, value: u16) {
        self.h = (value >> 8) as u8;
        self.l = value as u8;
    }

    /// True if every bit of `mask` is set in F.
    #[must_use]
    pub const fn flag(&self, mask: u8) -> bool {
        self.f & mask == mask
    }

    /// Set or clear the bits of `mask` in F, leaving other bits untouched.
    pub fn set_flag(&mut self, mask: u8, value: bool) {
        if value {
            self.f |= mask;
        } else {
            self.f &= !mask;
        }
    }

    #[must_use]
    pub const fn zero(&self) -> bool {
        self.flag(ZF)
    }

    #[must_use]
    pub const fn subtract(&self) -> bool {
        self.flag(NF)
    }

    #[must_use]
    pub const fn half_carry(&self) -> bool {
        self.flag(HF)
    }

    #[must_use]
    pub const fn carry(&self) -> bool {
        self.flag(CF)
    }

    pub fn set_zero(&mut self, value: bool) {
        self.set_flag(ZF, value);
    }

    pub fn set_subtract(&mut self, value: bool) {
        self.set_flag(NF, value);
    }

    pub fn set_half_carry(&mut self, value: bool) {
        self.set_flag(HF, value);
    }

    pub fn set_carry(&mut self, value: bool) {
        self.set_flag(CF, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_are_big_endian() {
        let mut regs = Registers::default();
        regs.set_bc(0x1234);
        assert_eq!((regs.b, regs.c), (0x12, 0x34));
        assert_eq!(regs.bc(), 0x1234);

        regs.set_hl(0xC0DE);
        assert_eq!((regs.h, regs.l), (0xC0, 0xDE));

        regs.a = 0x11;
        regs.f = 0x80;
        assert_eq!(regs.af(), 0x1180);
    }

    #[test]
    fn set_flag_only_touches_its_bit() {
        let mut regs = Registers {
            f: 0x0F,
            ..Registers::default()
        };
        regs.set_zero(true);
        assert_eq!(regs.f, 0x8F);
        regs.set_carry(true);
        assert_eq!(regs.f, 0x9F);
        regs.set_zero(false);
        assert_eq!(regs.f, 0x1F);
        regs.set_zero(false);
        assert_eq!(regs.f, 0x1F);
        assert!(regs.carry());
        assert!(!regs.half_carry());
    }

    #[test]
    fn randomized_starts_at_zero_pc() {
        let mut n = 0u8;
        let regs = Registers::randomized(|| {
            n = n.wrapping_add(1);
            n
        });
        assert_eq!(regs.pc, 0x0000);
        assert_eq!(regs.sp, 0x0102);
        assert_eq!(regs.a, 0x03);
        assert_eq!(regs.l, 0x0A);
    }
}
