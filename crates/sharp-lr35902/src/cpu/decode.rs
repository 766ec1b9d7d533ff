//! Opcode decoding into instruction variants.
//!
//! Opcodes sharing a shape (e.g. every `inc r`) decode to one variant with a
//! register operand, so the executor has one routine per shape. An opcode
//! with no variant here has no execution routine.

/// 8-bit register operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg8 {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
}

/// 16-bit register operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg16 {
    Bc,
    De,
    Hl,
    Sp,
}

/// Branch condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    Always,
    NotZero,
    Zero,
}

/// A decoded primary instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Nop,
    /// `ld rr, n16`
    LoadR16Imm(Reg16),
    /// `ld r, n8`
    LoadR8Imm(Reg8),
    /// `ld dst, src`
    LoadR8R8 { dst: Reg8, src: Reg8 },
    /// `ld [rr], a`
    StoreAIndirect(Reg16),
    /// `ld a, [rr]`
    LoadAIndirect(Reg16),
    /// `ldi [hl], a`
    StoreAHlInc,
    /// `ldd [hl], a`
    StoreAHlDec,
    /// `ld [hl], n8`
    StoreHlImm,
    /// `ld [n16], a`
    StoreAAbsolute,
    /// `ld [n16], sp`
    StoreSpAbsolute,
    /// `ldh [$FF00+n8], a`
    StoreAHigh,
    /// `ldh a, [$FF00+n8]`
    LoadAHigh,
    /// `ld [$FF00+c], a`
    StoreAHighC,
    /// `inc r`
    IncR8(Reg8),
    /// `dec r`
    DecR8(Reg8),
    /// `inc rr`
    IncR16(Reg16),
    Rlca,
    Rla,
    /// `add [hl]`
    AddHlIndirect,
    /// `sub r`
    SubR8(Reg8),
    /// `cp [hl]`
    CpHlIndirect,
    /// `cp n8`
    CpImm,
    /// `xor a`
    XorA,
    /// `jr cc, e8`
    JumpRelative(Cond),
    /// `jp n16`
    Jump,
    /// `call n16`
    Call,
    Ret,
    /// `push rr`
    Push(Reg16),
    /// `pop rr`
    Pop(Reg16),
    /// `di`
    DisableInterrupts,
}

/// Decode a primary opcode. `None` means no execution routine exists.
#[must_use]
pub const fn decode(opcode: u8) -> Option<Instruction> {
    use Instruction as I;

    let instruction = match opcode {
        0x00 => I::Nop,
        0x01 => I::LoadR16Imm(Reg16::Bc),
        0x02 => I::StoreAIndirect(Reg16::Bc),
        0x03 => I::IncR16(Reg16::Bc),
        0x04 => I::IncR8(Reg8::B),
        0x05 => I::DecR8(Reg8::B),
        0x06 => I::LoadR8Imm(Reg8::B),
        0x07 => I::Rlca,
        0x08 => I::StoreSpAbsolute,
        0x0C => I::IncR8(Reg8::C),
        0x0D => I::DecR8(Reg8::C),
        0x0E => I::LoadR8Imm(Reg8::C),
        0x11 => I::LoadR16Imm(Reg16::De),
        0x13 => I::IncR16(Reg16::De),
        0x15 => I::DecR8(Reg8::D),
        0x16 => I::LoadR8Imm(Reg8::D),
        0x17 => I::Rla,
        0x18 => I::JumpRelative(Cond::Always),
        0x1A => I::LoadAIndirect(Reg16::De),
        0x1D => I::DecR8(Reg8::E),
        0x1E => I::LoadR8Imm(Reg8::E),
        0x20 => I::JumpRelative(Cond::NotZero),
        0x21 => I::LoadR16Imm(Reg16::Hl),
        0x22 => I::StoreAHlInc,
        0x23 => I::IncR16(Reg16::Hl),
        0x24 => I::IncR8(Reg8::H),
        0x28 => I::JumpRelative(Cond::Zero),
        0x2E => I::LoadR8Imm(Reg8::L),
        0x31 => I::LoadR16Imm(Reg16::Sp),
        0x32 => I::StoreAHlDec,
        0x36 => I::StoreHlImm,
        0x3D => I::DecR8(Reg8::A),
        0x3E => I::LoadR8Imm(Reg8::A),
        0x4F => I::LoadR8R8 { dst: Reg8::C, src: Reg8::A },
        0x57 => I::LoadR8R8 { dst: Reg8::D, src: Reg8::A },
        0x67 => I::LoadR8R8 { dst: Reg8::H, src: Reg8::A },
        0x77 => I::StoreAIndirect(Reg16::Hl),
        0x78 => I::LoadR8R8 { dst: Reg8::A, src: Reg8::B },
        0x7B => I::LoadR8R8 { dst: Reg8::A, src: Reg8::E },
        0x7C => I::LoadR8R8 { dst: Reg8::A, src: Reg8::H },
        0x7D => I::LoadR8R8 { dst: Reg8::A, src: Reg8::L },
        0x86 => I::AddHlIndirect,
        0x90 => I::SubR8(Reg8::B),
        0xAF => I::XorA,
        0xBE => I::CpHlIndirect,
        0xC1 => I::Pop(Reg16::Bc),
        0xC3 => I::Jump,
        0xC5 => I::Push(Reg16::Bc),
        0xC9 => I::Ret,
        0xCD => I::Call,
        0xE0 => I::StoreAHigh,
        0xE2 => I::StoreAHighC,
        0xEA => I::StoreAAbsolute,
        0xF0 => I::LoadAHigh,
        0xF3 => I::DisableInterrupts,
        0xFE => I::CpImm,
        _ => return None,
    };
    Some(instruction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcodes;

    #[test]
    fn every_decodable_opcode_is_in_the_table() {
        for opcode in 0..=255u8 {
            if decode(opcode).is_some() {
                assert!(
                    opcodes::lookup(opcode).is_some(),
                    "${opcode:02X} decodes but has no descriptor"
                );
            }
        }
    }

    #[test]
    fn shared_shapes_carry_their_register() {
        assert_eq!(decode(0x0C), Some(Instruction::IncR8(Reg8::C)));
        assert_eq!(decode(0x3D), Some(Instruction::DecR8(Reg8::A)));
        assert_eq!(decode(0x20), Some(Instruction::JumpRelative(Cond::NotZero)));
        assert_eq!(decode(0x80), None);
    }
}
