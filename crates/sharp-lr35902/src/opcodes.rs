//! Static opcode metadata: operand width, base cycle cost and mnemonic.
//!
//! The primary table has one slot per opcode byte. An empty slot is an
//! opcode the CPU has never heard of, which is a different failure from an
//! opcode that is listed here but has no execution routine.
//!
//! Mnemonic templates use three placeholders:
//! - `{n8}`: 8-bit immediate, two hex digits
//! - `{n16}`: 16-bit immediate, four hex digits
//! - `{rel}`: absolute target of a relative jump, four hex digits

use std::fmt;

/// Opcode byte that selects the CB-prefixed secondary table.
pub const CB_PREFIX: u8 = 0xCB;

/// Metadata for one primary opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeDescriptor {
    /// Number of operand bytes following the opcode (0, 1 or 2).
    pub operand_len: u8,
    /// Cycle cost before any branch-taken extra.
    pub base_cycles: u8,
    /// Mnemonic template.
    pub mnemonic: &'static str,
}

impl OpcodeDescriptor {
    /// Render the mnemonic for a concrete operand.
    ///
    /// `next_pc` is the address following the instruction; relative jump
    /// targets are computed from it.
    #[must_use]
    pub fn disassemble(&self, operand: u16, next_pc: u16) -> String {
        let offset = i16::from(operand as u8 as i8);
        let target = next_pc.wrapping_add_signed(offset);
        self.mnemonic
            .replace("{n16}", &format!("{operand:04X}"))
            .replace("{n8}", &format!("{:02X}", operand as u8))
            .replace("{rel}", &format!("{target:04X}"))
    }
}

/// Look up a primary opcode. `None` means the opcode is unknown.
#[must_use]
pub fn lookup(opcode: u8) -> Option<&'static OpcodeDescriptor> {
    OPCODES[opcode as usize].as_ref()
}

const fn op(operand_len: u8, base_cycles: u8, mnemonic: &'static str) -> Option<OpcodeDescriptor> {
    Some(OpcodeDescriptor {
        operand_len,
        base_cycles,
        mnemonic,
    })
}

/// Primary opcode table, indexed by opcode byte.
pub static OPCODES: [Option<OpcodeDescriptor>; 256] = [
    op(0, 1, "nop"), // 00
    op(2, 3, "ld bc, ${n16}"), // 01
    op(0, 2, "ld [bc], a"), // 02
    op(0, 2, "inc bc"), // 03
    op(0, 1, "inc b"), // 04
    op(0, 1, "dec b"), // 05
    op(1, 8, "ld b, ${n8}"), // 06
    op(1, 1, "rlca"), // 07
    op(2, 5, "ld [${n16}], sp"), // 08
    op(0, 2, "add hl, bc"), // 09
    op(0, 2, "ld a, [bc]"), // 0A
    op(0, 2, "dec bc"), // 0B
    op(0, 1, "inc c"), // 0C
    op(0, 1, "dec c"), // 0D
    op(1, 8, "ld c, ${n8}"), // 0E
    op(0, 1, "rrca"), // 0F
    op(1, 1, "stop"), // 10
    op(2, 3, "ld de, ${n16}"), // 11
    op(0, 2, "ld [de], a"), // 12
    op(0, 2, "inc de"), // 13
    op(0, 1, "inc d"), // 14
    op(0, 1, "dec d"), // 15
    op(1, 2, "ld d, ${n8}"), // 16
    op(0, 1, "rla"), // 17
    op(1, 2, "jr ${rel}"), // 18
    op(0, 2, "add hl, de"), // 19
    op(0, 2, "ld a, [de]"), // 1A
    op(0, 2, "dec de"), // 1B
    op(0, 1, "inc e"), // 1C
    op(0, 1, "dec e"), // 1D
    op(1, 2, "ld e, ${n8}"), // 1E
    op(0, 1, "rra"), // 1F
    op(1, 2, "jr nz, ${rel}"), // 20
    op(2, 3, "ld hl, ${n16}"), // 21
    op(0, 2, "ldi [hl], a"), // 22
    op(0, 2, "inc hl"), // 23
    op(0, 1, "inc h"), // 24
    op(0, 1, "dec h"), // 25
    op(1, 2, "ld h, ${n8}"), // 26
    op(0, 1, "daa"), // 27
    op(1, 2, "jr z, ${rel}"), // 28
    op(0, 2, "add hl, hl"), // 29
    op(0, 2, "ldi a, [hl]"), // 2A
    op(0, 2, "dec hl"), // 2B
    op(0, 1, "inc l"), // 2C
    op(0, 1, "dec l"), // 2D
    op(1, 2, "ld l, ${n8}"), // 2E
    op(0, 1, "cpl"), // 2F
    op(1, 2, "jr nc, ${rel}"), // 30
    op(2, 3, "ld sp, ${n16}"), // 31
    op(0, 2, "ldd [hl], a"), // 32
    op(0, 2, "inc sp"), // 33
    op(0, 3, "inc [hl]"), // 34
    op(0, 3, "dec [hl]"), // 35
    op(1, 3, "ld [hl], ${n8}"), // 36
    op(0, 1, "scf"), // 37
    op(1, 2, "jr c, ${rel}"), // 38
    op(0, 2, "add hl, sp"), // 39
    op(0, 2, "ldd a, [hl]"), // 3A
    op(0, 2, "dec sp"), // 3B
    op(0, 1, "inc a"), // 3C
    op(0, 1, "dec a"), // 3D
    op(1, 2, "ld a, ${n8}"), // 3E
    op(0, 1, "ccf"), // 3F
    op(0, 1, "ld b, b"), // 40
    op(0, 1, "ld b, c"), // 41
    op(0, 1, "ld b, d"), // 42
    op(0, 1, "ld b, e"), // 43
    op(0, 1, "ld b, h"), // 44
    op(0, 1, "ld b, l"), // 45
    op(0, 2, "ld b, [hl]"), // 46
    op(0, 1, "ld b, a"), // 47
    op(0, 1, "ld c, b"), // 48
    op(0, 1, "ld c, c"), // 49
    op(0, 1, "ld c, d"), // 4A
    op(0, 1, "ld c, e"), // 4B
    op(0, 1, "ld c, h"), // 4C
    op(0, 1, "ld c, l"), // 4D
    op(0, 2, "ld c, [hl]"), // 4E
    op(0, 1, "ld c, a"), // 4F
    op(0, 1, "ld d, b"), // 50
    op(0, 1, "ld d, c"), // 51
    op(0, 1, "ld d, d"), // 52
    op(0, 1, "ld d, e"), // 53
    op(0, 1, "ld d, h"), // 54
    op(0, 1, "ld d, l"), // 55
    op(0, 2, "ld d, [hl]"), // 56
    op(0, 1, "ld d, a"), // 57
    op(0, 1, "ld e, b"), // 58
    op(0, 1, "ld e, c"), // 59
    op(0, 1, "ld e, d"), // 5A
    op(0, 1, "ld e, e"), // 5B
    op(0, 1, "ld e, h"), // 5C
    op(0, 1, "ld e, l"), // 5D
    op(0, 2, "ld e, [hl]"), // 5E
    op(0, 1, "ld e, a"), // 5F
    op(0, 1, "ld h, b"), // 60
    op(0, 1, "ld h, c"), // 61
    op(0, 1, "ld h, d"), // 62
    op(0, 1, "ld h, e"), // 63
    op(0, 1, "ld h, h"), // 64
    op(0, 1, "ld h, l"), // 65
    op(0, 2, "ld h, [hl]"), // 66
    op(0, 1, "ld h, a"), // 67
    op(0, 1, "ld l, b"), // 68
    op(0, 1, "ld l, c"), // 69
    op(0, 1, "ld l, d"), // 6A
    op(0, 1, "ld l, e"), // 6B
    op(0, 1, "ld l, h"), // 6C
    op(0, 1, "ld l, l"), // 6D
    op(0, 2, "ld l, [hl]"), // 6E
    op(0, 1, "ld l, a"), // 6F
    op(0, 2, "ld [hl], b"), // 70
    op(0, 2, "ld [hl], c"), // 71
    op(0, 2, "ld [hl], d"), // 72
    op(0, 2, "ld [hl], e"), // 73
    op(0, 2, "ld [hl], h"), // 74
    op(0, 2, "ld [hl], l"), // 75
    op(0, 1, "halt"), // 76
    op(0, 2, "ld [hl], a"), // 77
    op(0, 1, "ld a, b"), // 78
    op(0, 1, "ld a, c"), // 79
    op(0, 1, "ld a, d"), // 7A
    op(0, 1, "ld a, e"), // 7B
    op(0, 1, "ld a, h"), // 7C
    op(0, 1, "ld a, l"), // 7D
    op(0, 2, "ld a, [hl]"), // 7E
    op(0, 1, "ld a, a"), // 7F
    op(0, 1, "add b"), // 80
    op(0, 1, "add c"), // 81
    op(0, 1, "add d"), // 82
    op(0, 1, "add e"), // 83
    op(0, 1, "add h"), // 84
    op(0, 1, "add l"), // 85
    op(0, 2, "add [hl]"), // 86
    op(0, 1, "add a"), // 87
    op(0, 1, "adc b"), // 88
    op(0, 1, "adc c"), // 89
    op(0, 1, "adc d"), // 8A
    op(0, 1, "adc e"), // 8B
    op(0, 1, "adc h"), // 8C
    op(0, 1, "adc l"), // 8D
    op(0, 2, "adc [hl]"), // 8E
    op(0, 1, "adc a"), // 8F
    op(0, 1, "sub b"), // 90
    op(0, 1, "sub c"), // 91
    op(0, 1, "sub d"), // 92
    op(0, 1, "sub e"), // 93
    op(0, 1, "sub h"), // 94
    op(0, 1, "sub l"), // 95
    op(0, 2, "sub [hl]"), // 96
    op(0, 1, "sub a"), // 97
    op(0, 1, "sbc b"), // 98
    op(0, 1, "sbc c"), // 99
    op(0, 1, "sbc d"), // 9A
    op(0, 1, "sbc e"), // 9B
    op(0, 1, "sbc h"), // 9C
    op(0, 1, "sbc l"), // 9D
    op(0, 2, "sbc [hl]"), // 9E
    op(0, 1, "sbc a"), // 9F
    op(0, 1, "and b"), // A0
    op(0, 1, "and c"), // A1
    op(0, 1, "and d"), // A2
    op(0, 1, "and e"), // A3
    op(0, 1, "and h"), // A4
    op(0, 1, "and l"), // A5
    op(0, 2, "and [hl]"), // A6
    op(0, 1, "and a"), // A7
    op(0, 1, "xor b"), // A8
    op(0, 1, "xor c"), // A9
    op(0, 1, "xor d"), // AA
    op(0, 1, "xor e"), // AB
    op(0, 1, "xor h"), // AC
    op(0, 1, "xor l"), // AD
    op(0, 2, "xor [hl]"), // AE
    op(0, 1, "xor a"), // AF
    op(0, 1, "or b"), // B0
    op(0, 1, "or c"), // B1
    op(0, 1, "or d"), // B2
    op(0, 1, "or e"), // B3
    op(0, 1, "or h"), // B4
    op(0, 1, "or l"), // B5
    op(0, 2, "or [hl]"), // B6
    op(0, 1, "or a"), // B7
    op(0, 1, "cp b"), // B8
    op(0, 1, "cp c"), // B9
    op(0, 1, "cp d"), // BA
    op(0, 1, "cp e"), // BB
    op(0, 1, "cp h"), // BC
    op(0, 1, "cp l"), // BD
    op(0, 2, "cp [hl]"), // BE
    op(0, 1, "cp a"), // BF
    op(0, 2, "ret nz"), // C0
    op(0, 3, "pop bc"), // C1
    op(2, 3, "jp nz, ${n16}"), // C2
    op(2, 4, "jp ${n16}"), // C3
    op(2, 3, "call nz, ${n16}"), // C4
    op(0, 4, "push bc"), // C5
    op(1, 2, "add ${n8}"), // C6
    op(0, 4, "rst $00"), // C7
    op(0, 2, "ret z"), // C8
    op(0, 2, "ret"), // C9
    op(2, 3, "jp z, ${n16}"), // CA
    op(1, 2, "CB"), // CB
    op(2, 3, "call z, ${n16}"), // CC
    op(2, 6, "call ${n16}"), // CD
    op(1, 2, "adc ${n8}"), // CE
    op(0, 4, "rst $08"), // CF
    op(0, 2, "ret nc"), // D0
    op(0, 3, "pop de"), // D1
    op(2, 3, "jp nc, ${n16}"), // D2
    None, // D3
    op(2, 3, "call nc, ${n16}"), // D4
    op(0, 4, "push de"), // D5
    op(1, 2, "sub ${n8}"), // D6
    op(0, 4, "rst $10"), // D7
    op(0, 2, "ret c"), // D8
    op(0, 4, "reti"), // D9
    op(2, 3, "jp c, ${n16}"), // DA
    None, // DB
    op(2, 3, "call c, ${n16}"), // DC
    None, // DD
    op(1, 2, "sbc ${n8}"), // DE
    op(0, 4, "rst $18"), // DF
    op(1, 3, "ldh [$FF{n8}], a"), // E0
    op(0, 3, "pop hl"), // E1
    op(0, 2, "ldh [c], a"), // E2
    None, // E3
    None, // E4
    op(0, 4, "push hl"), // E5
    op(1, 2, "and ${n8}"), // E6
    op(0, 4, "rst $20"), // E7
    op(1, 4, "add sp, ${n8}"), // E8
    op(0, 1, "jp [hl]"), // E9
    op(2, 4, "ld [${n16}], a"), // EA
    None, // EB
    None, // EC
    None, // ED
    op(1, 2, "xor ${n8}"), // EE
    op(0, 4, "rst $28"), // EF
    op(1, 3, "ldh a, [$FF{n8}]"), // F0
    op(0, 3, "pop af"), // F1
    op(0, 2, "ldh a, [c]"), // F2
    op(0, 1, "di"), // F3
    None, // F4
    op(0, 4, "push af"), // F5
    op(1, 2, "or ${n8}"), // F6
    op(0, 4, "rst $30"), // F7
    op(1, 3, "ld hl, sp+${n8}"), // F8
    op(0, 2, "ld sp, hl"), // F9
    op(2, 4, "ld a, [${n16}]"), // FA
    op(0, 1, "ei"), // FB
    None, // FC
    None, // FD
    op(1, 2, "cp ${n8}"), // FE
    op(0, 4, "rst $38"), // FF
];

// ---------------------------------------------------------------------------
// CB-prefixed table
// ---------------------------------------------------------------------------

/// Operation selected by the upper five bits of a CB sub-opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CbOperation {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Swap,
    Srl,
    Bit(u8),
    Res(u8),
    Set(u8),
}

/// Operand selected by the low three bits of a CB sub-opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CbTarget {
    B,
    C,
    D,
    E,
    H,
    L,
    /// The byte at the address in HL.
    HlIndirect,
    A,
}

/// Metadata for one CB sub-opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CbDescriptor {
    pub operation: CbOperation,
    pub target: CbTarget,
}

impl CbDescriptor {
    /// Split a sub-opcode into operation and target.
    #[must_use]
    pub const fn decode(sub_opcode: u8) -> Self {
        let target = match sub_opcode & 0b111 {
            0 => CbTarget::B,
            1 => CbTarget::C,
            2 => CbTarget::D,
            3 => CbTarget::E,
            4 => CbTarget::H,
            5 => CbTarget::L,
            6 => CbTarget::HlIndirect,
            _ => CbTarget::A,
        };
        let n = (sub_opcode >> 3) & 0b111;
        let operation = match sub_opcode >> 6 {
            0 => match n {
                0 => CbOperation::Rlc,
                1 => CbOperation::Rrc,
                2 => CbOperation::Rl,
                3 => CbOperation::Rr,
                4 => CbOperation::Sla,
                5 => CbOperation::Sra,
                6 => CbOperation::Swap,
                _ => CbOperation::Srl,
            },
            1 => CbOperation::Bit(n),
            2 => CbOperation::Res(n),
            _ => CbOperation::Set(n),
        };
        Self { operation, target }
    }

    /// Cycles on top of the CB prefix's base cost: one more for the
    /// memory operand.
    #[must_use]
    pub const fn extra_cycles(&self) -> u8 {
        match self.target {
            CbTarget::HlIndirect => 1,
            _ => 0,
        }
    }
}

impl fmt::Display for CbTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CbTarget::B => "b",
            CbTarget::C => "c",
            CbTarget::D => "d",
            CbTarget::E => "e",
            CbTarget::H => "h",
            CbTarget::L => "l",
            CbTarget::HlIndirect => "[hl]",
            CbTarget::A => "a",
        };
        f.write_str(name)
    }
}

impl fmt::Display for CbDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.target;
        match self.operation {
            CbOperation::Rlc => write!(f, "rlc {t}"),
            CbOperation::Rrc => write!(f, "rrc {t}"),
            CbOperation::Rl => write!(f, "rl {t}"),
            CbOperation::Rr => write!(f, "rr {t}"),
            CbOperation::Sla => write!(f, "sla {t}"),
            CbOperation::Sra => write!(f, "sra {t}"),
            CbOperation::Swap => write!(f, "swap {t}"),
            CbOperation::Srl => write!(f, "srl {t}"),
            CbOperation::Bit(n) => write!(f, "bit {n}, {t}"),
            CbOperation::Res(n) => write!(f, "res {n}, {t}"),
            CbOperation::Set(n) => write!(f, "set {n}, {t}"),
        }
    }
}

const fn build_cb_table() -> [CbDescriptor; 256] {
    let mut table = [CbDescriptor::decode(0); 256];
    let mut i = 0;
    while i < 256 {
        table[i] = CbDescriptor::decode(i as u8);
        i += 1;
    }
    table
}

/// CB-prefixed table, indexed by sub-opcode. Every sub-opcode is known.
pub static CB_OPCODES: [CbDescriptor; 256] = build_cb_table();

/// Look up a CB sub-opcode.
#[must_use]
pub fn lookup_cb(sub_opcode: u8) -> &'static CbDescriptor {
    &CB_OPCODES[sub_opcode as usize]
}
