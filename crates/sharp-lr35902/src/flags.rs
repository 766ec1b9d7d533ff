//! LR35902 flag register bits.
//!
//! Only the upper nibble of F is defined. The lower nibble is left as
//! whatever was last stored there.

/// Zero flag (bit 7).
pub const ZF: u8 = 0b1000_0000;

/// Subtract flag (bit 6) - set if the last arithmetic operation subtracted.
pub const NF: u8 = 0b0100_0000;

/// Half-carry flag (bit 5) - carry/borrow between the nibbles.
pub const HF: u8 = 0b0010_0000;

/// Carry flag (bit 4).
pub const CF: u8 = 0b0001_0000;
