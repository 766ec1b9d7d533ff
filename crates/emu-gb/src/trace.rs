//! Executed-instruction records.

use std::fmt;

/// One executed instruction, for tracing and the history window.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Trace {
    /// Address of the opcode byte.
    pub address: u16,
    /// Opcode followed by its operand bytes as fetched.
    pub bytes: Vec<u8>,
    pub mnemonic: String,
}

impl fmt::Display for Trace {
    /// `$0150  21 00 C0   |   ld hl, $C000`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let raw: Vec<String> = self.bytes.iter().map(|b| format!("{b:02X}")).collect();
        write!(f, "${:04X}  {:<8}   |   {}", self.address, raw.join(" "), self.mnemonic)
    }
}
