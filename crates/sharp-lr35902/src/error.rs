//! Execution errors.

use thiserror::Error;

/// An opcode the tables know about but the executor does not implement.
///
/// Both variants are fatal for instruction stepping: the instruction's
/// operands have been fetched but no architectural state was changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error("unimplemented opcode ${opcode:02X}")]
    Unimplemented { opcode: u8 },
    #[error("unimplemented CB opcode ${opcode:02X}")]
    UnimplementedCb { opcode: u8 },
}

impl ExecError {
    /// The offending opcode (or CB sub-opcode).
    #[must_use]
    pub const fn opcode(&self) -> u8 {
        match self {
            Self::Unimplemented { opcode } | Self::UnimplementedCb { opcode } => *opcode,
        }
    }
}
