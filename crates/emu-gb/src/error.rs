//! Stepping and configuration errors.

use gb_cartridge::CartridgeError;
use sharp_lr35902::ExecError;
use thiserror::Error;

/// Why an instruction could not be stepped.
///
/// In both cases PC has already moved past the fetched bytes and no cycles
/// were charged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    /// The opcode byte is not in the opcode table at all.
    #[error("unknown opcode ${opcode:02X} at ${address:04X}")]
    UnknownOpcode { opcode: u8, address: u16 },
    /// The opcode is in the table but has no execution routine.
    #[error("{source} at ${address:04X}")]
    Unimplemented {
        address: u16,
        #[source]
        source: ExecError,
    },
}

impl StepError {
    /// Unknown opcodes are an abort signal for the driver to report; an
    /// unimplemented routine is a defect in the core.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Unimplemented { .. })
    }

    /// Address of the offending instruction.
    #[must_use]
    pub const fn address(&self) -> u16 {
        match self {
            Self::UnknownOpcode { address, .. } | Self::Unimplemented { address, .. } => *address,
        }
    }

    /// Offending opcode, or CB sub-opcode for an unimplemented CB routine.
    #[must_use]
    pub const fn opcode(&self) -> u8 {
        match self {
            Self::UnknownOpcode { opcode, .. } => *opcode,
            Self::Unimplemented { source, .. } => source.opcode(),
        }
    }
}

/// Failure to build a machine from a [`crate::GbConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Cartridge(#[from] CartridgeError),
}
