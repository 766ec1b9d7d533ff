//! Bank controller state.
//!
//! Bank switching is not emulated: the switchable window stays on bank 1
//! and external RAM is never mapped. Writes into the controller's register
//! area are accepted and dropped.

use log::trace;

use crate::header::MbcKind;

/// Bank-select state for a cartridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mbc {
    kind: Option<MbcKind>,
    rom_bank: usize,
    ram_bank: usize,
    ram_loaded: bool,
}

impl Mbc {
    #[must_use]
    pub const fn new(kind: Option<MbcKind>) -> Self {
        Self {
            kind,
            rom_bank: 1,
            ram_bank: 0,
            ram_loaded: false,
        }
    }

    /// Controller family, or `None` for ROM-only and invalid cartridges.
    #[must_use]
    pub const fn kind(&self) -> Option<MbcKind> {
        self.kind
    }

    /// Bank mapped at $4000-$7FFF.
    #[must_use]
    pub const fn rom_bank(&self) -> usize {
        self.rom_bank
    }

    /// Bank mapped at $A000-$BFFF when RAM is loaded.
    #[must_use]
    pub const fn ram_bank(&self) -> usize {
        self.ram_bank
    }

    #[must_use]
    pub const fn ram_loaded(&self) -> bool {
        self.ram_loaded
    }

    /// Register write into $0000-$7FFF. Ignored.
    #[allow(clippy::unused_self)]
    pub fn write(&mut self, address: u16, value: u8) {
        trace!("bank controller write ${address:04X} <- ${value:02X} ignored");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_bank_one_without_ram() {
        let mbc = Mbc::new(Some(MbcKind::Mbc1));
        assert_eq!(mbc.rom_bank(), 1);
        assert_eq!(mbc.ram_bank(), 0);
        assert!(!mbc.ram_loaded());
        assert_eq!(mbc.kind(), Some(MbcKind::Mbc1));
    }

    #[test]
    fn bank_select_writes_are_dropped() {
        let mut mbc = Mbc::new(Some(MbcKind::Mbc1));
        mbc.write(0x2000, 0x05);
        mbc.write(0x4000, 0x01);
        assert_eq!(mbc, Mbc::new(Some(MbcKind::Mbc1)));
    }
}
