//! Boot ROM overlay.

use emu_core::MemoryDevice;

/// Register whose write (of anything but 1) unmaps the boot ROM.
pub const REG_BOOT_OFF: u16 = 0xFF50;

/// Size of the overlaid window, $0000-$00FF.
pub const BOOT_WINDOW: u16 = 0x100;

/// The boot program, mapped over the bottom of the cartridge until
/// disabled. Once disabled it stays disabled for the session.
pub struct BootOverlay {
    data: Vec<u8>,
    active: bool,
}

impl BootOverlay {
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, active: true }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn disable(&mut self) {
        self.active = false;
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl MemoryDevice for BootOverlay {
    /// Claims $0000-$00FF while active. Bytes past the end of a short image
    /// read as $FF.
    fn read_at(&self, address: u16) -> Option<u8> {
        if self.active && address < BOOT_WINDOW {
            Some(self.data.get(usize::from(address)).copied().unwrap_or(0xFF))
        } else {
            None
        }
    }

    fn write_at(&mut self, _address: u16, _value: u8) {}

    fn name(&self) -> &'static str {
        "boot"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_window() {
        let mut boot = BootOverlay::new(vec![0x31, 0xFE, 0xFF]);
        assert_eq!(boot.read_at(0x0000), Some(0x31));
        assert_eq!(boot.read_at(0x0003), Some(0xFF));
        assert_eq!(boot.read_at(0x0100), None);
        boot.disable();
        assert!(!boot.is_active());
        assert_eq!(boot.read_at(0x0000), None);
    }
}
