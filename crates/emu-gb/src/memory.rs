//! On-board memory devices: VRAM, WRAM, HRAM and the I/O register page.
//!
//! Each device owns fixed arrays and claims addresses purely by range.

use emu_core::MemoryDevice;

use crate::entropy::Entropy;

const TILE_BANK_SIZE: usize = 0x800;
const BG_MAP_SIZE: usize = 0x400;
const WRAM_BANK_SIZE: usize = 0x1000;
const HRAM_SIZE: usize = 0x7F;
const IO_SIZE: usize = 0x80;

/// Scanline register (LY).
pub const REG_LY: u16 = 0xFF44;

// ---------------------------------------------------------------------------
// VRAM
// ---------------------------------------------------------------------------

/// Video RAM, $8000-$9FFF: three 2 KiB tile banks and two 1 KiB background
/// maps.
///
/// CPU reads are gated by an access window. While the window is closed
/// every read answers $FF. Nothing in the machine closes it yet, so the
/// gate is open for the whole session.
pub struct Vram {
    tiles: [[u8; TILE_BANK_SIZE]; 3],
    bg_maps: [[u8; BG_MAP_SIZE]; 2],
    cpu_access: bool,
}

impl Vram {
    /// Zero-filled VRAM.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tiles: [[0; TILE_BANK_SIZE]; 3],
            bg_maps: [[0; BG_MAP_SIZE]; 2],
            cpu_access: true,
        }
    }

    /// VRAM holding power-on garbage.
    #[must_use]
    pub fn with_garbage(entropy: &mut dyn Entropy) -> Self {
        let mut vram = Self::new();
        for bank in &mut vram.tiles {
            entropy.fill(bank);
        }
        for map in &mut vram.bg_maps {
            entropy.fill(map);
        }
        vram
    }

    /// Tile bank 0-2 ($8000, $8800, $9000).
    #[must_use]
    pub fn tile_bank(&self, bank: usize) -> Option<&[u8]> {
        self.tiles.get(bank).map(|b| b.as_slice())
    }

    /// Background map 0-1 ($9800, $9C00).
    #[must_use]
    pub fn bg_map(&self, map: usize) -> Option<&[u8]> {
        self.bg_maps.get(map).map(|m| m.as_slice())
    }

    #[must_use]
    pub fn cpu_access(&self) -> bool {
        self.cpu_access
    }

    pub fn set_cpu_access(&mut self, open: bool) {
        self.cpu_access = open;
    }

    fn slot(&self, address: u16) -> Option<u8> {
        let a = usize::from(address);
        match address {
            0x8000..=0x87FF => Some(self.tiles[0][a - 0x8000]),
            0x8800..=0x8FFF => Some(self.tiles[1][a - 0x8800]),
            0x9000..=0x97FF => Some(self.tiles[2][a - 0x9000]),
            0x9800..=0x9BFF => Some(self.bg_maps[0][a - 0x9800]),
            0x9C00..=0x9FFF => Some(self.bg_maps[1][a - 0x9C00]),
            _ => None,
        }
    }
}

impl Default for Vram {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDevice for Vram {
    fn read_at(&self, address: u16) -> Option<u8> {
        let byte = self.slot(address)?;
        Some(if self.cpu_access { byte } else { 0xFF })
    }

    fn write_at(&mut self, address: u16, value: u8) {
        let a = usize::from(address);
        match address {
            0x8000..=0x87FF => self.tiles[0][a - 0x8000] = value,
            0x8800..=0x8FFF => self.tiles[1][a - 0x8800] = value,
            0x9000..=0x97FF => self.tiles[2][a - 0x9000] = value,
            0x9800..=0x9BFF => self.bg_maps[0][a - 0x9800] = value,
            0x9C00..=0x9FFF => self.bg_maps[1][a - 0x9C00] = value,
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "vram"
    }
}

// ---------------------------------------------------------------------------
// WRAM
// ---------------------------------------------------------------------------

/// Work RAM, $C000-$DFFF, echoed at $E000-$FDFF.
pub struct Wram {
    banks: [[u8; WRAM_BANK_SIZE]; 2],
}

impl Wram {
    #[must_use]
    pub fn new() -> Self {
        Self {
            banks: [[0; WRAM_BANK_SIZE]; 2],
        }
    }

    fn index(address: u16) -> Option<(usize, usize)> {
        let a = usize::from(address);
        match address {
            0xC000..=0xCFFF => Some((0, a - 0xC000)),
            0xD000..=0xDFFF => Some((1, a - 0xD000)),
            0xE000..=0xEFFF => Some((0, a - 0xE000)),
            0xF000..=0xFDFF => Some((1, a - 0xF000)),
            _ => None,
        }
    }
}

impl Default for Wram {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDevice for Wram {
    fn read_at(&self, address: u16) -> Option<u8> {
        Self::index(address).map(|(bank, offset)| self.banks[bank][offset])
    }

    fn write_at(&mut self, address: u16, value: u8) {
        if let Some((bank, offset)) = Self::index(address) {
            self.banks[bank][offset] = value;
        }
    }

    fn name(&self) -> &'static str {
        "wram"
    }
}

// ---------------------------------------------------------------------------
// HRAM
// ---------------------------------------------------------------------------

/// High RAM, $FF80-$FFFE.
pub struct Hram {
    data: [u8; HRAM_SIZE],
}

impl Hram {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: [0; HRAM_SIZE],
        }
    }
}

impl Default for Hram {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDevice for Hram {
    fn read_at(&self, address: u16) -> Option<u8> {
        match address {
            0xFF80..=0xFFFE => Some(self.data[usize::from(address - 0xFF80)]),
            _ => None,
        }
    }

    fn write_at(&mut self, address: u16, value: u8) {
        if let 0xFF80..=0xFFFE = address {
            self.data[usize::from(address - 0xFF80)] = value;
        }
    }

    fn name(&self) -> &'static str {
        "hram"
    }
}

// ---------------------------------------------------------------------------
// I/O registers
// ---------------------------------------------------------------------------

/// I/O register page, $FF00-$FF7F. Plain storage; no register has side
/// effects.
pub struct IoRegisters {
    data: [u8; IO_SIZE],
}

impl IoRegisters {
    #[must_use]
    pub fn new() -> Self {
        Self { data: [0; IO_SIZE] }
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8; IO_SIZE] {
        &self.data
    }
}

impl Default for IoRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDevice for IoRegisters {
    fn read_at(&self, address: u16) -> Option<u8> {
        match address {
            0xFF00..=0xFF7F => Some(self.data[usize::from(address - 0xFF00)]),
            _ => None,
        }
    }

    fn write_at(&mut self, address: u16, value: u8) {
        if let 0xFF00..=0xFF7F = address {
            self.data[usize::from(address - 0xFF00)] = value;
        }
    }

    fn name(&self) -> &'static str {
        "io"
    }
}
