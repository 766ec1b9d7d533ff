//! Loaded cartridge: image, parsed header and bank state.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use emu_core::MemoryDevice;
use log::{debug, warn};

use crate::error::CartridgeError;
use crate::header::{Header, Validity};
use crate::mbc::Mbc;

const BANK_SIZE: usize = 0x4000;

/// Byte returned for unbacked cartridge reads.
const UNMAPPED: u8 = 0xFF;

/// A cartridge image mapped at $0000-$7FFF (ROM) and $A000-$BFFF (RAM).
pub struct Cartridge {
    rom: Vec<u8>,
    save_data: Option<Vec<u8>>,
    header: Header,
    validity: Validity,
    mbc: Mbc,
}

impl Cartridge {
    /// Build a cartridge from an in-memory image.
    ///
    /// `save_data` is retained for later external-RAM support but not mapped.
    ///
    /// # Errors
    ///
    /// Returns [`CartridgeError::Truncated`] if the image is too short to
    /// hold a header.
    pub fn from_bytes(rom: Vec<u8>, save_data: Option<Vec<u8>>) -> Result<Self, CartridgeError> {
        let header = Header::parse(&rom)?;
        let validity = header.validate(&rom);

        // An invalid cartridge gets no controller whatever its type byte says.
        let kind = if validity.is_valid() {
            header.cartridge_type_info().and_then(|t| t.mbc)
        } else {
            warn!("cartridge header failed validation: {validity}");
            None
        };
        debug!(
            "cartridge \"{}\" type {} rom {} ram {}",
            header.title_str(),
            header.cartridge_label(),
            header.rom_size_label(),
            header.ram_size_label()
        );

        Ok(Self {
            rom,
            save_data,
            header,
            validity,
            mbc: Mbc::new(kind),
        })
    }

    /// Read the whole image (and optional save data) from streams.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if either stream fails, or
    /// [`CartridgeError::Truncated`] for a short image.
    pub fn from_reader<R: Read, S: Read>(mut rom: R, save: Option<S>) -> Result<Self, CartridgeError> {
        let mut image = Vec::new();
        rom.read_to_end(&mut image)?;
        let save_data = match save {
            Some(mut reader) => {
                let mut data = Vec::new();
                reader.read_to_end(&mut data)?;
                Some(data)
            }
            None => None,
        };
        Self::from_bytes(image, save_data)
    }

    /// Load a cartridge from disk.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a file cannot be opened or read, or
    /// [`CartridgeError::Truncated`] for a short image.
    pub fn open(rom_path: &Path, save_path: Option<&Path>) -> Result<Self, CartridgeError> {
        let rom = File::open(rom_path)?;
        let save = save_path.map(File::open).transpose()?;
        Self::from_reader(rom, save)
    }

    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    #[must_use]
    pub fn validity(&self) -> Validity {
        self.validity
    }

    #[must_use]
    pub fn mbc(&self) -> &Mbc {
        &self.mbc
    }

    #[must_use]
    pub fn rom(&self) -> &[u8] {
        &self.rom
    }

    #[must_use]
    pub fn save_data(&self) -> Option<&[u8]> {
        self.save_data.as_deref()
    }

    fn rom_byte(&self, offset: usize) -> u8 {
        self.rom.get(offset).copied().unwrap_or(UNMAPPED)
    }
}

impl MemoryDevice for Cartridge {
    fn read_at(&self, address: u16) -> Option<u8> {
        match address {
            // Bank 0 is fixed.
            0x0000..=0x3FFF => Some(self.rom_byte(usize::from(address))),
            0x4000..=0x7FFF => {
                let offset = self.mbc.rom_bank() * BANK_SIZE + usize::from(address - 0x4000);
                Some(self.rom_byte(offset))
            }
            // External RAM is never loaded.
            0xA000..=0xBFFF => Some(UNMAPPED),
            _ => None,
        }
    }

    fn write_at(&mut self, address: u16, value: u8) {
        if address <= 0x7FFF {
            self.mbc.write(address, value);
        }
    }

    fn name(&self) -> &'static str {
        "rom"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{HEADER_LOGO, header_checksum};

    fn make_rom(banks: usize) -> Vec<u8> {
        let mut rom: Vec<u8> = (0..banks * BANK_SIZE).map(|i| (i / BANK_SIZE) as u8 ^ i as u8).collect();
        rom[0x104..0x134].copy_from_slice(&HEADER_LOGO);
        rom[0x147] = 0x01;
        rom[0x148] = 0x01;
        rom[0x149] = 0x00;
        rom
    }

    #[test]
    fn bank_zero_reads_match_file_offsets() {
        let rom = make_rom(4);
        let cart = Cartridge::from_bytes(rom.clone(), None).expect("cartridge");
        for addr in 0x0000..=0x3FFFu16 {
            assert_eq!(cart.read_at(addr), Some(rom[usize::from(addr)]));
        }
    }

    #[test]
    fn switchable_window_shows_bank_one() {
        let rom = make_rom(4);
        let cart = Cartridge::from_bytes(rom.clone(), None).expect("cartridge");
        assert_eq!(cart.read_at(0x4000), Some(rom[0x4000]));
        assert_eq!(cart.read_at(0x7FFF), Some(rom[0x7FFF]));
    }

    #[test]
    fn bank_writes_do_not_move_bank_zero_or_one() {
        let rom = make_rom(4);
        let mut cart = Cartridge::from_bytes(rom.clone(), None).expect("cartridge");
        cart.write_at(0x2000, 0x03);
        assert_eq!(cart.read_at(0x0150), Some(rom[0x0150]));
        assert_eq!(cart.read_at(0x4000), Some(rom[0x4000]));
        assert_eq!(cart.mbc().rom_bank(), 1);
    }

    #[test]
    fn external_ram_reads_ff_and_other_ranges_decline() {
        let cart = Cartridge::from_bytes(make_rom(2), None).expect("cartridge");
        assert_eq!(cart.read_at(0xA000), Some(0xFF));
        assert_eq!(cart.read_at(0xBFFF), Some(0xFF));
        assert_eq!(cart.read_at(0x8000), None);
        assert_eq!(cart.read_at(0xC000), None);
        assert_eq!(cart.read_at(0xFF44), None);
    }

    #[test]
    fn short_image_reads_ff_past_the_end() {
        let mut rom = vec![0u8; 0x200];
        rom[0x104..0x134].copy_from_slice(&HEADER_LOGO);
        let cart = Cartridge::from_bytes(rom, None).expect("cartridge");
        assert_eq!(cart.read_at(0x01FF), Some(0x00));
        assert_eq!(cart.read_at(0x0200), Some(0xFF));
        assert_eq!(cart.read_at(0x4000), Some(0xFF));
    }

    #[test]
    fn invalid_cartridge_has_no_controller() {
        let mut rom = make_rom(2);
        rom[0x104] = 0x00;
        let cart = Cartridge::from_bytes(rom, None).expect("cartridge");
        assert_eq!(cart.validity(), Validity::LogoMismatch);
        assert_eq!(cart.mbc().kind(), None);
    }

    #[test]
    fn valid_cartridge_keeps_its_controller() {
        let mut rom = make_rom(2);
        rom[0x14D] = header_checksum(&rom);
        let sum = crate::header::global_checksum(&rom).to_be_bytes();
        rom[0x14E..0x150].copy_from_slice(&sum);
        let cart = Cartridge::from_bytes(rom, None).expect("cartridge");
        assert_eq!(cart.validity(), Validity::Valid);
        assert_eq!(cart.mbc().kind(), Some(crate::header::MbcKind::Mbc1));
    }

    #[test]
    fn from_reader_keeps_save_data() {
        let rom = make_rom(2);
        let save = [1u8, 2, 3];
        let cart = Cartridge::from_reader(rom.as_slice(), Some(&save[..])).expect("cartridge");
        assert_eq!(cart.save_data(), Some(&[1u8, 2, 3][..]));
        assert_eq!(cart.rom().len(), 2 * BANK_SIZE);
    }

    #[test]
    fn truncated_image_fails_to_load() {
        let result = Cartridge::from_bytes(vec![0; 0x100], None);
        assert!(matches!(result, Err(CartridgeError::Truncated { len: 0x100 })));
    }
}
