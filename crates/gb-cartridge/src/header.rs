//! Cartridge header: raw fields, lookup tables and checksums.
//!
//! Layout (offsets into the image):
//!
//! | offset        | field                                            |
//! |---------------|--------------------------------------------------|
//! | $0104-$0133   | logo (must equal [`HEADER_LOGO`])                |
//! | $0134-$0143   | title; $013F-$0142 manufacturer, $0143 CGB flag  |
//! | $0144-$0145   | new licensee code                                |
//! | $0146         | SGB flag                                         |
//! | $0147         | cartridge type                                   |
//! | $0148         | ROM size code                                    |
//! | $0149         | RAM size code                                    |
//! | $014A         | destination code                                 |
//! | $014B         | old licensee code                                |
//! | $014C         | mask ROM version                                 |
//! | $014D         | header checksum                                  |
//! | $014E-$014F   | global checksum, big-endian                      |

use std::fmt;

use crate::error::CartridgeError;

/// First offset past the header. Shorter images cannot be parsed.
pub const HEADER_END: usize = 0x150;

const LOGO_START: usize = 0x104;
const TITLE_START: usize = 0x134;
const HEADER_CHECKSUM: usize = 0x14D;
const GLOBAL_CHECKSUM: usize = 0x14E;

/// Logo bitmap every licensed cartridge carries at $0104.
pub const HEADER_LOGO: [u8; 48] = [
    0xCE, 0xED, 0x66, 0x66, 0xCC, 0x0D, 0x00, 0x0B, //
    0x03, 0x73, 0x00, 0x83, 0x00, 0x0C, 0x00, 0x0D, //
    0x00, 0x08, 0x11, 0x1F, 0x88, 0x89, 0x00, 0x0E, //
    0xDC, 0xCC, 0x6E, 0xE6, 0xDD, 0xDD, 0xD9, 0x99, //
    0xBB, 0xBB, 0x67, 0x63, 0x6E, 0x0E, 0xEC, 0xCC, //
    0xDD, 0xDC, 0x99, 0x9F, 0xBB, 0xB9, 0x33, 0x3E,
];

// ---------------------------------------------------------------------------
// Cartridge type table
// ---------------------------------------------------------------------------

/// Bank controller family named by the cartridge type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MbcKind {
    Mbc1,
    Mbc2,
    Mmm01,
    Mbc3,
    Mbc5,
    Mbc6,
    Mbc7,
    HuC3,
    HuC1,
}

impl fmt::Display for MbcKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mbc1 => "MBC1",
            Self::Mbc2 => "MBC2",
            Self::Mmm01 => "MMM01",
            Self::Mbc3 => "MBC3",
            Self::Mbc5 => "MBC5",
            Self::Mbc6 => "MBC6",
            Self::Mbc7 => "MBC7",
            Self::HuC3 => "HuC3",
            Self::HuC1 => "HuC1",
        };
        f.write_str(name)
    }
}

/// One row of the cartridge type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartridgeType {
    pub code: u8,
    /// `None` for carts without a bank controller (or one we don't model).
    pub mbc: Option<MbcKind>,
    pub label: &'static str,
}

/// Look up a cartridge type byte. `None` means the code is not in the table.
#[must_use]
pub const fn cartridge_type(code: u8) -> Option<CartridgeType> {
    use MbcKind::{HuC1, HuC3, Mbc1, Mbc2, Mbc3, Mbc5, Mbc6, Mbc7, Mmm01};

    let (mbc, label) = match code {
        0x00 => (None, "ROM ONLY"),
        0x01 => (Some(Mbc1), "MBC1"),
        0x02 => (Some(Mbc1), "MBC1+RAM"),
        0x03 => (Some(Mbc1), "MBC1+RAM+BATTERY"),
        0x05 => (Some(Mbc2), "MBC2"),
        0x06 => (Some(Mbc2), "MBC2+BATTERY"),
        0x08 => (None, "ROM+RAM"),
        0x09 => (None, "ROM+RAM+BATTERY"),
        0x0B => (Some(Mmm01), "MMM01"),
        0x0C => (Some(Mmm01), "MMM01+RAM"),
        0x0D => (Some(Mmm01), "MMM01+RAM+BATTERY"),
        0x0F => (Some(Mbc3), "MBC3+TIMER+BATTERY"),
        0x10 => (Some(Mbc3), "MBC3+TIMER+RAM+BATTERY"),
        0x11 => (Some(Mbc3), "MBC3"),
        0x12 => (Some(Mbc3), "MBC3+RAM"),
        0x13 => (Some(Mbc3), "MBC3+RAM+BATTERY"),
        0x19 => (Some(Mbc5), "MBC5"),
        0x1A => (Some(Mbc5), "MBC5+RAM"),
        0x1B => (Some(Mbc5), "MBC5+RAM+BATTERY"),
        0x1C => (Some(Mbc5), "MBC5+RUMBLE"),
        0x1D => (Some(Mbc5), "MBC5+RUMBLE+RAM"),
        0x1E => (Some(Mbc5), "MBC5+RUMBLE+RAM+BATTERY"),
        0x20 => (Some(Mbc6), "MBC6"),
        0x22 => (Some(Mbc7), "MBC7+SENSOR+RUMBLE+RAM+BATTERY"),
        0xFC => (None, "POCKET CAMERA"),
        0xFD => (None, "BANTAI TAMA5"),
        0xFE => (Some(HuC3), "HuC3"),
        0xFF => (Some(HuC1), "HuC1+RAM+BATTERY"),
        _ => return None,
    };
    Some(CartridgeType { code, mbc, label })
}

// ---------------------------------------------------------------------------
// Size codes
// ---------------------------------------------------------------------------

/// Decoded ROM size code (valid for codes 0-8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomSize {
    pub code: u8,
    /// Number of 16 KiB banks.
    pub banks: u16,
}

impl RomSize {
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        if code > 8 {
            return None;
        }
        Some(Self {
            code,
            banks: 2 << code,
        })
    }

    /// "32 KB" .. "512 KB", then "1 MB" .. "8 MB".
    #[must_use]
    pub fn label(&self) -> String {
        if self.banks < 64 {
            format!("{} KB", u32::from(self.banks) * 16)
        } else {
            format!("{} MB", self.banks / 64)
        }
    }
}

/// Decoded RAM size code (valid for codes 0, 2, 3, 4, 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RamSize {
    pub code: u8,
    /// Number of 8 KiB banks.
    pub banks: u8,
    pub label: &'static str,
}

impl RamSize {
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        let (banks, label) = match code {
            0 => (0, "0 B"),
            2 => (1, "8 KB"),
            3 => (4, "32 KB"),
            4 => (16, "128 KB"),
            5 => (8, "64 KB"),
            _ => return None,
        };
        Some(Self { code, banks, label })
    }
}

fn error_label(code: u8) -> String {
    format!("ERR ${code:02X}")
}

// ---------------------------------------------------------------------------
// Checksums
// ---------------------------------------------------------------------------

/// Header checksum over $0134-$014C: `chk = chk - byte - 1` for each byte.
#[must_use]
pub fn header_checksum(image: &[u8]) -> u8 {
    image
        .iter()
        .take(HEADER_CHECKSUM)
        .skip(TITLE_START)
        .fold(0u8, |chk, &byte| chk.wrapping_sub(byte).wrapping_sub(1))
}

/// Sum of every image byte except the two global checksum bytes, mod $10000.
#[must_use]
pub fn global_checksum(image: &[u8]) -> u16 {
    image
        .iter()
        .enumerate()
        .filter(|&(offset, _)| offset != GLOBAL_CHECKSUM && offset != GLOBAL_CHECKSUM + 1)
        .fold(0u16, |sum, (_, &byte)| sum.wrapping_add(u16::from(byte)))
}

// ---------------------------------------------------------------------------
// Validity
// ---------------------------------------------------------------------------

/// How far a cartridge got through header validation.
///
/// Checks run in declaration order and the first failure is recorded; a
/// later check is only reported when every earlier one passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Validity {
    Valid,
    LogoMismatch,
    UnknownCartridgeType,
    BadRomSizeCode,
    BadRamSizeCode,
    HeaderChecksumMismatch,
    GlobalChecksumMismatch,
}

impl Validity {
    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Valid => "valid",
            Self::LogoMismatch => "logo mismatch",
            Self::UnknownCartridgeType => "unknown cartridge type",
            Self::BadRomSizeCode => "bad ROM size code",
            Self::BadRamSizeCode => "bad RAM size code",
            Self::HeaderChecksumMismatch => "header checksum mismatch",
            Self::GlobalChecksumMismatch => "global checksum mismatch",
        };
        f.write_str(text)
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Raw header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub logo: [u8; 48],
    /// Full 16-byte title area, including the manufacturer code and CGB
    /// flag carved from its tail.
    pub title: [u8; 16],
    pub manufacturer: [u8; 4],
    pub cgb_flag: u8,
    pub new_licensee: [u8; 2],
    pub sgb_flag: u8,
    pub cartridge_type: u8,
    pub rom_size_code: u8,
    pub ram_size_code: u8,
    pub destination: u8,
    pub old_licensee: u8,
    pub mask_rom_version: u8,
    pub header_checksum: u8,
    pub global_checksum: u16,
}

impl Header {
    /// Parse the header out of a full cartridge image.
    ///
    /// # Errors
    ///
    /// Returns [`CartridgeError::Truncated`] if the image ends before $0150.
    pub fn parse(image: &[u8]) -> Result<Self, CartridgeError> {
        if image.len() < HEADER_END {
            return Err(CartridgeError::Truncated { len: image.len() });
        }

        let mut logo = [0; 48];
        logo.copy_from_slice(&image[LOGO_START..TITLE_START]);
        let mut title = [0; 16];
        title.copy_from_slice(&image[TITLE_START..TITLE_START + 16]);
        let mut manufacturer = [0; 4];
        manufacturer.copy_from_slice(&title[0x0B..0x0F]);

        Ok(Self {
            logo,
            title,
            manufacturer,
            cgb_flag: title[0x0F],
            new_licensee: [image[0x144], image[0x145]],
            sgb_flag: image[0x146],
            cartridge_type: image[0x147],
            rom_size_code: image[0x148],
            ram_size_code: image[0x149],
            destination: image[0x14A],
            old_licensee: image[0x14B],
            mask_rom_version: image[0x14C],
            header_checksum: image[HEADER_CHECKSUM],
            global_checksum: u16::from_be_bytes([image[GLOBAL_CHECKSUM], image[GLOBAL_CHECKSUM + 1]]),
        })
    }

    /// Run the validity checks in order against the image this header came
    /// from. Stops at the first failure.
    #[must_use]
    pub fn validate(&self, image: &[u8]) -> Validity {
        if self.logo != HEADER_LOGO {
            Validity::LogoMismatch
        } else if self.cartridge_type_info().is_none() {
            Validity::UnknownCartridgeType
        } else if self.rom_size().is_none() {
            Validity::BadRomSizeCode
        } else if self.ram_size().is_none() {
            Validity::BadRamSizeCode
        } else if header_checksum(image) != self.header_checksum {
            Validity::HeaderChecksumMismatch
        } else if global_checksum(image) != self.global_checksum {
            Validity::GlobalChecksumMismatch
        } else {
            Validity::Valid
        }
    }

    /// Title up to the first NUL, non-ASCII bytes replaced.
    #[must_use]
    pub fn title_str(&self) -> String {
        let end = self.title.iter().position(|&b| b == 0).unwrap_or(self.title.len());
        self.title[..end]
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { char::from(b) } else { '?' })
            .collect()
    }

    #[must_use]
    pub const fn cartridge_type_info(&self) -> Option<CartridgeType> {
        cartridge_type(self.cartridge_type)
    }

    #[must_use]
    pub const fn rom_size(&self) -> Option<RomSize> {
        RomSize::from_code(self.rom_size_code)
    }

    #[must_use]
    pub const fn ram_size(&self) -> Option<RamSize> {
        RamSize::from_code(self.ram_size_code)
    }

    /// Table label, or `ERR $XX` for an unknown type byte.
    #[must_use]
    pub fn cartridge_label(&self) -> String {
        self.cartridge_type_info()
            .map_or_else(|| error_label(self.cartridge_type), |t| t.label.to_string())
    }

    #[must_use]
    pub fn rom_size_label(&self) -> String {
        self.rom_size()
            .map_or_else(|| error_label(self.rom_size_code), |size| size.label())
    }

    #[must_use]
    pub fn ram_size_label(&self) -> String {
        self.ram_size()
            .map_or_else(|| error_label(self.ram_size_code), |size| size.label.to_string())
    }

    /// Display-ready copy of the header.
    #[must_use]
    pub fn summary(&self, validity: Validity) -> HeaderSummary {
        HeaderSummary {
            title: self.title_str(),
            manufacturer: String::from_utf8_lossy(&self.manufacturer).into_owned(),
            cgb_flag: self.cgb_flag,
            new_licensee: String::from_utf8_lossy(&self.new_licensee).into_owned(),
            sgb_flag: self.sgb_flag,
            cartridge_type: self.cartridge_type,
            cartridge_label: self.cartridge_label(),
            mbc: self.cartridge_type_info().and_then(|t| t.mbc),
            rom_banks: self.rom_size().map(|size| size.banks),
            rom_size: self.rom_size_label(),
            ram_banks: self.ram_size().map(|size| size.banks),
            ram_size: self.ram_size_label(),
            destination: self.destination,
            old_licensee: self.old_licensee,
            mask_rom_version: self.mask_rom_version,
            header_checksum: self.header_checksum,
            global_checksum: self.global_checksum,
            validity,
        }
    }
}

/// Header fields decoded to presentation form.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HeaderSummary {
    pub title: String,
    pub manufacturer: String,
    pub cgb_flag: u8,
    pub new_licensee: String,
    pub sgb_flag: u8,
    pub cartridge_type: u8,
    pub cartridge_label: String,
    pub mbc: Option<MbcKind>,
    pub rom_banks: Option<u16>,
    pub rom_size: String,
    pub ram_banks: Option<u8>,
    pub ram_size: String,
    pub destination: u8,
    pub old_licensee: u8,
    pub mask_rom_version: u8,
    pub header_checksum: u8,
    pub global_checksum: u16,
    pub validity: Validity,
}

impl fmt::Display for HeaderSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Title:           {}", self.title)?;
        writeln!(f, "Manufacturer:    {}", self.manufacturer)?;
        writeln!(f, "CGB flag:        ${:02X}", self.cgb_flag)?;
        writeln!(f, "Licensee:        {}", self.new_licensee)?;
        writeln!(f, "SGB flag:        ${:02X}", self.sgb_flag)?;
        writeln!(f, "Cartridge type:  {}", self.cartridge_label)?;
        writeln!(f, "ROM size:        {}", self.rom_size)?;
        writeln!(f, "RAM size:        {}", self.ram_size)?;
        writeln!(f, "Destination:     ${:02X}", self.destination)?;
        writeln!(f, "Old licensee:    ${:02X}", self.old_licensee)?;
        writeln!(f, "Version:         ${:02X}", self.mask_rom_version)?;
        writeln!(f, "Header checksum: ${:02X}", self.header_checksum)?;
        writeln!(f, "Global checksum: ${:04X}", self.global_checksum)?;
        write!(f, "Validity:        {}", self.validity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_image() -> Vec<u8> {
        let mut image = vec![0u8; 0x8000];
        image[LOGO_START..TITLE_START].copy_from_slice(&HEADER_LOGO);
        image[TITLE_START..TITLE_START + 5].copy_from_slice(b"TETRA");
        image
    }

    fn fix_checksums(image: &mut [u8]) {
        image[HEADER_CHECKSUM] = header_checksum(image);
        let global = global_checksum(image).to_be_bytes();
        image[GLOBAL_CHECKSUM] = global[0];
        image[GLOBAL_CHECKSUM + 1] = global[1];
    }

    fn validity_of(image: &[u8]) -> Validity {
        Header::parse(image).expect("header").validate(image)
    }

    #[test]
    fn well_formed_image_is_valid() {
        let mut image = blank_image();
        fix_checksums(&mut image);
        assert_eq!(validity_of(&image), Validity::Valid);
    }

    #[test]
    fn summary_ends_on_the_validity_line() {
        let mut image = blank_image();
        fix_checksums(&mut image);
        let header = Header::parse(&image).expect("header");
        let text = header.summary(Validity::Valid).to_string();
        assert!(text.starts_with("Title:           TETRA\n"));
        // No trailing newline; printers add their own.
        assert_eq!(text.lines().last(), Some("Validity:        valid"));
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn truncated_image_is_an_error() {
        let image = vec![0u8; 0x14F];
        assert!(matches!(
            Header::parse(&image),
            Err(CartridgeError::Truncated { len: 0x14F })
        ));
    }

    #[test]
    fn header_checksum_formula() {
        // All-zero header area: 25 bytes, each subtracting 1.
        let image = vec![0u8; HEADER_END];
        assert_eq!(header_checksum(&image), 0u8.wrapping_sub(25));

        let mut image = vec![0u8; HEADER_END];
        image[0x134] = 0x10;
        assert_eq!(header_checksum(&image), 0u8.wrapping_sub(25).wrapping_sub(0x10));
    }

    #[test]
    fn global_checksum_skips_its_own_bytes() {
        let mut image = vec![0u8; HEADER_END];
        image[0] = 0xFF;
        image[0x14E] = 0x12;
        image[0x14F] = 0x34;
        image[0x14D] = 0x01;
        assert_eq!(global_checksum(&image), 0x100);
    }

    #[test]
    fn first_failure_wins() {
        let mut image = blank_image();
        image[0x147] = 0x04; // not in the table
        image[0x148] = 0x09; // bad ROM size code too
        image[0x14D] = 0x00; // and a wrong checksum
        assert_eq!(validity_of(&image), Validity::UnknownCartridgeType);

        image[0x147] = 0x01;
        assert_eq!(validity_of(&image), Validity::BadRomSizeCode);

        image[0x148] = 0x01;
        image[0x149] = 0x01;
        assert_eq!(validity_of(&image), Validity::BadRamSizeCode);

        image[0x149] = 0x02;
        assert_eq!(validity_of(&image), Validity::HeaderChecksumMismatch);

        image[0x14D] = header_checksum(&image);
        assert_eq!(validity_of(&image), Validity::GlobalChecksumMismatch);
    }

    #[test]
    fn header_checksum_mismatch_iff_bytes_differ() {
        let mut image = blank_image();
        fix_checksums(&mut image);
        let good = image[HEADER_CHECKSUM];
        for stored in [good.wrapping_add(1), good.wrapping_sub(1), !good] {
            image[HEADER_CHECKSUM] = stored;
            assert_eq!(validity_of(&image), Validity::HeaderChecksumMismatch);
        }
        // Earlier failure masks it.
        image[0x104] ^= 0xFF;
        assert_eq!(validity_of(&image), Validity::LogoMismatch);
    }

    #[test]
    fn validity_ordering() {
        assert!(Validity::Valid < Validity::LogoMismatch);
        assert!(Validity::BadRamSizeCode < Validity::HeaderChecksumMismatch);
        assert!(Validity::HeaderChecksumMismatch < Validity::GlobalChecksumMismatch);
    }

    #[test]
    fn rom_size_labels() {
        let label = |code| RomSize::from_code(code).map(|s| (s.banks, s.label()));
        assert_eq!(label(0), Some((2, "32 KB".to_string())));
        assert_eq!(label(4), Some((32, "512 KB".to_string())));
        assert_eq!(label(5), Some((64, "1 MB".to_string())));
        assert_eq!(label(8), Some((512, "8 MB".to_string())));
        assert_eq!(label(9), None);
    }

    #[test]
    fn ram_size_table() {
        assert_eq!(RamSize::from_code(0).map(|s| s.banks), Some(0));
        assert_eq!(RamSize::from_code(1), None);
        assert_eq!(RamSize::from_code(3).map(|s| s.label), Some("32 KB"));
        assert_eq!(RamSize::from_code(5).map(|s| s.banks), Some(8));
        assert_eq!(RamSize::from_code(6), None);
    }

    #[test]
    fn error_labels_for_unknown_codes() {
        let mut image = blank_image();
        image[0x147] = 0x04;
        image[0x148] = 0x0A;
        image[0x149] = 0x07;
        let header = Header::parse(&image).expect("header");
        assert_eq!(header.cartridge_label(), "ERR $04");
        assert_eq!(header.rom_size_label(), "ERR $0A");
        assert_eq!(header.ram_size_label(), "ERR $07");
    }

    #[test]
    fn title_and_carved_fields() {
        let mut image = blank_image();
        image[0x13F..0x143].copy_from_slice(b"ABCD");
        image[0x143] = 0x80;
        let header = Header::parse(&image).expect("header");
        assert_eq!(header.title_str(), "TETRA");
        assert_eq!(&header.manufacturer, b"ABCD");
        assert_eq!(header.cgb_flag, 0x80);
    }

    #[test]
    fn type_table_lookup() {
        let mbc3 = cartridge_type(0x13).expect("listed");
        assert_eq!(mbc3.mbc, Some(MbcKind::Mbc3));
        assert_eq!(mbc3.label, "MBC3+RAM+BATTERY");
        assert_eq!(cartridge_type(0x00).map(|t| t.mbc), Some(None));
        assert!(cartridge_type(0x04).is_none());
    }
}
