//! Cartridge loading through the public API.

use emu_core::MemoryDevice;
use gb_cartridge::{
    Cartridge, CartridgeError, HEADER_LOGO, Validity, global_checksum, header_checksum,
};

/// 32 KiB ROM-only image with a correct header and checksums.
fn valid_image() -> Vec<u8> {
    let mut rom = vec![0u8; 0x8000];
    for (i, byte) in rom.iter_mut().enumerate() {
        *byte = (i % 251) as u8;
    }
    rom[0x104..0x134].copy_from_slice(&HEADER_LOGO);
    rom[0x134..0x144].copy_from_slice(b"TEST CART\0\0\0\0\0\0\0");
    rom[0x144..0x14D].fill(0);
    rom[0x14D] = header_checksum(&rom);
    let sum = global_checksum(&rom).to_be_bytes();
    rom[0x14E..0x150].copy_from_slice(&sum);
    rom
}

#[test]
fn valid_image_loads_clean() {
    let cart = Cartridge::from_bytes(valid_image(), None).expect("cartridge");
    assert_eq!(cart.validity(), Validity::Valid);
    let summary = cart.header().summary(cart.validity());
    assert_eq!(summary.title, "TEST CART");
    assert_eq!(summary.cartridge_label, "ROM ONLY");
    assert_eq!(summary.rom_size, "32 KB");
    assert_eq!(summary.ram_size, "0 B");
}

#[test]
fn logo_mismatch_wins_over_everything_else() {
    let mut rom = valid_image();
    rom[0x133] ^= 0x01;
    // Break every later check as well.
    rom[0x147] = 0x04;
    rom[0x148] = 0x20;
    rom[0x149] = 0x01;
    rom[0x14D] = rom[0x14D].wrapping_add(1);
    rom[0x14E] = rom[0x14E].wrapping_add(1);

    let cart = Cartridge::from_bytes(rom, None).expect("cartridge");
    assert_eq!(cart.validity(), Validity::LogoMismatch);
    assert_eq!(cart.mbc().kind(), None);
}

#[test]
fn corrupt_byte_outside_header_fails_global_checksum_only() {
    let mut rom = valid_image();
    rom[0x7000] = rom[0x7000].wrapping_add(1);
    let cart = Cartridge::from_bytes(rom, None).expect("cartridge");
    assert_eq!(cart.validity(), Validity::GlobalChecksumMismatch);
}

#[test]
fn bank_zero_is_the_file() {
    let rom = valid_image();
    let cart = Cartridge::from_bytes(rom.clone(), None).expect("cartridge");
    for addr in (0x0000..=0x3FFFu16).step_by(7) {
        assert_eq!(cart.read_at(addr), Some(rom[usize::from(addr)]));
    }
}

#[test]
fn open_reports_missing_file() {
    let path = std::env::temp_dir().join("gb-cartridge-does-not-exist.gb");
    let result = Cartridge::open(&path, None);
    assert!(matches!(result, Err(CartridgeError::Io(_))));
}

#[test]
fn open_reads_file_from_disk() {
    let path = std::env::temp_dir().join(format!("gb-cartridge-{}.gb", std::process::id()));
    std::fs::write(&path, valid_image()).expect("write temp rom");
    let cart = Cartridge::open(&path, None).expect("cartridge");
    std::fs::remove_file(&path).ok();
    assert_eq!(cart.validity(), Validity::Valid);
}
