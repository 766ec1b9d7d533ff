//! Game Boy cartridge loader.
//!
//! Parses the header at $0100-$014F, classifies the cartridge against the
//! type table and records how valid it looks. Validity problems never stop
//! a load; they are reported through [`Validity`] and force a null bank
//! controller. Only an image too short to hold a header is an error.

mod cartridge;
mod error;
mod header;
mod mbc;

pub use cartridge::Cartridge;
pub use error::CartridgeError;
pub use header::{
    CartridgeType, HEADER_END, HEADER_LOGO, Header, HeaderSummary, MbcKind, RamSize, RomSize,
    Validity, cartridge_type, global_checksum, header_checksum,
};
pub use mbc::Mbc;
