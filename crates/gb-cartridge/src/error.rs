//! Cartridge load errors.

use thiserror::Error;

/// Failure to obtain a parseable image.
///
/// A header that parses but fails validation is not an error; see
/// [`crate::Validity`].
#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("cannot read cartridge image: {0}")]
    Io(#[from] std::io::Error),
    #[error("cartridge image too short: {len} bytes, header needs $0150")]
    Truncated { len: usize },
}
