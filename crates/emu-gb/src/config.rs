//! Game Boy configuration.

/// Register state at power-on.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PowerOn {
    /// Registers as the boot program leaves them just before it unmaps
    /// itself at $00FE.
    #[default]
    PostBoot,
    /// Every register drawn from the entropy source, PC = $0000. Pair with
    /// a boot ROM.
    Randomized,
}

/// Source of the machine's undefined values: bus contention, randomized
/// power-on registers and VRAM contents at power-on.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum EntropyConfig {
    /// Reproducible pseudo-random stream.
    Seeded(u64),
    /// Seeded from the operating system.
    #[default]
    System,
    /// Always the same byte.
    Fixed(u8),
}

/// Game Boy configuration.
pub struct GbConfig {
    /// Cartridge image.
    pub rom_data: Vec<u8>,
    /// Battery save image. Kept with the cartridge, never mapped.
    pub save_data: Option<Vec<u8>>,
    /// Boot program mapped over $0000-$00FF until disabled. `None` means
    /// no overlay.
    pub boot_rom: Option<Vec<u8>>,
    pub power_on: PowerOn,
    pub entropy: EntropyConfig,
}

impl GbConfig {
    /// Defaults: post-boot registers, OS entropy, no boot ROM.
    #[must_use]
    pub fn from_rom(rom_data: Vec<u8>) -> Self {
        Self {
            rom_data,
            save_data: None,
            boot_rom: None,
            power_on: PowerOn::default(),
            entropy: EntropyConfig::default(),
        }
    }
}
