//! CPU-side memory interface.

/// Memory interface as seen by a CPU.
///
/// The CPU never touches device storage directly. Every operand fetch,
/// load, store and stack access goes through this trait, and the
/// implementor decides which device answers.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);
}

/// Flat 64 KiB RAM with no devices and no side effects.
///
/// Intended for CPU unit tests where address decoding is irrelevant.
pub struct SimpleBus {
    ram: Box<[u8; 0x1_0000]>,
}

impl SimpleBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ram: Box::new([0; 0x1_0000]),
        }
    }

    /// Copy `bytes` into RAM starting at `address`, wrapping at the top.
    pub fn load(&mut self, address: u16, bytes: &[u8]) {
        let mut addr = address;
        for &b in bytes {
            self.ram[addr as usize] = b;
            addr = addr.wrapping_add(1);
        }
    }

    /// Read without going through the `Bus` trait.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.ram[address as usize]
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u16) -> u8 {
        self.ram[address as usize]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.ram[address as usize] = value;
    }
}
