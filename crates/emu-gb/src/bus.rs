//! Game Boy bus: device registry, address routing and frame timing.
//!
//! Every read polls every device. Address ranges may overlap, so a read has
//! three outcomes:
//! - nobody claims the address: open bus, $FF;
//! - exactly one device claims it: that device's byte;
//! - several devices claim it: bus contention, an arbitrary byte from the
//!   entropy source. The value is deliberately unreproducible under
//!   `EntropyConfig::System`.
//!
//! Writes are broadcast; each device drops addresses it does not own.
//!
//! Timing is counted in machine cycles. A frame is 17,476 cycles, and LY
//! ($FF44) is recomputed from the position in the frame on every cycle.

use emu_core::{Bus, MemoryDevice, Observable, Tickable, Value};
use gb_cartridge::Cartridge;
use log::{debug, warn};

use crate::boot::{BootOverlay, REG_BOOT_OFF};
use crate::entropy::Entropy;
use crate::memory::{Hram, IoRegisters, REG_LY, Vram, Wram};

/// Cycles per frame.
pub const FRAME_CYCLES: u32 = 17_476;

/// Cycles per scanline.
pub const CYCLES_PER_SCANLINE: f64 = 113.480_52;

/// Byte read when no device answers.
pub const OPEN_BUS: u8 = 0xFF;

/// Devices that answered a read.
#[derive(Default)]
struct Claims {
    count: usize,
    first: Option<u8>,
}

impl Claims {
    fn offer(&mut self, byte: Option<u8>) {
        if let Some(byte) = byte {
            self.count += 1;
            self.first.get_or_insert(byte);
        }
    }
}

/// The Game Boy bus, implementing `emu_core::Bus`.
pub struct GbBus {
    /// Cartridge ROM ($0000-$7FFF) and external RAM ($A000-$BFFF).
    pub cartridge: Option<Cartridge>,
    /// Work RAM ($C000-$DFFF, echo $E000-$FDFF).
    pub wram: Wram,
    /// High RAM ($FF80-$FFFE).
    pub hram: Hram,
    /// Video RAM ($8000-$9FFF).
    pub vram: Vram,
    /// I/O registers ($FF00-$FF7F).
    pub io: IoRegisters,
    /// Additional devices polled after the built-in ones.
    extra: Vec<Box<dyn MemoryDevice>>,
    boot: Option<BootOverlay>,
    entropy: Box<dyn Entropy>,
    /// Position within the current frame, 0..FRAME_CYCLES.
    frame_cycles: u32,
    total_cycles: u64,
    frame_count: u64,
    /// Set on the cycle the frame counter wraps; cleared by the observer.
    frame_complete: bool,
}

impl GbBus {
    /// Build a bus. VRAM is filled from `entropy` the way real VRAM powers
    /// up holding garbage.
    #[must_use]
    pub fn new(
        cartridge: Option<Cartridge>,
        boot: Option<BootOverlay>,
        mut entropy: Box<dyn Entropy>,
    ) -> Self {
        let vram = Vram::with_garbage(entropy.as_mut());
        Self {
            cartridge,
            wram: Wram::new(),
            hram: Hram::new(),
            vram,
            io: IoRegisters::new(),
            extra: Vec::new(),
            boot,
            entropy,
            frame_cycles: 0,
            total_cycles: 0,
            frame_count: 0,
            frame_complete: false,
        }
    }

    /// Register an additional device. It is polled on every access after
    /// the built-in devices.
    pub fn attach(&mut self, device: Box<dyn MemoryDevice>) {
        self.extra.push(device);
    }

    /// Whether the boot overlay is still mapped.
    #[must_use]
    pub fn boot_active(&self) -> bool {
        self.boot.as_ref().is_some_and(BootOverlay::is_active)
    }

    /// Every device in polling order. The boot overlay is not included;
    /// it masks the others rather than competing with them.
    fn devices(&self) -> impl Iterator<Item = &dyn MemoryDevice> {
        let builtin: [&dyn MemoryDevice; 4] = [&self.wram, &self.hram, &self.vram, &self.io];
        self.cartridge
            .iter()
            .map(|cart| cart as &dyn MemoryDevice)
            .chain(builtin)
            .chain(self.extra.iter().map(|device| &**device))
    }

    fn poll(&self, address: u16) -> Claims {
        let mut claims = Claims::default();
        for device in self.devices() {
            claims.offer(device.read_at(address));
        }
        claims
    }

    /// Names of the devices claiming `address`, in polling order.
    #[must_use]
    pub fn claimants(&self, address: u16) -> Vec<&'static str> {
        self.devices()
            .filter(|device| device.read_at(address).is_some())
            .map(MemoryDevice::name)
            .collect()
    }

    fn overlay_byte(&self, address: u16) -> Option<u8> {
        self.boot.as_ref().and_then(|boot| boot.read_at(address))
    }

    /// Read through the full device-polling path.
    pub fn read_at(&mut self, address: u16) -> u8 {
        if let Some(byte) = self.overlay_byte(address) {
            return byte;
        }

        let claims = self.poll(address);
        let Some(byte) = claims.first else {
            // Without a cartridge every low read is open bus.
            if address >= 0x8000 || self.cartridge.is_some() {
                warn!("open bus read at ${address:04X}");
            }
            return OPEN_BUS;
        };
        if claims.count > 1 {
            debug!(
                "bus contention at ${address:04X}: {}",
                self.claimants(address).join(", ")
            );
            return self.entropy.next_byte();
        }
        byte
    }

    /// Read without side effects: no logging, no entropy. Contended
    /// addresses report the first claimant's byte.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.overlay_byte(address)
            .or_else(|| self.poll(address).first)
            .unwrap_or(OPEN_BUS)
    }

    /// Write through the bus. Writing anything but 1 to $FF50 unmaps the
    /// boot overlay for good; the write then goes to every device.
    pub fn write_at(&mut self, address: u16, value: u8) {
        if address == REG_BOOT_OFF && value != 1 {
            if let Some(boot) = self.boot.as_mut().filter(|boot| boot.is_active()) {
                debug!("boot ROM disabled");
                boot.disable();
            }
        }

        if let Some(cart) = &mut self.cartridge {
            cart.write_at(address, value);
        }
        self.wram.write_at(address, value);
        self.hram.write_at(address, value);
        self.vram.write_at(address, value);
        self.io.write_at(address, value);
        for device in &mut self.extra {
            device.write_at(address, value);
        }
    }

    /// Position within the current frame.
    #[must_use]
    pub fn frame_cycles(&self) -> u32 {
        self.frame_cycles
    }

    /// Cycles since power-on.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Completed frames since power-on.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Scanline for the current frame position.
    #[must_use]
    pub fn scanline(&self) -> u8 {
        (f64::from(self.frame_cycles) / CYCLES_PER_SCANLINE) as u8
    }

    /// Whether a frame has completed since the flag was last cleared.
    #[must_use]
    pub fn frame_complete(&self) -> bool {
        self.frame_complete
    }

    /// Read and clear the frame-complete flag.
    pub fn take_frame_complete(&mut self) -> bool {
        std::mem::take(&mut self.frame_complete)
    }
}

impl Bus for GbBus {
    fn read(&mut self, address: u16) -> u8 {
        self.read_at(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        self.write_at(address, value);
    }
}

impl Tickable for GbBus {
    fn tick(&mut self) {
        self.total_cycles += 1;
        self.frame_cycles += 1;
        if self.frame_cycles == FRAME_CYCLES {
            self.frame_cycles = 0;
            self.frame_count += 1;
            self.frame_complete = true;
        }
        let line = self.scanline();
        self.io.write_at(REG_LY, line);
    }
}

impl Observable for GbBus {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "frame_cycles" => Some(u64::from(self.frame_cycles).into()),
            "total_cycles" => Some(self.total_cycles.into()),
            "frame_count" => Some(self.frame_count.into()),
            "frame_complete" => Some(self.frame_complete.into()),
            "scanline" => Some(self.scanline().into()),
            "boot_active" => Some(self.boot_active().into()),
            "vram_access" => Some(self.vram.cpu_access().into()),
            "cartridge" => Some(self.cartridge.is_some().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "frame_cycles",
            "total_cycles",
            "frame_count",
            "frame_complete",
            "scanline",
            "boot_active",
            "vram_access",
            "cartridge",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::FixedEntropy;

    /// A device that claims one address.
    struct Latch {
        address: u16,
        value: u8,
    }

    impl MemoryDevice for Latch {
        fn read_at(&self, address: u16) -> Option<u8> {
            (address == self.address).then_some(self.value)
        }

        fn write_at(&mut self, address: u16, value: u8) {
            if address == self.address {
                self.value = value;
            }
        }

        fn name(&self) -> &'static str {
            "latch"
        }
    }

    fn make_bus() -> GbBus {
        GbBus::new(None, None, Box::new(FixedEntropy(0x00)))
    }

    #[test]
    fn wram_read_write() {
        let mut bus = make_bus();
        bus.write_at(0xC000, 0xAB);
        assert_eq!(bus.read_at(0xC000), 0xAB);
        assert_eq!(bus.read_at(0xE000), 0xAB);
    }

    #[test]
    fn unclaimed_address_is_open_bus() {
        let mut bus = make_bus();
        assert_eq!(bus.read_at(0xFEA0), OPEN_BUS);
        assert_eq!(bus.read_at(0xFFFF), OPEN_BUS);
        assert_eq!(bus.read_at(0x0000), OPEN_BUS);
    }

    #[test]
    fn contention_uses_entropy() {
        let mut bus = GbBus::new(None, None, Box::new(FixedEntropy(0x3C)));
        bus.attach(Box::new(Latch {
            address: 0xC000,
            value: 0x11,
        }));
        bus.write_at(0xC000, 0x22);
        assert_eq!(bus.read_at(0xC000), 0x3C);
        assert_eq!(bus.claimants(0xC000), ["wram", "latch"]);
        // Peek reports the first claimant.
        assert_eq!(bus.peek(0xC000), 0x22);
    }

    #[test]
    fn single_extra_device_answers_alone() {
        let mut bus = make_bus();
        bus.attach(Box::new(Latch {
            address: 0xFEA0,
            value: 0x42,
        }));
        assert_eq!(bus.read_at(0xFEA0), 0x42);
        bus.write_at(0xFEA0, 0x43);
        assert_eq!(bus.read_at(0xFEA0), 0x43);
    }

    #[test]
    fn overlay_masks_low_page_until_ff50() {
        let boot = BootOverlay::new(vec![0xAA; 0x100]);
        let mut bus = GbBus::new(None, Some(boot), Box::new(FixedEntropy(0x00)));
        assert!(bus.boot_active());
        assert_eq!(bus.read_at(0x0000), 0xAA);
        assert_eq!(bus.read_at(0x00FF), 0xAA);

        // Writing 1 leaves the overlay mapped.
        bus.write_at(REG_BOOT_OFF, 0x01);
        assert!(bus.boot_active());

        bus.write_at(REG_BOOT_OFF, 0x11);
        assert!(!bus.boot_active());
        assert_eq!(bus.read_at(0x0000), OPEN_BUS);

        // One-way.
        bus.write_at(REG_BOOT_OFF, 0x01);
        assert!(!bus.boot_active());
        // The write still reached the I/O page.
        assert_eq!(bus.io.bytes()[0x50], 0x01);
    }

    #[test]
    fn frame_wraps_after_frame_cycles() {
        let mut bus = make_bus();
        for _ in 0..FRAME_CYCLES - 1 {
            bus.tick();
        }
        assert!(!bus.frame_complete());
        assert_eq!(bus.frame_cycles(), FRAME_CYCLES - 1);
        assert_eq!(bus.read_at(REG_LY), 153);

        bus.tick();
        assert_eq!(bus.frame_cycles(), 0);
        assert_eq!(bus.read_at(REG_LY), 0);
        assert!(bus.take_frame_complete());
        assert!(!bus.take_frame_complete());
        assert_eq!(bus.frame_count(), 1);
        assert_eq!(bus.total_cycles(), u64::from(FRAME_CYCLES));
    }

    #[test]
    fn scanline_tracks_cycles() {
        let mut bus = make_bus();
        for _ in 0..114 {
            bus.tick();
        }
        assert_eq!(bus.scanline(), 1);
        assert_eq!(bus.io.bytes()[0x44], 1);
    }

    #[test]
    fn observable_paths() {
        let mut bus = make_bus();
        bus.tick();
        assert_eq!(bus.query("total_cycles"), Some(Value::U64(1)));
        assert_eq!(bus.query("boot_active"), Some(Value::Bool(false)));
        assert_eq!(bus.query("nope"), None);
    }
}
