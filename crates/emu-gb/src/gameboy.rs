//! Top-level Game Boy system.
//!
//! The machine is instruction-stepped. Each step fetches through the bus,
//! executes, then ticks the bus once per machine cycle the instruction
//! costs. The bus owns all timing: a frame is 17,476 cycles and LY follows
//! the position in the frame.

use std::collections::VecDeque;

use emu_core::{Observable, Tickable, Ticks, Value};
use gb_cartridge::{Cartridge, HeaderSummary};
use log::{trace, warn};
use sharp_lr35902::opcodes::{self, CB_PREFIX};
use sharp_lr35902::{Lr35902, Registers};

use crate::boot::BootOverlay;
use crate::bus::GbBus;
use crate::config::{GbConfig, PowerOn};
use crate::error::{ConfigError, StepError};
use crate::trace::Trace;

/// Number of trace records kept for diagnostics.
pub const HISTORY_LEN: usize = 30;

/// Result of [`GameBoy::step_n`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct StepSummary {
    /// Instructions executed.
    pub executed: usize,
    /// Stepping stopped early because PC reached the breakpoint.
    pub hit_breakpoint: bool,
}

/// Why [`GameBoy::run_until_frame`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    FrameComplete,
    Breakpoint,
}

/// Result of [`GameBoy::run_until_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RunOutcome {
    pub stop: StopReason,
    /// Instructions executed during the call.
    pub instructions: usize,
    /// Whether a free-running driver should keep going.
    pub keep_running: bool,
}

/// Game Boy system.
pub struct GameBoy {
    cpu: Lr35902,
    bus: GbBus,
    /// Most recent instructions, oldest first.
    history: VecDeque<Trace>,
    breakpoint: Option<u16>,
}

impl GameBoy {
    /// Create a Game Boy from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the cartridge image is too short to hold a
    /// header. Header validation failures are not errors; see
    /// [`Cartridge::validity`].
    pub fn new(config: &GbConfig) -> Result<Self, ConfigError> {
        let cartridge = Cartridge::from_bytes(config.rom_data.clone(), config.save_data.clone())?;
        let boot = config.boot_rom.clone().map(BootOverlay::new);

        let mut entropy = config.entropy.build();
        let regs = match config.power_on {
            PowerOn::PostBoot => Registers::POST_BOOT,
            PowerOn::Randomized => Registers::randomized(|| entropy.next_byte()),
        };

        let bus = GbBus::new(Some(cartridge), boot, entropy);
        Ok(Self::with_bus(Lr35902::with_registers(regs), bus))
    }

    /// Assemble a machine from an existing CPU and bus.
    #[must_use]
    pub fn with_bus(cpu: Lr35902, bus: GbBus) -> Self {
        Self {
            cpu,
            bus,
            history: VecDeque::with_capacity(HISTORY_LEN),
            breakpoint: None,
        }
    }

    /// Execute one instruction.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::UnknownOpcode`] when the opcode byte is not in
    /// the opcode table, and [`StepError::Unimplemented`] when it is but has
    /// no execution routine. PC has moved past the fetched bytes either way
    /// and no cycles are charged.
    pub fn step_one(&mut self) -> Result<Trace, StepError> {
        let address = self.cpu.regs.pc;
        let opcode = self.cpu.fetch(&mut self.bus);
        let Some(desc) = opcodes::lookup(opcode) else {
            warn!("unknown opcode ${opcode:02X} at ${address:04X}");
            return Err(StepError::UnknownOpcode { opcode, address });
        };

        let mut bytes = vec![opcode];
        let mut operand = 0u16;
        for i in 0..desc.operand_len {
            let byte = self.cpu.fetch(&mut self.bus);
            bytes.push(byte);
            operand |= u16::from(byte) << (8 * i);
        }

        let (mnemonic, mut cycles) = if opcode == CB_PREFIX {
            let cb = opcodes::lookup_cb(operand as u8);
            (cb.to_string(), desc.base_cycles + cb.extra_cycles())
        } else {
            (
                desc.disassemble(operand, self.cpu.regs.pc),
                desc.base_cycles,
            )
        };

        cycles += self
            .cpu
            .execute(&mut self.bus, opcode, operand)
            .map_err(|source| StepError::Unimplemented { address, source })?;
        self.bus.tick_n(Ticks::from(cycles));

        let record = Trace {
            address,
            bytes,
            mnemonic,
        };
        trace!("{record}");
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(record.clone());
        Ok(record)
    }

    /// Execute up to `count` instructions, stopping early once PC equals
    /// `breakpoint`.
    ///
    /// # Errors
    ///
    /// Stops at the first failing instruction; see [`Self::step_one`].
    pub fn step_n(&mut self, count: usize, breakpoint: Option<u16>) -> Result<StepSummary, StepError> {
        let mut executed = 0;
        while executed < count {
            self.step_one()?;
            executed += 1;
            if breakpoint == Some(self.cpu.regs.pc) {
                return Ok(StepSummary {
                    executed,
                    hit_breakpoint: true,
                });
            }
        }
        Ok(StepSummary {
            executed,
            hit_breakpoint: false,
        })
    }

    /// Run until the frame-complete edge or the stored breakpoint.
    ///
    /// The frame flag is consumed. `keep_running` is false after a
    /// breakpoint, or after a frame when `stop_after_one_frame` is set.
    ///
    /// # Errors
    ///
    /// Stops at the first failing instruction; see [`Self::step_one`].
    pub fn run_until_frame(&mut self, stop_after_one_frame: bool) -> Result<RunOutcome, StepError> {
        let mut instructions = 0;
        loop {
            self.step_one()?;
            instructions += 1;
            if self.breakpoint == Some(self.cpu.regs.pc) {
                return Ok(RunOutcome {
                    stop: StopReason::Breakpoint,
                    instructions,
                    keep_running: false,
                });
            }
            if self.bus.take_frame_complete() {
                return Ok(RunOutcome {
                    stop: StopReason::FrameComplete,
                    instructions,
                    keep_running: !stop_after_one_frame,
                });
            }
        }
    }

    /// Write a byte through the bus write path, as the CPU would.
    pub fn poke(&mut self, address: u16, value: u8) {
        self.bus.write_at(address, value);
    }

    /// Read a byte without side effects.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.bus.peek(address)
    }

    #[must_use]
    pub fn breakpoint(&self) -> Option<u16> {
        self.breakpoint
    }

    pub fn set_breakpoint(&mut self, breakpoint: Option<u16>) {
        self.breakpoint = breakpoint;
    }

    /// Reference to the CPU.
    #[must_use]
    pub fn cpu(&self) -> &Lr35902 {
        &self.cpu
    }

    /// Mutable reference to the CPU.
    pub fn cpu_mut(&mut self) -> &mut Lr35902 {
        &mut self.cpu
    }

    /// Reference to the bus.
    #[must_use]
    pub fn bus(&self) -> &GbBus {
        &self.bus
    }

    /// Mutable reference to the bus.
    pub fn bus_mut(&mut self) -> &mut GbBus {
        &mut self.bus
    }

    #[must_use]
    pub fn registers(&self) -> Registers {
        self.cpu.regs
    }

    /// Recent instructions, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Trace> {
        self.history.iter()
    }

    #[must_use]
    pub fn cartridge(&self) -> Option<&Cartridge> {
        self.bus.cartridge.as_ref()
    }

    #[must_use]
    pub fn header_summary(&self) -> Option<HeaderSummary> {
        self.cartridge()
            .map(|cart| cart.header().summary(cart.validity()))
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.bus.frame_count()
    }

    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.bus.total_cycles()
    }

    fn query_cart(&self, path: &str) -> Option<Value> {
        let cart = self.cartridge()?;
        let header = cart.header();
        match path {
            "title" => Some(header.title_str().into()),
            "logo" => Some(Value::Bytes(header.logo.to_vec())),
            "type" => Some(header.cartridge_label().into()),
            "rom_size" => Some(header.rom_size_label().into()),
            "ram_size" => Some(header.ram_size_label().into()),
            "validity" => Some(cart.validity().to_string().into()),
            "header_checksum" => Some(header.header_checksum.into()),
            "global_checksum" => Some(header.global_checksum.into()),
            "rom_bank" => u64::try_from(cart.mbc().rom_bank()).ok().map(Value::U64),
            _ => None,
        }
    }
}

/// Parse `0x1234`, `$1234` or decimal.
pub(crate) fn parse_address(text: &str) -> Option<u16> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16).ok()
    } else if let Some(hex) = text.strip_prefix('$') {
        u16::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

impl Observable for GameBoy {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("cpu.") {
            self.cpu.query(rest)
        } else if let Some(rest) = path.strip_prefix("bus.") {
            self.bus.query(rest)
        } else if let Some(rest) = path.strip_prefix("cart.") {
            self.query_cart(rest)
        } else if let Some(rest) = path.strip_prefix("memory.") {
            parse_address(rest).map(|a| Value::U8(self.bus.peek(a)))
        } else {
            match path {
                "frame_count" => Some(self.frame_count().into()),
                "total_cycles" => Some(self.total_cycles().into()),
                _ => self.cpu.query(path),
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "cpu.<lr35902_paths>",
            "bus.frame_cycles",
            "bus.total_cycles",
            "bus.frame_count",
            "bus.frame_complete",
            "bus.scanline",
            "bus.boot_active",
            "bus.vram_access",
            "bus.cartridge",
            "cart.title",
            "cart.logo",
            "cart.type",
            "cart.rom_size",
            "cart.ram_size",
            "cart.validity",
            "cart.header_checksum",
            "cart.global_checksum",
            "cart.rom_bank",
            "memory.<address>",
            "frame_count",
            "total_cycles",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::FixedEntropy;

    /// Machine with no cartridge and `program` in WRAM at $C000.
    fn make_gb(program: &[u8]) -> GameBoy {
        let mut bus = GbBus::new(None, None, Box::new(FixedEntropy(0)));
        for (i, &byte) in program.iter().enumerate() {
            bus.write_at(0xC000 + i as u16, byte);
        }
        let mut cpu = Lr35902::new();
        cpu.regs.pc = 0xC000;
        GameBoy::with_bus(cpu, bus)
    }

    #[test]
    fn load_immediate_costs_two_cycles() {
        let mut gb = make_gb(&[0x3E, 0x7B]);
        let record = gb.step_one().expect("step");
        assert_eq!(gb.registers().a, 0x7B);
        assert_eq!(gb.registers().pc, 0xC002);
        assert_eq!(gb.total_cycles(), 2);
        assert_eq!(record.bytes, vec![0x3E, 0x7B]);
        assert_eq!(record.mnemonic, "ld a, $7B");
    }

    #[test]
    fn unknown_opcode_is_not_fatal() {
        let mut gb = make_gb(&[0xD3]);
        let err = gb.step_one().expect_err("unknown opcode");
        assert_eq!(
            err,
            StepError::UnknownOpcode {
                opcode: 0xD3,
                address: 0xC000
            }
        );
        assert!(!err.is_fatal());
        assert_eq!(gb.registers().pc, 0xC001);
        assert_eq!(gb.total_cycles(), 0);
    }

    #[test]
    fn history_keeps_most_recent() {
        let mut gb = make_gb(&[0x00; 64]);
        gb.step_n(40, None).expect("step");
        let addresses: Vec<u16> = gb.history().map(|t| t.address).collect();
        assert_eq!(addresses.len(), HISTORY_LEN);
        assert_eq!(addresses.first(), Some(&0xC00A));
        assert_eq!(addresses.last(), Some(&0xC027));
    }

    #[test]
    fn step_n_stops_at_breakpoint() {
        let mut gb = make_gb(&[0x00; 16]);
        let summary = gb.step_n(10, Some(0xC004)).expect("step");
        assert_eq!(
            summary,
            StepSummary {
                executed: 4,
                hit_breakpoint: true
            }
        );
        assert_eq!(gb.registers().pc, 0xC004);
    }

    #[test]
    fn observable_paths() {
        let mut gb = make_gb(&[0x00]);
        gb.poke(0xC100, 0xAB);
        assert_eq!(gb.query("memory.0xC100"), Some(Value::U8(0xAB)));
        assert_eq!(gb.query("memory.$C100"), Some(Value::U8(0xAB)));
        assert_eq!(gb.query("memory.49408"), Some(Value::U8(0xAB)));
        assert_eq!(gb.query("cpu.pc"), Some(Value::U16(0xC000)));
        assert_eq!(gb.query("pc"), Some(Value::U16(0xC000)));
        assert_eq!(gb.query("cart.title"), None);
        assert_eq!(gb.query("bus.cartridge"), Some(Value::Bool(false)));
    }
}
