//! Game Boy (DMG) emulator core.
//!
//! The machine is instruction-stepped: the LR35902 executes one whole
//! instruction, then the bus is ticked once per machine cycle it cost.
//! Machine cycles run at 1,048,576 Hz; one frame is 17,476 of them,
//! roughly 154 scanlines of 113.48 cycles.
//!
//! Every memory access goes through [`GbBus`], which polls each device.
//! Overlapping claims model bus contention and answer an arbitrary byte.

mod boot;
mod bus;
mod config;
mod entropy;
mod error;
mod gameboy;
pub mod mcp;
mod memory;
mod trace;

pub use boot::{BOOT_WINDOW, BootOverlay, REG_BOOT_OFF};
pub use bus::{CYCLES_PER_SCANLINE, FRAME_CYCLES, GbBus, OPEN_BUS};
pub use config::{EntropyConfig, GbConfig, PowerOn};
pub use entropy::{Entropy, FixedEntropy, RandEntropy};
pub use error::{ConfigError, StepError};
pub use gameboy::{GameBoy, HISTORY_LEN, RunOutcome, StepSummary, StopReason};
pub use memory::{Hram, IoRegisters, REG_LY, Vram, Wram};
pub use trace::Trace;
