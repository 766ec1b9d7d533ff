//! Core traits and types shared by the emulator crates.
//!
//! A CPU sees memory only through [`Bus`]. Machines build their bus out of
//! [`MemoryDevice`]s, each of which claims the addresses it owns and
//! declines everything else.

mod bus;
mod cpu;
mod device;
mod observable;
mod tickable;
mod ticks;

pub use bus::{Bus, SimpleBus};
pub use cpu::Cpu;
pub use device::MemoryDevice;
pub use observable::{Observable, Value};
pub use tickable::Tickable;
pub use ticks::Ticks;
