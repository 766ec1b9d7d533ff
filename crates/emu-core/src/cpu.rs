//! CPU core trait.

/// A CPU core.
///
/// Instruction-stepped cores are driven by the machine that owns them;
/// this trait covers what every core exposes for observation and reset.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Returns the current program counter.
    ///
    /// Returns `u32` so that cores with wider address buses fit the same
    /// trait. 16-bit cores zero-extend.
    fn pc(&self) -> u32;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Reset the CPU to its power-on state.
    fn reset(&mut self);
}
