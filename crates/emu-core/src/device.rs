//! Memory-mapped device contract.

/// A device attached to a shared address bus.
///
/// Devices are polled for every access. A device answers only for the
/// addresses it owns: `read_at` returns `None` for anything outside its
/// ranges, and `write_at` silently ignores such addresses. Ranges of
/// different devices may overlap; resolving that is the bus's job.
pub trait MemoryDevice {
    /// Read the byte at `address`, or `None` if the device does not claim it.
    fn read_at(&self, address: u16) -> Option<u8>;

    /// Write `value` at `address`. Addresses outside the device's ranges
    /// are ignored.
    fn write_at(&mut self, address: u16, value: u8);

    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;
}
