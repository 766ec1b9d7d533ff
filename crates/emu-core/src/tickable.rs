//! Trait for components advanced one clock cycle at a time.

use crate::Ticks;

/// A component that can be advanced by clock ticks.
pub trait Tickable {
    /// Advance the component by one cycle.
    fn tick(&mut self);

    /// Advance the component by several cycles.
    ///
    /// The default calls `tick()` in a loop. Implementors may override it
    /// but must produce identical results, including any per-tick side
    /// effects such as edge-triggered flags.
    fn tick_n(&mut self, count: Ticks) {
        for _ in 0..count.get() {
            self.tick();
        }
    }
}
