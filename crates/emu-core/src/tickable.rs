//! Trait for components that can be advanced by sample ticks.

use crate::Ticks;

/// A component that can be advanced by sample ticks.
///
/// Sound chips produce exactly one output sample per tick and keep it in
/// an internal buffer until the host drains it.
pub trait Tickable {
    /// Advance the component by one sample tick.
    fn tick(&mut self);

    /// Advance the component by multiple ticks.
    ///
    /// Default implementation calls `tick()` in a loop. Components may
    /// override for efficiency (e.g. hoisting per-call rate computation out
    /// of the loop), but must produce identical results.
    fn tick_n(&mut self, count: Ticks) {
        for _ in 0..count.get() {
            self.tick();
        }
    }
}
