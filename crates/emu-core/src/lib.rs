//! Core traits and types for sample-accurate sound chip emulation.
//!
//! Every component advances in whole output-sample ticks. Derived timing
//! (charge steps, clock dividers) is expressed per tick, never per second.

mod observable;
mod tickable;
mod ticks;

pub use observable::{Observable, Value};
pub use tickable::Tickable;
pub use ticks::Ticks;
