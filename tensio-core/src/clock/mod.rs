//! Countdown clock
//!
//! Turns elapsed milliseconds into pre-roll counts and one-second phase
//! ticks. The clock does not know about phases; the run session applies its
//! ticks to the sequencer.

pub mod countdown;

pub use countdown::{ClockConfig, ClockEvent, CountdownClock};
