//! Run state machine
//!
//! Defines the lifecycle of a single run. The state machine is explicit,
//! finite, and deterministic.

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::State;
