//! Persistence implementations
//!
//! [`MemoryStore`] keeps timers and workout records in RAM and implements
//! both persistence traits. [`WorkoutRecord`] is the compact, checksummed
//! summary that flash-backed sinks store.

pub mod memory;
pub mod record;

pub use memory::{MemoryStore, MAX_RECORDS};
pub use record::{WorkoutRecord, RECORD_MAGIC, RECORD_VERSION};
