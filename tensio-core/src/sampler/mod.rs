//! Force sampling
//!
//! While a force-recording phase is running the sampler reads the latest
//! gauge weight at a fixed period and appends it to a phase-keyed buffer.
//! Each pause closes the recording window and each resume opens a new one,
//! restarting the iteration counter and elapsed origin.

pub mod buffer;
pub mod cell;
pub mod force;

pub use buffer::SampleBuffer;
pub use cell::WeightCell;
pub use force::{ForceSampler, DEFAULT_SAMPLE_PERIOD_MS};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One force reading
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sample {
    /// Sequence order the sample belongs to
    pub phase_key: u16,
    /// Recording window within the phase (0 first, +1 per resume)
    pub window: u8,
    /// Sample index within the window
    pub iteration: u16,
    /// Weight (kg)
    pub weight: f32,
    /// Time since the window opened (ms)
    pub elapsed_ms: u32,
}
