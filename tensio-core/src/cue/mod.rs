//! Audio cues
//!
//! Cues mark transition points of a run. Each cue is keyed by the phase
//! instance it belongs to and fires at most once per instance.

pub mod scheduler;

pub use scheduler::{CueScheduler, DEFAULT_WARNING_S};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Cue kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Cue {
    /// First pre-roll count
    Intro,
    /// A new phase begins
    Start,
    /// Phase ticked past the warning threshold
    Countdown,
    /// Remaining time reached zero
    End,
    /// Run complete
    Victory,
}

impl Cue {
    const fn bit(self) -> u8 {
        match self {
            Cue::Intro => 1 << 0,
            Cue::Start => 1 << 1,
            Cue::Countdown => 1 << 2,
            Cue::End => 1 << 3,
            Cue::Victory => 1 << 4,
        }
    }
}

/// A cue tied to the phase instance that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CueEvent {
    /// Cue kind
    pub cue: Cue,
    /// Phase instance (0 for the pre-roll)
    pub instance: u32,
}
