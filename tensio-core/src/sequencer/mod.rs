//! Phase sequencers
//!
//! A sequencer walks one definition phase by phase. It owns the current
//! [`RuntimePhase`] value and replaces it wholesale on every transition;
//! callers only ever see clones.
//!
//! The countdown itself is driven from outside: the run session calls
//! [`PhaseSequencer::tick`] once per second and [`PhaseSequencer::advance`]
//! exactly once when the remaining time reaches zero.

pub mod flat;
pub mod nested;

pub use flat::{FlatPhase, FlatSequencer};
pub use nested::{NestedPhase, NestedPhaseKind, NestedSequencer};

use crate::program::WorkoutType;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Read-only view shared by both phase shapes
pub trait RuntimePhase {
    /// Phase length (seconds)
    fn duration_s(&self) -> u16;

    /// Seconds left in this phase
    fn remaining_s(&self) -> u16;

    /// Monotonic transition counter, starting at 1 for the first phase
    fn instance(&self) -> u32;

    /// Sample bucket key when force is recorded during this phase
    fn recording_key(&self) -> Option<u16>;
}

/// Result of advancing a sequencer
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition<P> {
    /// A new phase started
    Continue(P),
    /// No phases left
    Complete(RunSummary),
}

/// Totals reported when a sequencer completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunSummary {
    /// Number of phases that ran to zero
    pub phases: u32,
    /// Sum of the durations of those phases (seconds)
    pub elapsed_s: u32,
}

impl RunSummary {
    pub(crate) fn record(&mut self, duration_s: u16) {
        self.phases += 1;
        self.elapsed_s += duration_s as u32;
    }
}

/// Completed/total pair for progress bars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Progress {
    /// Units already finished
    pub completed: u16,
    /// Units in total
    pub total: u16,
}

impl Progress {
    /// Completion in percent (0-100)
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.completed.min(self.total) as u32 * 100) / self.total as u32) as u8
    }
}

/// Walks a definition one phase at a time
pub trait PhaseSequencer {
    /// Phase value produced by this sequencer
    type Phase: RuntimePhase + Clone;

    /// Current phase, `None` once complete
    fn current(&self) -> Option<&Self::Phase>;

    /// Count one second off the current phase
    ///
    /// Returns the new remaining time, or `None` when complete. Remaining
    /// never goes below zero.
    fn tick(&mut self) -> Option<u16>;

    /// Move to the next phase
    ///
    /// Every transition increments the phase instance. Advancing a
    /// complete sequencer keeps returning [`Transition::Complete`].
    fn advance(&mut self) -> Transition<Self::Phase>;

    /// Totals of the phases run so far
    fn summary(&self) -> RunSummary;

    /// Total number of phases in one run
    fn phase_count(&self) -> u32;

    /// Check if all phases have run
    fn is_complete(&self) -> bool {
        self.current().is_none()
    }

    /// Workout being walked, when the run records force
    fn workout(&self) -> Option<&WorkoutType> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent() {
        assert_eq!(Progress { completed: 1, total: 4 }.percent(), 25);
        assert_eq!(Progress { completed: 4, total: 4 }.percent(), 100);
        assert_eq!(Progress { completed: 0, total: 0 }.percent(), 100);
    }
}
