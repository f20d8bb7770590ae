//! State machine definition
//!
//! Cue, sampling and clock behavior of a run is a function of the current
//! state and an event.

use super::events::Event;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Run states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum State {
    /// Nothing running, definition list visible
    #[default]
    Idle,
    /// Counting down before the first phase
    PreRoll,
    /// Phases counting down
    Running,
    /// Frozen by the user
    Paused {
        /// Pause happened during the pre-roll
        pre_roll: bool,
    },
    /// All phases done
    Complete,
    /// Cancelled by the user
    Aborted,
}

impl State {
    /// Check if the phase clock advances in this state
    pub fn clock_running(&self) -> bool {
        matches!(self, State::PreRoll | State::Running)
    }

    /// Check if force may be sampled in this state
    pub fn sampling_allowed(&self) -> bool {
        matches!(self, State::Running)
    }

    /// Check if a run is in progress (including paused)
    pub fn is_active(&self) -> bool {
        matches!(self, State::PreRoll | State::Running | State::Paused { .. })
    }

    /// Check if this is a terminal state requiring user action
    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Complete | State::Aborted)
    }

    /// Process an event and return the next state
    ///
    /// This is the core state transition logic.
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use State::*;

        match (self, event) {
            // Idle transitions
            (Idle, Start) => PreRoll,

            // PreRoll transitions
            (PreRoll, PreRollFinished) => Running,
            (PreRoll, Pause) => Paused { pre_roll: true },
            (PreRoll, Abort) => Aborted,

            // Running transitions
            (Running, Pause) => Paused { pre_roll: false },
            (Running, Finish) => Complete,
            (Running, Abort) => Aborted,

            // Paused transitions
            (Paused { pre_roll: true }, Resume) => PreRoll,
            (Paused { pre_roll: false }, Resume) => Running,
            (Paused { .. }, Abort) => Aborted,

            // Terminal transitions
            (Complete, Reset) => Idle,
            (Aborted, Reset) => Idle,

            // Default: stay in current state
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_run() {
        let state = State::Idle;
        let state = state.transition(Event::Start);
        assert_eq!(state, State::PreRoll);
        let state = state.transition(Event::PreRollFinished);
        assert_eq!(state, State::Running);
        let state = state.transition(Event::Finish);
        assert_eq!(state, State::Complete);
        let state = state.transition(Event::Reset);
        assert_eq!(state, State::Idle);
    }

    #[test]
    fn test_pause_resume() {
        let paused = State::Running.transition(Event::Pause);
        assert_eq!(paused, State::Paused { pre_roll: false });
        assert_eq!(paused.transition(Event::Resume), State::Running);

        let paused = State::PreRoll.transition(Event::Pause);
        assert_eq!(paused, State::Paused { pre_roll: true });
        assert_eq!(paused.transition(Event::Resume), State::PreRoll);
    }

    #[test]
    fn test_abort_from_active_states() {
        let states = [
            State::PreRoll,
            State::Running,
            State::Paused { pre_roll: true },
            State::Paused { pre_roll: false },
        ];

        for state in states {
            assert!(state.is_active());
            assert_eq!(state.transition(Event::Abort), State::Aborted);
        }
    }

    #[test]
    fn test_unknown_pairs_keep_state() {
        assert_eq!(State::Idle.transition(Event::Pause), State::Idle);
        assert_eq!(State::Idle.transition(Event::Finish), State::Idle);
        assert_eq!(State::Complete.transition(Event::Start), State::Complete);
        assert_eq!(State::Aborted.transition(Event::Resume), State::Aborted);
        // Finishing while paused is ignored
        let paused = State::Paused { pre_roll: false };
        assert_eq!(paused.transition(Event::Finish), paused);
    }

    #[test]
    fn test_state_queries() {
        assert!(State::Running.sampling_allowed());
        assert!(!State::PreRoll.sampling_allowed());
        assert!(!State::Paused { pre_roll: false }.sampling_allowed());
        assert!(State::PreRoll.clock_running());
        assert!(!State::Paused { pre_roll: true }.clock_running());
        assert!(State::Complete.is_terminal());
        assert!(State::Aborted.is_terminal());
        assert!(!State::Idle.is_terminal());
    }
}
