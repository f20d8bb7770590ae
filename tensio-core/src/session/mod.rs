//! Run session
//!
//! A session owns everything one run needs: the sequencer, the countdown
//! clock, the cue scheduler and the force sampler. It is the only entry
//! point the firmware drives.

pub mod run;

pub use run::{RunEvent, Session, TimerSession, WorkoutSession};

use crate::program::DefinitionError;

/// Errors from session operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionError {
    /// Definition rejected when building the session
    Definition(DefinitionError),
    /// Operation not valid in the current run state
    InvalidState,
    /// Session was torn down
    Inactive,
    /// Sample buffer capacity reached
    SampleBufferFull,
    /// Too many recorded phases for one run
    TooManyPhases,
    /// A finished phase was opened again
    PhaseReopened,
    /// Sample for a phase that is not recording
    PhaseNotRecording,
}

impl From<DefinitionError> for SessionError {
    fn from(e: DefinitionError) -> Self {
        SessionError::Definition(e)
    }
}
