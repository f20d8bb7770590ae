//! Training definitions
//!
//! A [`Timer`] is a nested interval timer (steps containing exercises, both
//! with repetitions and rests). A [`WorkoutType`] is a flat, ordered list of
//! effort/rest sequences that may record force.
//!
//! Definitions are validated once when a run is built; the sequencers never
//! re-check them while ticking.

pub mod duration;
pub mod timer;
pub mod workout;

pub use duration::{format_duration, DurationText};
pub use timer::{Exercise, Step, Timer};
pub use workout::{Sequence, SequenceKind, WorkoutType};

/// Reasons a definition cannot be run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DefinitionError {
    /// Timer has no steps
    NoSteps,
    /// Step has no exercises
    NoExercises,
    /// Workout has no sequences
    NoSequences,
    /// Exercise or sequence with a zero duration
    ZeroDuration,
    /// Step or exercise with a zero repetition count
    ZeroRepetition,
    /// Two sequences share the same order
    DuplicateOrder(u16),
    /// A fixed-capacity limit was exceeded
    TooManyItems,
    /// A name or instruction does not fit its buffer
    TextTooLong,
}
