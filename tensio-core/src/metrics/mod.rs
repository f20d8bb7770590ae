//! Post-run metrics
//!
//! Reduces the samples of a workout run into per-phase statistics, max
//! isometric force and critical force. Computed once when the run completes.

pub mod aggregate;
pub mod timeline;

pub use aggregate::{
    aggregate, percent_of_body_weight, PhaseMetrics, WorkoutResult, CF_EFFORTS, MAX_ISO_EFFORTS,
};
pub use timeline::{Timeline, TimelinePoint};
