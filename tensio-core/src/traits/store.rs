//! Persistence traits
//!
//! Timers are saved per owner; finished workouts are handed to a record
//! sink together with their samples and computed metrics. All operations
//! are async so flash-backed implementations can await the storage.

use heapless::Vec;

use crate::config::Label;
use crate::metrics::WorkoutResult;
use crate::program::Timer;
use crate::sampler::SampleBuffer;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum timers returned by one listing
pub const MAX_STORED_TIMERS: usize = 16;

/// Owner of stored timers
pub type OwnerId = u32;

/// Stored timer identifier
pub type TimerId = u32;

/// Stored workout record identifier
pub type RecordId = u32;

/// Errors from persistence operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// No room left
    Full,
    /// Identifier not found
    NotFound,
    /// Definition failed validation
    Invalid,
    /// Record could not be encoded or decoded
    Encoding,
    /// Underlying storage failed
    Storage,
}

/// Listing entry for a stored timer
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimerSummary {
    /// Timer identifier
    pub id: TimerId,
    /// Timer name
    pub name: Label,
    /// Displayed total duration (seconds)
    pub total_duration_s: u32,
}

/// Confirmation of a saved workout
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WorkoutReceipt {
    /// Record identifier
    pub id: RecordId,
    /// Metrics as stored
    pub metrics: WorkoutResult,
}

/// Storage for user-defined timers
pub trait TimerStore {
    /// Save a timer for `owner`
    fn create_timer(
        &mut self,
        owner: OwnerId,
        timer: &Timer,
    ) -> impl core::future::Future<Output = Result<TimerId, StoreError>>;

    /// List the timers of `owner`
    fn list_timers(
        &mut self,
        owner: OwnerId,
    ) -> impl core::future::Future<Output = Result<Vec<TimerSummary, MAX_STORED_TIMERS>, StoreError>>;

    /// Delete a timer
    fn delete_timer(
        &mut self,
        id: TimerId,
    ) -> impl core::future::Future<Output = Result<(), StoreError>>;
}

/// Destination for finished workouts
pub trait WorkoutRecordSink {
    /// Save a finished workout
    ///
    /// On error the caller keeps `result` and may retry.
    fn create_workout_record(
        &mut self,
        name: &str,
        samples: &SampleBuffer,
        result: &WorkoutResult,
        body_weight: f32,
    ) -> impl core::future::Future<Output = Result<WorkoutReceipt, StoreError>>;
}
