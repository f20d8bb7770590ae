//! Collaborator traits
//!
//! These traits define the interface between the run logic and the
//! hardware or persistence implementations behind it.

pub mod gauge;
pub mod store;

pub use gauge::{ForceSensor, SensorError};
pub use store::{
    OwnerId, RecordId, StoreError, TimerId, TimerStore, TimerSummary, WorkoutReceipt,
    WorkoutRecordSink, MAX_STORED_TIMERS,
};
