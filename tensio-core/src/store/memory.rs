//! In-memory store

use heapless::Vec;

use super::WorkoutRecord;
use crate::metrics::WorkoutResult;
use crate::program::Timer;
use crate::sampler::SampleBuffer;
use crate::traits::{
    OwnerId, RecordId, StoreError, TimerId, TimerStore, TimerSummary, WorkoutReceipt,
    WorkoutRecordSink, MAX_STORED_TIMERS,
};

/// Maximum workout records kept in memory
pub const MAX_RECORDS: usize = 8;

#[derive(Debug, Clone)]
struct StoredTimer {
    id: TimerId,
    owner: OwnerId,
    timer: Timer,
}

/// RAM-backed timer store and workout record sink
///
/// Identifiers are shared between timers and records and start at 1.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    timers: Vec<StoredTimer, MAX_STORED_TIMERS>,
    records: Vec<WorkoutRecord, MAX_RECORDS>,
    next_id: u32,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store
    pub const fn new() -> Self {
        Self {
            timers: Vec::new(),
            records: Vec::new(),
            next_id: 1,
        }
    }

    /// Look up a stored timer
    pub fn timer(&self, id: TimerId) -> Option<&Timer> {
        self.timers.iter().find(|t| t.id == id).map(|t| &t.timer)
    }

    /// Saved workout records, oldest first
    pub fn records(&self) -> &[WorkoutRecord] {
        &self.records
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }
}

impl TimerStore for MemoryStore {
    async fn create_timer(
        &mut self,
        owner: OwnerId,
        timer: &Timer,
    ) -> Result<TimerId, StoreError> {
        timer.validate().map_err(|_| StoreError::Invalid)?;
        if self.timers.is_full() {
            return Err(StoreError::Full);
        }
        let id = self.allocate_id();
        self.timers
            .push(StoredTimer {
                id,
                owner,
                timer: timer.clone(),
            })
            .map_err(|_| StoreError::Full)?;
        Ok(id)
    }

    async fn list_timers(
        &mut self,
        owner: OwnerId,
    ) -> Result<Vec<TimerSummary, MAX_STORED_TIMERS>, StoreError> {
        Ok(self
            .timers
            .iter()
            .filter(|t| t.owner == owner)
            .map(|t| TimerSummary {
                id: t.id,
                name: t.timer.name.clone(),
                total_duration_s: t.timer.total_duration_s(),
            })
            .collect())
    }

    async fn delete_timer(&mut self, id: TimerId) -> Result<(), StoreError> {
        let index = self
            .timers
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::NotFound)?;
        self.timers.remove(index);
        Ok(())
    }
}

impl WorkoutRecordSink for MemoryStore {
    async fn create_workout_record(
        &mut self,
        name: &str,
        samples: &SampleBuffer,
        result: &WorkoutResult,
        body_weight: f32,
    ) -> Result<WorkoutReceipt, StoreError> {
        if self.records.is_full() {
            return Err(StoreError::Full);
        }
        let id: RecordId = self.allocate_id();
        let record = WorkoutRecord::new(id, name, samples, result, body_weight)?;
        let metrics = record.result.clone();
        self.records.push(record).map_err(|_| StoreError::Full)?;
        Ok(WorkoutReceipt { id, metrics })
    }
}
