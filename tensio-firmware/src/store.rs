//! Flash-backed workout record sink
//!
//! Records rotate through [`MAX_RECORD_SLOTS`] slots, the newest replacing
//! the oldest. The next record id is kept under its own key so numbering
//! survives a reboot.

use tensio_core::metrics::WorkoutResult;
use tensio_core::sampler::SampleBuffer;
use tensio_core::store::WorkoutRecord;
use tensio_core::traits::{RecordId, StoreError, WorkoutReceipt, WorkoutRecordSink};
use tensio_hal::{FlashError, FlashStorage, StorageKey, MAX_RECORD_SLOTS};

/// Largest encoded record
const MAX_RECORD_SIZE: usize = 1536;

/// Encoded size of the record index
const INDEX_SIZE: usize = 8;

/// Workout records in flash
pub struct FlashRecordStore<F> {
    storage: F,
    next_id: RecordId,
}

impl<F: FlashStorage> FlashRecordStore<F> {
    /// Open the store, resuming numbering from flash
    pub async fn open(mut storage: F) -> Self {
        let mut buffer = [0u8; INDEX_SIZE];
        let next_id = match storage.read(StorageKey::RecordIndex, &mut buffer).await {
            Ok(len) => postcard::from_bytes::<RecordId>(&buffer[..len]).unwrap_or(1),
            Err(_) => 1,
        };
        Self {
            storage,
            next_id: next_id.max(1),
        }
    }

    /// Identifier the next record will get
    pub fn next_id(&self) -> RecordId {
        self.next_id
    }

    /// Read a saved record back
    ///
    /// Fails with `NotFound` once the slot was reused by a newer record.
    pub async fn load(&mut self, id: RecordId) -> Result<WorkoutRecord, StoreError> {
        let mut buffer = [0u8; MAX_RECORD_SIZE];
        let len = self
            .storage
            .read(StorageKey::Record(slot(id)), &mut buffer)
            .await
            .map_err(store_error)?;
        let record = WorkoutRecord::decode(&buffer[..len])?;
        if record.id != id {
            return Err(StoreError::NotFound);
        }
        Ok(record)
    }
}

impl<F: FlashStorage> WorkoutRecordSink for FlashRecordStore<F> {
    async fn create_workout_record(
        &mut self,
        name: &str,
        samples: &SampleBuffer,
        result: &WorkoutResult,
        body_weight: f32,
    ) -> Result<WorkoutReceipt, StoreError> {
        let id = self.next_id;
        let record = WorkoutRecord::new(id, name, samples, result, body_weight)?;

        let mut buffer = [0u8; MAX_RECORD_SIZE];
        let len = record.encode(&mut buffer)?;
        self.storage
            .write(StorageKey::Record(slot(id)), &buffer[..len])
            .await
            .map_err(store_error)?;

        let next_id = id.wrapping_add(1).max(1);
        let mut index = [0u8; INDEX_SIZE];
        let used = postcard::to_slice(&next_id, &mut index).map_err(|_| StoreError::Encoding)?;
        self.storage
            .write(StorageKey::RecordIndex, used)
            .await
            .map_err(store_error)?;
        self.next_id = next_id;

        Ok(WorkoutReceipt {
            id,
            metrics: record.result,
        })
    }
}

/// Slot holding record `id`
fn slot(id: RecordId) -> u8 {
    (id.wrapping_sub(1) % MAX_RECORD_SLOTS as u32) as u8
}

fn store_error(e: FlashError) -> StoreError {
    match e {
        FlashError::NotFound => StoreError::NotFound,
        FlashError::Full => StoreError::Full,
        FlashError::Corrupted | FlashError::BufferTooSmall => StoreError::Encoding,
        FlashError::Flash | FlashError::Storage => StoreError::Storage,
    }
}
