//! Stored workout summary
//!
//! Samples are not kept; the record holds the metrics computed at
//! completion plus enough context to show the result again.

use crate::config::Label;
use crate::metrics::WorkoutResult;
use crate::sampler::SampleBuffer;
use crate::traits::{RecordId, StoreError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Magic number to identify valid workout records
pub const RECORD_MAGIC: u32 = 0x5453_4E57; // "TSNW"

/// Current record format version
pub const RECORD_VERSION: u8 = 1;

/// Summary of one finished workout
///
/// This struct is serialized to flash using postcard.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorkoutRecord {
    /// Magic number for validation
    pub magic: u32,
    /// Data format version
    pub version: u8,
    /// Record identifier
    pub id: RecordId,
    /// Workout type name
    pub name: Label,
    /// Body weight at the time of the workout (kg)
    pub body_weight: f32,
    /// Number of samples the metrics were computed from
    pub sample_count: u16,
    /// Computed metrics
    pub result: WorkoutResult,
    /// CRC32 checksum (calculated over magic..result)
    pub crc: u32,
}

impl WorkoutRecord {
    /// Build a record with a valid checksum
    pub fn new(
        id: RecordId,
        name: &str,
        samples: &SampleBuffer,
        result: &WorkoutResult,
        body_weight: f32,
    ) -> Result<Self, StoreError> {
        let mut record = Self {
            magic: RECORD_MAGIC,
            version: RECORD_VERSION,
            id,
            name: Label::try_from(name).map_err(|_| StoreError::Invalid)?,
            body_weight,
            sample_count: samples.len() as u16,
            result: result.clone(),
            crc: 0,
        };
        record.update_crc();
        Ok(record)
    }

    /// Check if the header is valid (magic and version match)
    pub fn is_valid(&self) -> bool {
        self.magic == RECORD_MAGIC && self.version == RECORD_VERSION
    }

    /// Calculate CRC32 for the record (excluding the crc field itself)
    pub fn calculate_crc(&self) -> u32 {
        let mut crc: u32 = 0xFFFFFFFF;

        crc = crc32_update(crc, &self.magic.to_le_bytes());
        crc = crc32_update(crc, &[self.version]);
        crc = crc32_update(crc, &self.id.to_le_bytes());
        crc = crc32_update(crc, self.name.as_bytes());
        crc = crc32_update(crc, &self.body_weight.to_le_bytes());
        crc = crc32_update(crc, &self.sample_count.to_le_bytes());

        let r = &self.result;
        crc = crc32_update(crc, &r.max_weight.to_le_bytes());
        for value in [r.max_iso_force, r.critical_force, r.max_force_for_cf, r.w_prime] {
            crc = crc32_update_opt(crc, value);
        }
        for phase in &r.per_phase {
            crc = crc32_update(crc, &phase.order.to_le_bytes());
            crc = crc32_update_opt(crc, phase.average);
            crc = crc32_update_opt(crc, phase.max);
            crc = crc32_update(crc, &phase.count.to_le_bytes());
        }

        !crc
    }

    /// Update the CRC field
    pub fn update_crc(&mut self) {
        self.crc = self.calculate_crc();
    }

    /// Verify the CRC is correct
    pub fn verify_crc(&self) -> bool {
        self.crc == self.calculate_crc()
    }

    /// Serialize into `buffer`, returning the number of bytes used
    #[cfg(feature = "serde")]
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, StoreError> {
        postcard::to_slice(self, buffer)
            .map(|used| used.len())
            .map_err(|_| StoreError::Encoding)
    }

    /// Deserialize and check header and checksum
    #[cfg(feature = "serde")]
    pub fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        let record: Self = postcard::from_bytes(bytes).map_err(|_| StoreError::Encoding)?;
        if !record.is_valid() || !record.verify_crc() {
            return Err(StoreError::Encoding);
        }
        Ok(record)
    }
}

/// Mix an optional value into the checksum, tagging presence
fn crc32_update_opt(crc: u32, value: Option<f32>) -> u32 {
    match value {
        Some(v) => crc32_update(crc32_update(crc, &[1]), &v.to_le_bytes()),
        None => crc32_update(crc, &[0]),
    }
}

/// Simple CRC32 update function (IEEE 802.3 polynomial)
fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB88320;
    let mut crc = crc;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}
