//! Phase-keyed sample storage
//!
//! Samples live in one flat vector. Each registered phase owns a contiguous
//! slice of it, so a phase registered without samples reads as an empty
//! slice rather than a missing one.

use heapless::Vec;

use super::Sample;
use crate::config::{MAX_SAMPLES, MAX_SEQUENCES};
use crate::session::SessionError;

/// Slice bounds of one phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PhaseSlot {
    key: u16,
    start: u16,
    len: u16,
}

/// Samples of one run, grouped by phase key
#[derive(Debug, Clone, Default)]
pub struct SampleBuffer {
    samples: Vec<Sample, MAX_SAMPLES>,
    slots: Vec<PhaseSlot, MAX_SEQUENCES>,
}

impl SampleBuffer {
    /// Create an empty buffer
    pub const fn new() -> Self {
        Self {
            samples: Vec::new(),
            slots: Vec::new(),
        }
    }

    /// Register a phase; re-registering the newest phase is a no-op
    pub fn register(&mut self, key: u16) -> Result<(), SessionError> {
        if self.slots.last().map(|s| s.key) == Some(key) {
            return Ok(());
        }
        if self.slots.iter().any(|s| s.key == key) {
            return Err(SessionError::PhaseReopened);
        }
        self.slots
            .push(PhaseSlot {
                key,
                start: self.samples.len() as u16,
                len: 0,
            })
            .map_err(|_| SessionError::TooManyPhases)
    }

    /// Append a sample to the newest phase
    pub fn push(&mut self, sample: Sample) -> Result<(), SessionError> {
        let slot = self
            .slots
            .last_mut()
            .filter(|s| s.key == sample.phase_key)
            .ok_or(SessionError::PhaseNotRecording)?;
        self.samples
            .push(sample)
            .map_err(|_| SessionError::SampleBufferFull)?;
        slot.len += 1;
        Ok(())
    }

    /// Samples of one phase, `None` if the phase never recorded
    pub fn phase(&self, key: u16) -> Option<&[Sample]> {
        self.slots
            .iter()
            .find(|s| s.key == key)
            .map(|s| &self.samples[s.start as usize..(s.start + s.len) as usize])
    }

    /// Registered phases in registration order
    pub fn phases(&self) -> impl Iterator<Item = (u16, &[Sample])> + '_ {
        self.slots.iter().map(move |s| {
            (
                s.key,
                &self.samples[s.start as usize..(s.start + s.len) as usize],
            )
        })
    }

    /// Every sample in recording order
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if no samples were recorded
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of registered phases
    pub fn phase_count(&self) -> usize {
        self.slots.len()
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.samples.clear();
        self.slots.clear();
    }
}
