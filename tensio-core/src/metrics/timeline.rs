//! Continuous force timeline
//!
//! Lays the recorded sequences end to end on one time axis. Each recorded
//! sequence occupies its full duration; windows opened after a resume
//! continue where the previous window stopped. A sequence that captured
//! nothing contributes two zero placeholders spanning its duration, so
//! charts keep their shape.

use heapless::Vec;

use crate::config::MAX_SEQUENCES;
use crate::program::WorkoutType;
use crate::sampler::SampleBuffer;

/// One point on the timeline
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimelinePoint {
    /// Time since the first recorded sequence started (ms)
    pub t_ms: u32,
    /// Weight (kg)
    pub weight: f32,
    /// Sequence order
    pub order: u16,
    /// Zero filler for a sequence without samples
    pub placeholder: bool,
}

/// Iterator over the timeline of a run
#[derive(Debug, Clone)]
pub struct Timeline<'a> {
    buffer: &'a SampleBuffer,
    /// Recorded sequences as (order, duration ms)
    sequences: Vec<(u16, u32), MAX_SEQUENCES>,
    seq: usize,
    cursor: usize,
    offset_ms: u32,
    window_base_ms: u32,
}

impl<'a> Timeline<'a> {
    /// Build the timeline of `workout` from `buffer`
    pub fn new(workout: &WorkoutType, buffer: &'a SampleBuffer) -> Self {
        let sequences = workout
            .ordered()
            .filter(|s| s.records_force())
            .map(|s| (s.order, s.duration_s as u32 * 1000))
            .collect();
        Self {
            buffer,
            sequences,
            seq: 0,
            cursor: 0,
            offset_ms: 0,
            window_base_ms: 0,
        }
    }
}

impl Iterator for Timeline<'_> {
    type Item = TimelinePoint;

    fn next(&mut self) -> Option<TimelinePoint> {
        loop {
            let &(order, duration_ms) = self.sequences.get(self.seq)?;
            let samples = self.buffer.phase(order).unwrap_or(&[]);

            if samples.is_empty() && self.cursor < 2 {
                let t_ms = if self.cursor == 0 { 0 } else { duration_ms };
                self.cursor += 1;
                return Some(TimelinePoint {
                    t_ms: self.offset_ms + t_ms,
                    weight: 0.0,
                    order,
                    placeholder: true,
                });
            }

            if let Some(sample) = samples.get(self.cursor) {
                if self.cursor > 0 {
                    let prev = &samples[self.cursor - 1];
                    if prev.window != sample.window {
                        self.window_base_ms += prev.elapsed_ms;
                    }
                }
                self.cursor += 1;
                return Some(TimelinePoint {
                    t_ms: self.offset_ms + self.window_base_ms + sample.elapsed_ms,
                    weight: sample.weight,
                    order,
                    placeholder: false,
                });
            }

            self.offset_ms += duration_ms;
            self.window_base_ms = 0;
            self.cursor = 0;
            self.seq += 1;
        }
    }
}
