//! Sample aggregation

use heapless::Vec;

use crate::config::MAX_SEQUENCES;
use crate::program::WorkoutType;
use crate::sampler::SampleBuffer;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Efforts considered for max isometric force (from the start)
pub const MAX_ISO_EFFORTS: usize = 3;

/// Efforts considered for critical force (from the end)
pub const CF_EFFORTS: usize = 6;

/// Statistics of one sequence
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhaseMetrics {
    /// Sequence order
    pub order: u16,
    /// Mean weight, `None` without samples
    pub average: Option<f32>,
    /// Peak weight, `None` without samples
    pub max: Option<f32>,
    /// Number of samples
    pub count: u16,
}

/// Summary of a workout run
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorkoutResult {
    /// One entry per sequence, in execution order
    ///
    /// Sequences that do not record force carry no average, no max and a
    /// count of 0.
    pub per_phase: Vec<PhaseMetrics, MAX_SEQUENCES>,
    /// Highest sample weight (0 without samples)
    pub max_weight: f32,
    /// Max isometric force, when the workout asks for it
    pub max_iso_force: Option<f32>,
    /// Critical force, when the workout asks for it
    pub critical_force: Option<f32>,
    /// Max force reported alongside critical force
    pub max_force_for_cf: Option<f32>,
    /// W' (always reported as 0)
    pub w_prime: Option<f32>,
}

impl WorkoutResult {
    /// Metrics of one sequence
    pub fn phase(&self, order: u16) -> Option<&PhaseMetrics> {
        self.per_phase.iter().find(|p| p.order == order)
    }

    /// Critical force relative to body weight (%)
    pub fn critical_force_percent(&self, body_weight: f32) -> Option<f32> {
        percent_of_body_weight(self.critical_force?, body_weight)
    }

    /// Max isometric force relative to body weight (%)
    pub fn max_iso_force_percent(&self, body_weight: f32) -> Option<f32> {
        percent_of_body_weight(self.max_iso_force?, body_weight)
    }
}

/// `value / body_weight × 100`, `None` without a usable body weight
pub fn percent_of_body_weight(value: f32, body_weight: f32) -> Option<f32> {
    if body_weight > 0.0 {
        Some(value / body_weight * 100.0)
    } else {
        None
    }
}

/// Reduce a run's samples
///
/// Never fails: sequences without samples have no average or max and are
/// skipped by the force computations.
pub fn aggregate(workout: &WorkoutType, buffer: &SampleBuffer) -> WorkoutResult {
    let mut result = WorkoutResult::default();

    for seq in workout.ordered() {
        let samples = if seq.records_force() {
            buffer.phase(seq.order).unwrap_or(&[])
        } else {
            &[]
        };
        let (average, max) = if samples.is_empty() {
            (None, None)
        } else {
            let sum: f32 = samples.iter().map(|s| s.weight).sum();
            let max = samples
                .iter()
                .map(|s| s.weight)
                .fold(f32::NEG_INFINITY, f32::max);
            (Some(sum / samples.len() as f32), Some(max))
        };
        // Bounded by MAX_SEQUENCES like the workout itself
        let _ = result.per_phase.push(PhaseMetrics {
            order: seq.order,
            average,
            max,
            count: samples.len() as u16,
        });
    }

    result.max_weight = buffer
        .samples()
        .iter()
        .map(|s| s.weight)
        .fold(0.0, f32::max);

    // Averages of effort sequences in execution order, `None` when unrecorded
    let efforts: Vec<Option<f32>, MAX_SEQUENCES> = workout
        .ordered()
        .filter(|s| s.is_effort())
        .map(|s| result.phase(s.order).and_then(|p| p.average))
        .collect();

    let max_iso = efforts
        .iter()
        .take(MAX_ISO_EFFORTS)
        .flatten()
        .fold(None, |acc: Option<f32>, &v| Some(acc.map_or(v, |a| a.max(v))))
        .unwrap_or(0.0);

    let critical = {
        let (sum, n) = efforts
            .iter()
            .skip(efforts.len().saturating_sub(CF_EFFORTS))
            .flatten()
            .fold((0.0f32, 0u32), |(sum, n), &v| (sum + v, n + 1));
        if n > 0 {
            sum / n as f32
        } else {
            0.0
        }
    };

    if workout.max_iso_force {
        result.max_iso_force = Some(max_iso);
    }
    if workout.critical_force {
        result.critical_force = Some(critical);
        result.max_force_for_cf = Some(max_iso);
        result.w_prime = Some(0.0);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::workout::tests::repeaters;
    use crate::program::Sequence;
    use crate::sampler::buffer::tests::{buffer_with, sample};

    /// Workout with one recorded effort per average, flagged for both metrics
    fn efforts_with_averages(averages: &[f32]) -> (WorkoutType, SampleBuffer) {
        let mut workout = repeaters(averages.len() as u16, 7, 0);
        workout.max_iso_force = true;
        workout.critical_force = true;

        let mut buffer = SampleBuffer::new();
        for (i, avg) in averages.iter().enumerate() {
            let key = i as u16 + 1;
            buffer.register(key).unwrap();
            // Two samples around the average
            for (n, w) in [avg - 1.0, avg + 1.0].iter().enumerate() {
                buffer.push(sample(key, n as u16, *w)).unwrap();
            }
        }
        (workout, buffer)
    }

    #[test]
    fn test_max_iso_force() {
        let (workout, buffer) = efforts_with_averages(&[10.0, 12.0, 9.0, 14.0, 11.0]);
        let result = aggregate(&workout, &buffer);
        assert_eq!(result.max_iso_force, Some(12.0));
        assert_eq!(result.max_weight, 15.0);
    }

    #[test]
    fn test_critical_force() {
        let averages = [5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
        let (workout, buffer) = efforts_with_averages(&averages);
        let result = aggregate(&workout, &buffer);
        assert_eq!(result.critical_force, Some(9.5));
        assert_eq!(result.max_force_for_cf, Some(7.0));
        assert_eq!(result.w_prime, Some(0.0));
    }

    #[test]
    fn test_fewer_efforts_than_window() {
        let (workout, buffer) = efforts_with_averages(&[4.0, 8.0]);
        let result = aggregate(&workout, &buffer);
        assert_eq!(result.max_iso_force, Some(8.0));
        assert_eq!(result.critical_force, Some(6.0));
    }

    #[test]
    fn test_zero_sample_sequences_excluded() {
        let mut workout = repeaters(3, 7, 0);
        workout.max_iso_force = true;
        workout.critical_force = true;
        let buffer = buffer_with(&[(1, &[10.0, 20.0]), (2, &[]), (3, &[30.0])]);

        let result = aggregate(&workout, &buffer);
        let second = result.phase(2).unwrap();
        assert_eq!(second.average, None);
        assert_eq!(second.max, None);
        assert_eq!(second.count, 0);

        assert_eq!(result.phase(1).unwrap().average, Some(15.0));
        assert_eq!(result.phase(1).unwrap().max, Some(20.0));
        assert_eq!(result.max_iso_force, Some(30.0));
        assert_eq!(result.critical_force, Some(22.5));
    }

    #[test]
    fn test_no_samples_at_all() {
        let mut workout = repeaters(2, 7, 3);
        workout.max_iso_force = true;
        workout.critical_force = true;
        let result = aggregate(&workout, &SampleBuffer::new());

        assert_eq!(result.max_weight, 0.0);
        assert_eq!(result.max_iso_force, Some(0.0));
        assert_eq!(result.critical_force, Some(0.0));
        assert_eq!(result.per_phase.len(), 2);
    }

    #[test]
    fn test_flags_off() {
        let (mut workout, buffer) = efforts_with_averages(&[10.0]);
        workout.max_iso_force = false;
        workout.critical_force = false;
        let result = aggregate(&workout, &buffer);
        assert_eq!(result.max_iso_force, None);
        assert_eq!(result.critical_force, None);
        assert_eq!(result.w_prime, None);
    }

    #[test]
    fn test_rest_sequences_not_counted_as_efforts() {
        let mut workout = WorkoutType::new("w").unwrap();
        workout.max_iso_force = true;
        workout.push(Sequence::rest(1, 5)).unwrap();
        workout.push(Sequence::effort(2, 5, true)).unwrap();
        let buffer = buffer_with(&[(2, &[8.0])]);

        let result = aggregate(&workout, &buffer);
        assert_eq!(result.per_phase.len(), 2);
        assert_eq!(result.per_phase[0].order, 1);
        assert_eq!(result.per_phase[0].count, 0);
        assert_eq!(result.per_phase[0].average, None);
        assert_eq!(result.max_iso_force, Some(8.0));
    }

    #[test]
    fn test_every_sequence_listed() {
        let mut workout = WorkoutType::new("mixed").unwrap();
        workout.max_iso_force = true;
        workout.push(Sequence::effort(1, 5, true)).unwrap();
        workout.push(Sequence::rest(2, 3)).unwrap();
        workout.push(Sequence::effort(3, 5, false)).unwrap();
        workout.push(Sequence::effort(4, 5, true)).unwrap();
        let buffer = buffer_with(&[(1, &[6.0, 10.0]), (4, &[12.0])]);

        let result = aggregate(&workout, &buffer);
        let orders: std::vec::Vec<u16> = result.per_phase.iter().map(|p| p.order).collect();
        assert_eq!(orders, [1, 2, 3, 4]);

        let unrecorded = result.phase(3).unwrap();
        assert_eq!(unrecorded.count, 0);
        assert_eq!(unrecorded.max, None);
        assert_eq!(result.phase(2).unwrap().average, None);

        // The unrecorded effort still takes an effort slot
        assert_eq!(result.phase(1).unwrap().average, Some(8.0));
        assert_eq!(result.max_iso_force, Some(12.0));
    }

    #[test]
    fn test_percent_of_body_weight() {
        assert_eq!(percent_of_body_weight(35.0, 70.0), Some(50.0));
        assert_eq!(percent_of_body_weight(35.0, 0.0), None);

        let result = WorkoutResult {
            critical_force: Some(14.0),
            ..WorkoutResult::default()
        };
        assert_eq!(result.critical_force_percent(70.0), Some(20.0));
        assert_eq!(result.max_iso_force_percent(70.0), None);
    }
}
