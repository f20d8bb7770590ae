//! Configuration type definitions
//!
//! These types hold the training definitions and run settings. The
//! definition file is parsed from TOML at boot; run summaries are stored
//! in flash as postcard-serialized binary data.

use heapless::{String, Vec};

use crate::clock::ClockConfig;
use crate::program::{Timer, WorkoutType};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum label length (timer, step, exercise and workout names)
pub const MAX_LABEL_LEN: usize = 24;

/// Maximum instruction/description length
pub const MAX_INSTRUCTION_LEN: usize = 64;

/// Maximum steps per timer
pub const MAX_STEPS_PER_TIMER: usize = 8;

/// Maximum exercises per step
pub const MAX_EXERCISES_PER_STEP: usize = 8;

/// Maximum sequences per workout type
pub const MAX_SEQUENCES: usize = 64;

/// Maximum timers per definition file
pub const MAX_TIMERS: usize = 8;

/// Maximum workout types per definition file
pub const MAX_WORKOUTS: usize = 8;

/// Maximum force samples kept for one run
pub const MAX_SAMPLES: usize = 2048;

/// Short display label
pub type Label = String<MAX_LABEL_LEN>;

/// Free-form instruction text
pub type Instruction = String<MAX_INSTRUCTION_LEN>;

/// Run settings shared by every timer and workout
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunConfig {
    /// Number of pre-roll counts (0 disables the pre-roll)
    pub pre_roll: u8,
    /// Pre-roll count interval (ms)
    pub pre_roll_interval_ms: u32,
    /// Countdown warning threshold (s), the cue fires on the tick leaving
    /// this many seconds behind (0 = off)
    pub warning_s: u16,
    /// Force sampling period (ms)
    pub sample_period_ms: u32,
    /// Athlete body weight (kg), used for relative metrics
    pub body_weight: f32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            pre_roll: 3,
            pre_roll_interval_ms: 750,
            warning_s: 3,
            sample_period_ms: 100,
            body_weight: 0.0,
        }
    }
}

impl RunConfig {
    /// Clock settings derived from the run settings
    pub fn clock(&self) -> ClockConfig {
        ClockConfig {
            pre_roll_count: self.pre_roll,
            pre_roll_interval_ms: self.pre_roll_interval_ms,
            ..ClockConfig::default()
        }
    }
}

/// Load cell calibration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GaugeConfig {
    /// Raw reading with nothing attached
    pub tare_counts: i32,
    /// Raw counts per kilogram
    pub counts_per_kg: f32,
    /// Seconds without a reading before the link counts as stale
    pub stale_after_s: u16,
}

impl Default for GaugeConfig {
    fn default() -> Self {
        Self {
            tare_counts: 0,
            counts_per_kg: 200.0,
            stale_after_s: 2,
        }
    }
}

/// Complete definition file contents
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrainingConfig {
    /// Nested interval timers
    pub timers: Vec<Timer, MAX_TIMERS>,
    /// Structured force-measuring workouts
    pub workouts: Vec<WorkoutType, MAX_WORKOUTS>,
    /// Run settings
    pub run: RunConfig,
    /// Gauge calibration
    pub gauge: GaugeConfig,
}

impl TrainingConfig {
    /// Create an empty definition set with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a timer by name
    pub fn timer(&self, name: &str) -> Option<&Timer> {
        self.timers.iter().find(|t| t.name == name)
    }

    /// Find a workout type by name
    pub fn workout(&self, name: &str) -> Option<&WorkoutType> {
        self.workouts.iter().find(|w| w.name == name)
    }

    /// Total number of selectable programs (timers first, then workouts)
    pub fn program_count(&self) -> usize {
        self.timers.len() + self.workouts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_config_defaults() {
        let run = RunConfig::default();
        assert_eq!(run.pre_roll, 3);
        assert_eq!(run.pre_roll_interval_ms, 750);
        assert_eq!(run.sample_period_ms, 100);

        let clock = run.clock();
        assert_eq!(clock.pre_roll_count, 3);
        assert_eq!(clock.phase_interval_ms, 1000);
    }

    #[test]
    fn test_lookup_by_name() {
        let mut config = TrainingConfig::new();
        let mut timer = Timer::default();
        timer.name = Label::try_from("warmup").unwrap();
        config.timers.push(timer).unwrap();

        assert!(config.timer("warmup").is_some());
        assert!(config.timer("other").is_none());
        assert!(config.workout("warmup").is_none());
        assert_eq!(config.program_count(), 1);
    }
}
