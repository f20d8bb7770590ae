//! Nested interval timer definitions

use heapless::Vec;

use super::DefinitionError;
use crate::config::{Label, MAX_EXERCISES_PER_STEP, MAX_STEPS_PER_TIMER};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single timed exercise inside a step
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Exercise {
    /// Display name
    pub name: Label,
    /// Work duration (seconds, > 0)
    pub duration_s: u16,
    /// Rest between repetitions (seconds)
    pub rest_s: u16,
    /// Number of repetitions (>= 1)
    pub repetition: u8,
}

/// A group of exercises repeated as a block
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Step {
    /// Display name
    pub name: Label,
    /// Rest between step repetitions (seconds)
    pub rest_s: u16,
    /// Number of repetitions (>= 1)
    pub repetition: u8,
    /// Exercises in execution order
    pub exercises: Vec<Exercise, MAX_EXERCISES_PER_STEP>,
}

/// A nested interval timer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timer {
    /// Display name
    pub name: Label,
    /// Steps in execution order
    pub steps: Vec<Step, MAX_STEPS_PER_TIMER>,
}

impl Exercise {
    /// Create an exercise
    pub fn new(
        name: &str,
        duration_s: u16,
        rest_s: u16,
        repetition: u8,
    ) -> Result<Self, DefinitionError> {
        Ok(Self {
            name: Label::try_from(name).map_err(|_| DefinitionError::TextTooLong)?,
            duration_s,
            rest_s,
            repetition,
        })
    }

    /// Time spent on this exercise in one step repetition
    pub fn block_s(&self) -> u32 {
        self.repetition as u32 * (self.duration_s as u32 + self.rest_s as u32)
    }
}

impl Step {
    /// Create an empty step
    pub fn new(name: &str, rest_s: u16, repetition: u8) -> Result<Self, DefinitionError> {
        Ok(Self {
            name: Label::try_from(name).map_err(|_| DefinitionError::TextTooLong)?,
            rest_s,
            repetition,
            exercises: Vec::new(),
        })
    }

    /// Append an exercise
    pub fn with_exercise(mut self, exercise: Exercise) -> Result<Self, DefinitionError> {
        self.exercises
            .push(exercise)
            .map_err(|_| DefinitionError::TooManyItems)?;
        Ok(self)
    }

    /// Total exercise repetitions in one pass of this step
    pub fn exercise_repetitions(&self) -> u16 {
        self.exercises.iter().map(|e| e.repetition as u16).sum()
    }
}

impl Timer {
    /// Create an empty timer
    pub fn new(name: &str) -> Result<Self, DefinitionError> {
        Ok(Self {
            name: Label::try_from(name).map_err(|_| DefinitionError::TextTooLong)?,
            steps: Vec::new(),
        })
    }

    /// Append a step
    pub fn with_step(mut self, step: Step) -> Result<Self, DefinitionError> {
        self.steps
            .push(step)
            .map_err(|_| DefinitionError::TooManyItems)?;
        Ok(self)
    }

    /// Check that the timer can be run
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.steps.is_empty() {
            return Err(DefinitionError::NoSteps);
        }
        for step in &self.steps {
            if step.exercises.is_empty() {
                return Err(DefinitionError::NoExercises);
            }
            if step.repetition == 0 {
                return Err(DefinitionError::ZeroRepetition);
            }
            for exercise in &step.exercises {
                if exercise.duration_s == 0 {
                    return Err(DefinitionError::ZeroDuration);
                }
                if exercise.repetition == 0 {
                    return Err(DefinitionError::ZeroRepetition);
                }
            }
        }
        Ok(())
    }

    /// Displayed total duration (seconds)
    ///
    /// Per step: `repetition × Σ exercise blocks + (repetition − 1) × rest`.
    /// Every exercise repetition is counted with its rest, including the last.
    pub fn total_duration_s(&self) -> u32 {
        self.steps
            .iter()
            .map(|step| {
                let block: u32 = step.exercises.iter().map(Exercise::block_s).sum();
                let reps = step.repetition as u32;
                reps * block + reps.saturating_sub(1) * step.rest_s as u32
            })
            .sum()
    }

    /// Exact time the sequencer spends walking this timer (seconds)
    ///
    /// Exercise rest only runs between repetitions of the same exercise,
    /// step rest runs after every step repetition.
    pub fn scheduled_duration_s(&self) -> u32 {
        self.steps
            .iter()
            .map(|step| {
                let pass: u32 = step
                    .exercises
                    .iter()
                    .map(|e| {
                        let reps = e.repetition as u32;
                        reps * e.duration_s as u32 + reps.saturating_sub(1) * e.rest_s as u32
                    })
                    .sum();
                step.repetition as u32 * (pass + step.rest_s as u32)
            })
            .sum()
    }

    /// Total exercise repetitions across one full run
    pub fn total_exercise_repetitions(&self) -> u32 {
        self.steps
            .iter()
            .map(|s| s.repetition as u32 * s.exercise_repetitions() as u32)
            .sum()
    }
}
