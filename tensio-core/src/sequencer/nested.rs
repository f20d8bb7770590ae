//! Nested timer sequencer
//!
//! Walks `Exercise → {ExerciseRest → Exercise} → {next Exercise} →
//! {StepRest} → {repeat Step} → {next Step} → Complete`.

use core::fmt::Write;

use super::{PhaseSequencer, Progress, RunSummary, RuntimePhase, Transition};
use crate::config::Label;
use crate::program::{DefinitionError, Timer};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kind of a nested timer phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NestedPhaseKind {
    /// Working on an exercise
    Exercise,
    /// Rest between repetitions of one exercise
    ExerciseRest,
    /// Rest after a step repetition
    StepRest,
}

/// Runtime state of one nested timer phase
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NestedPhase {
    /// Phase kind
    pub kind: NestedPhaseKind,
    /// Step index (0-based)
    pub step_index: u8,
    /// Exercise index within the step (0-based)
    pub exercise_index: u8,
    /// Current step repetition (1-based)
    pub step_repetition: u8,
    /// Current exercise repetition (1-based)
    pub exercise_repetition: u8,
    /// Phase length (seconds)
    pub duration_s: u16,
    /// Seconds left
    pub remaining_s: u16,
    /// Display label
    pub label: Label,
    /// Transition counter
    pub instance: u32,
}

impl RuntimePhase for NestedPhase {
    fn duration_s(&self) -> u16 {
        self.duration_s
    }

    fn remaining_s(&self) -> u16 {
        self.remaining_s
    }

    fn instance(&self) -> u32 {
        self.instance
    }

    fn recording_key(&self) -> Option<u16> {
        None
    }
}

/// Sequencer for nested interval timers
#[derive(Debug, Clone)]
pub struct NestedSequencer {
    timer: Timer,
    phase: Option<NestedPhase>,
    summary: RunSummary,
    phase_count: u32,
}

impl NestedSequencer {
    /// Create a sequencer positioned on the first exercise
    pub fn new(timer: Timer) -> Result<Self, DefinitionError> {
        timer.validate()?;

        let mut sequencer = Self {
            timer,
            phase: None,
            summary: RunSummary::default(),
            phase_count: 0,
        };
        sequencer.phase_count = sequencer.count_phases();

        let mut first = sequencer.make_phase(NestedPhaseKind::Exercise, 0, 0, 1, 1);
        first.instance = 1;
        sequencer.phase = Some(first);

        Ok(sequencer)
    }

    /// Timer being walked
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Progress along the step axis, counting step repetitions
    pub fn step_progress(&self) -> Progress {
        let total: u16 = self.timer.steps.iter().map(|s| s.repetition as u16).sum();
        let completed = match &self.phase {
            Some(p) => {
                let earlier: u16 = self.timer.steps[..p.step_index as usize]
                    .iter()
                    .map(|s| s.repetition as u16)
                    .sum();
                earlier + p.step_repetition as u16 - 1
            }
            None => total,
        };
        Progress { completed, total }
    }

    /// Progress through the exercises of the current step repetition
    pub fn exercise_progress(&self) -> Progress {
        let Some(p) = &self.phase else {
            let total = self
                .timer
                .steps
                .last()
                .map(|s| s.exercise_repetitions())
                .unwrap_or(0);
            return Progress {
                completed: total,
                total,
            };
        };

        let step = &self.timer.steps[p.step_index as usize];
        let total = step.exercise_repetitions();
        let completed = match p.kind {
            NestedPhaseKind::StepRest => total,
            _ => {
                let earlier: u16 = step.exercises[..p.exercise_index as usize]
                    .iter()
                    .map(|e| e.repetition as u16)
                    .sum();
                earlier + p.exercise_repetition as u16 - 1
            }
        };
        Progress { completed, total }
    }

    fn make_phase(
        &self,
        kind: NestedPhaseKind,
        step_index: u8,
        exercise_index: u8,
        step_repetition: u8,
        exercise_repetition: u8,
    ) -> NestedPhase {
        let step = &self.timer.steps[step_index as usize];
        let exercise = &step.exercises[exercise_index as usize];

        let mut label = Label::new();
        let duration_s = match kind {
            NestedPhaseKind::Exercise => {
                push_truncated(&mut label, &exercise.name);
                exercise.duration_s
            }
            NestedPhaseKind::ExerciseRest => {
                push_truncated(&mut label, "Rest (");
                push_truncated(&mut label, &exercise.name);
                push_truncated(&mut label, ")");
                exercise.rest_s
            }
            NestedPhaseKind::StepRest => {
                push_truncated(&mut label, "Step Rest");
                step.rest_s
            }
        };

        NestedPhase {
            kind,
            step_index,
            exercise_index,
            step_repetition,
            exercise_repetition,
            duration_s,
            remaining_s: duration_s,
            label,
            instance: 0,
        }
    }

    /// Phase following `cur`, `None` when the timer is done
    fn next_phase(&self, cur: &NestedPhase) -> Option<NestedPhase> {
        use NestedPhaseKind::*;

        let step = &self.timer.steps[cur.step_index as usize];
        let exercise = &step.exercises[cur.exercise_index as usize];
        let (s, e, srep, erep) = (
            cur.step_index,
            cur.exercise_index,
            cur.step_repetition,
            cur.exercise_repetition,
        );

        match cur.kind {
            Exercise => {
                if erep < exercise.repetition {
                    if exercise.rest_s > 0 {
                        return Some(self.make_phase(ExerciseRest, s, e, srep, erep));
                    }
                    return Some(self.make_phase(Exercise, s, e, srep, erep + 1));
                }
                if (e as usize) + 1 < step.exercises.len() {
                    return Some(self.make_phase(Exercise, s, e + 1, srep, 1));
                }
                if step.rest_s > 0 {
                    return Some(self.make_phase(StepRest, s, e, srep, erep));
                }
                self.after_step(s, srep)
            }
            ExerciseRest => Some(self.make_phase(Exercise, s, e, srep, erep + 1)),
            StepRest => self.after_step(s, srep),
        }
    }

    /// Repeat the step or move on to the next one
    fn after_step(&self, step_index: u8, step_repetition: u8) -> Option<NestedPhase> {
        let step = &self.timer.steps[step_index as usize];
        if step_repetition < step.repetition {
            return Some(self.make_phase(
                NestedPhaseKind::Exercise,
                step_index,
                0,
                step_repetition + 1,
                1,
            ));
        }
        if (step_index as usize) + 1 < self.timer.steps.len() {
            return Some(self.make_phase(NestedPhaseKind::Exercise, step_index + 1, 0, 1, 1));
        }
        None
    }

    fn count_phases(&self) -> u32 {
        self.timer
            .steps
            .iter()
            .map(|step| {
                let pass: u32 = step
                    .exercises
                    .iter()
                    .map(|e| {
                        let reps = e.repetition as u32;
                        let rests = if e.rest_s > 0 { reps - 1 } else { 0 };
                        reps + rests
                    })
                    .sum();
                let step_rest = if step.rest_s > 0 { 1 } else { 0 };
                step.repetition as u32 * (pass + step_rest)
            })
            .sum()
    }
}

impl PhaseSequencer for NestedSequencer {
    type Phase = NestedPhase;

    fn current(&self) -> Option<&NestedPhase> {
        self.phase.as_ref()
    }

    fn tick(&mut self) -> Option<u16> {
        let phase = self.phase.as_mut()?;
        phase.remaining_s = phase.remaining_s.saturating_sub(1);
        Some(phase.remaining_s)
    }

    fn advance(&mut self) -> Transition<NestedPhase> {
        let Some(cur) = self.phase.take() else {
            return Transition::Complete(self.summary);
        };
        self.summary.record(cur.duration_s);

        match self.next_phase(&cur) {
            Some(mut next) => {
                next.instance = cur.instance + 1;
                self.phase = Some(next.clone());
                Transition::Continue(next)
            }
            None => Transition::Complete(self.summary),
        }
    }

    fn summary(&self) -> RunSummary {
        self.summary
    }

    fn phase_count(&self) -> u32 {
        self.phase_count
    }
}

/// Append as much of `text` as fits
fn push_truncated(label: &mut Label, text: &str) {
    for c in text.chars() {
        if label.write_char(c).is_err() {
            break;
        }
    }
}
