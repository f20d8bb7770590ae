//! Flat workout sequencer
//!
//! Walks the workout's sequences in ascending order. Rest sequences are
//! ordinary entries.

use heapless::Vec;

use super::{PhaseSequencer, Progress, RunSummary, RuntimePhase, Transition};
use crate::config::MAX_SEQUENCES;
use crate::program::{DefinitionError, Sequence, SequenceKind, WorkoutType};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Runtime state of one workout sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlatPhase {
    /// Sequence order
    pub order: u16,
    /// Effort or rest
    pub kind: SequenceKind,
    /// Phase length (seconds)
    pub duration_s: u16,
    /// Seconds left
    pub remaining_s: u16,
    /// Force is sampled during this phase
    pub record_force: bool,
    /// Transition counter
    pub instance: u32,
}

impl RuntimePhase for FlatPhase {
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
        self.record_force.then_some(self.order)
    }
}

/// Sequencer for flat workouts
#[derive(Debug, Clone)]
pub struct FlatSequencer {
    workout: WorkoutType,
    order: Vec<u8, MAX_SEQUENCES>,
    position: usize,
    phase: Option<FlatPhase>,
    summary: RunSummary,
}

impl FlatSequencer {
    /// Create a sequencer positioned on the lowest order
    pub fn new(workout: WorkoutType) -> Result<Self, DefinitionError> {
        workout.validate()?;
        let order = workout.ordered_indices();

        let mut sequencer = Self {
            workout,
            order,
            position: 0,
            phase: None,
            summary: RunSummary::default(),
        };
        sequencer.phase = Some(sequencer.make_phase(0, 1));
        Ok(sequencer)
    }

    /// Definition of the current sequence
    pub fn sequence(&self) -> Option<&Sequence> {
        self.phase.as_ref()?;
        self.order
            .get(self.position)
            .map(|&i| &self.workout.sequences[i as usize])
    }

    /// Sequences finished out of the total
    pub fn progress(&self) -> Progress {
        let total = self.order.len() as u16;
        let completed = if self.phase.is_some() {
            self.position as u16
        } else {
            total
        };
        Progress { completed, total }
    }

    fn make_phase(&self, position: usize, instance: u32) -> FlatPhase {
        let seq = &self.workout.sequences[self.order[position] as usize];
        FlatPhase {
            order: seq.order,
            kind: seq.kind,
            duration_s: seq.duration_s,
            remaining_s: seq.duration_s,
            record_force: seq.records_force(),
            instance,
        }
    }
}

impl PhaseSequencer for FlatSequencer {
    type Phase = FlatPhase;

    fn current(&self) -> Option<&FlatPhase> {
        self.phase.as_ref()
    }

    fn tick(&mut self) -> Option<u16> {
        let phase = self.phase.as_mut()?;
        phase.remaining_s = phase.remaining_s.saturating_sub(1);
        Some(phase.remaining_s)
    }

    fn advance(&mut self) -> Transition<FlatPhase> {
        let Some(cur) = self.phase.take() else {
            return Transition::Complete(self.summary);
        };
        self.summary.record(cur.duration_s);

        if self.position + 1 < self.order.len() {
            self.position += 1;
            let next = self.make_phase(self.position, cur.instance + 1);
            self.phase = Some(next);
            Transition::Continue(next)
        } else {
            Transition::Complete(self.summary)
        }
    }

    fn summary(&self) -> RunSummary {
        self.summary
    }

    fn phase_count(&self) -> u32 {
        self.order.len() as u32
    }

    fn workout(&self) -> Option<&WorkoutType> {
        Some(&self.workout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::workout::tests::repeaters;

    #[test]
    fn test_walks_in_ascending_order() {
        let mut workout = WorkoutType::new("mixed").unwrap();
        workout.push(Sequence::effort(20, 5, true)).unwrap();
        workout.push(Sequence::rest(10, 3)).unwrap();
        workout.push(Sequence::effort(30, 7, false)).unwrap();

        let mut sequencer = FlatSequencer::new(workout).unwrap();
        assert_eq!(sequencer.current().unwrap().order, 10);
        assert_eq!(sequencer.current().unwrap().kind, SequenceKind::Rest);

        let Transition::Continue(second) = sequencer.advance() else {
            panic!("expected second sequence");
        };
        assert_eq!(second.order, 20);
        assert_eq!(second.instance, 2);
        assert_eq!(second.recording_key(), Some(20));

        let Transition::Continue(third) = sequencer.advance() else {
            panic!("expected third sequence");
        };
        assert_eq!(third.order, 30);
        assert_eq!(third.recording_key(), None);

        match sequencer.advance() {
            Transition::Complete(summary) => {
                assert_eq!(summary.phases, 3);
                assert_eq!(summary.elapsed_s, 15);
            }
            Transition::Continue(_) => panic!("expected completion"),
        }
        assert!(sequencer.is_complete());
        assert!(sequencer.sequence().is_none());
    }

    #[test]
    fn test_flagged_rest_has_no_recording_key() {
        let mut workout = WorkoutType::new("flagged").unwrap();
        let mut rest = Sequence::rest(1, 3);
        rest.record_force = true;
        workout.push(rest).unwrap();
        workout.push(Sequence::effort(2, 5, true)).unwrap();

        let mut sequencer = FlatSequencer::new(workout).unwrap();
        assert_eq!(sequencer.current().unwrap().recording_key(), None);
        sequencer.advance();
        assert_eq!(sequencer.current().unwrap().recording_key(), Some(2));
    }

    #[test]
    fn test_rejects_invalid_workout() {
        let workout = WorkoutType::new("empty").unwrap();
        assert_eq!(
            FlatSequencer::new(workout).unwrap_err(),
            DefinitionError::NoSequences
        );
    }

    #[test]
    fn test_tick_counts_down_to_zero() {
        let mut sequencer = FlatSequencer::new(repeaters(1, 3, 0)).unwrap();
        assert_eq!(sequencer.tick(), Some(2));
        assert_eq!(sequencer.tick(), Some(1));
        assert_eq!(sequencer.tick(), Some(0));
        assert_eq!(sequencer.tick(), Some(0));
    }

    #[test]
    fn test_progress() {
        let mut sequencer = FlatSequencer::new(repeaters(3, 7, 3)).unwrap();
        assert_eq!(sequencer.progress(), Progress { completed: 0, total: 5 });
        sequencer.advance();
        sequencer.advance();
        assert_eq!(sequencer.progress().completed, 2);
        assert_eq!(sequencer.sequence().unwrap().order, 3);
        while !sequencer.is_complete() {
            sequencer.advance();
        }
        assert_eq!(sequencer.progress(), Progress { completed: 5, total: 5 });
    }
}
