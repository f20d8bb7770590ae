//! Flat workout definitions

use heapless::Vec;

use super::DefinitionError;
use crate::config::{Instruction, Label, MAX_SEQUENCES};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kind of a workout sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SequenceKind {
    /// Work interval
    #[default]
    Effort,
    /// Recovery interval
    Rest,
}

/// One entry of a workout
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sequence {
    /// Position in the workout (unique, read ascending)
    pub order: u16,
    /// Effort or rest
    pub kind: SequenceKind,
    /// Duration (seconds, > 0)
    pub duration_s: u16,
    /// Whether force is sampled during this sequence
    pub record_force: bool,
    /// Optional instruction shown while running
    pub instruction: Option<Instruction>,
}

/// A structured workout
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorkoutType {
    /// Display name
    pub name: Label,
    /// Optional description
    pub description: Option<Instruction>,
    /// Sequences, in any order
    pub sequences: Vec<Sequence, MAX_SEQUENCES>,
    /// Report max isometric force from the first efforts
    pub max_iso_force: bool,
    /// Report critical force from the last efforts
    pub critical_force: bool,
}

impl Sequence {
    /// Effort sequence
    pub const fn effort(order: u16, duration_s: u16, record_force: bool) -> Self {
        Self {
            order,
            kind: SequenceKind::Effort,
            duration_s,
            record_force,
            instruction: None,
        }
    }

    /// Rest sequence (never records)
    pub const fn rest(order: u16, duration_s: u16) -> Self {
        Self {
            order,
            kind: SequenceKind::Rest,
            duration_s,
            record_force: false,
            instruction: None,
        }
    }

    /// Check if this is an effort
    pub fn is_effort(&self) -> bool {
        self.kind == SequenceKind::Effort
    }

    /// Check if force is sampled during this sequence
    ///
    /// Only efforts record; a rest's `record_force` flag is ignored.
    pub fn records_force(&self) -> bool {
        self.is_effort() && self.record_force
    }
}

impl WorkoutType {
    /// Create an empty workout
    pub fn new(name: &str) -> Result<Self, DefinitionError> {
        Ok(Self {
            name: Label::try_from(name).map_err(|_| DefinitionError::TextTooLong)?,
            ..Self::default()
        })
    }

    /// Append a sequence
    pub fn push(&mut self, sequence: Sequence) -> Result<(), DefinitionError> {
        self.sequences
            .push(sequence)
            .map_err(|_| DefinitionError::TooManyItems)
    }

    /// Append `count` effort/rest pairs, numbering orders after the last one
    ///
    /// The trailing rest is omitted, as is every rest when `rest_s` is 0.
    pub fn push_intervals(
        &mut self,
        count: u16,
        effort_s: u16,
        rest_s: u16,
        record_force: bool,
    ) -> Result<(), DefinitionError> {
        let mut order = self.sequences.iter().map(|s| s.order).max().unwrap_or(0);
        for i in 0..count {
            order = order.checked_add(1).ok_or(DefinitionError::TooManyItems)?;
            self.push(Sequence::effort(order, effort_s, record_force))?;
            if rest_s > 0 && i + 1 < count {
                order = order.checked_add(1).ok_or(DefinitionError::TooManyItems)?;
                self.push(Sequence::rest(order, rest_s))?;
            }
        }
        Ok(())
    }

    /// Check that the workout can be run
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.sequences.is_empty() {
            return Err(DefinitionError::NoSequences);
        }
        for (i, seq) in self.sequences.iter().enumerate() {
            if seq.duration_s == 0 {
                return Err(DefinitionError::ZeroDuration);
            }
            if self.sequences[..i].iter().any(|s| s.order == seq.order) {
                return Err(DefinitionError::DuplicateOrder(seq.order));
            }
        }
        Ok(())
    }

    /// Sequence indices sorted by ascending order
    pub fn ordered_indices(&self) -> Vec<u8, MAX_SEQUENCES> {
        let mut indices: Vec<u8, MAX_SEQUENCES> = (0..self.sequences.len() as u8).collect();
        indices.sort_unstable_by_key(|&i| self.sequences[i as usize].order);
        indices
    }

    /// Sequences in execution order
    pub fn ordered(&self) -> impl Iterator<Item = &Sequence> + '_ {
        let indices = self.ordered_indices();
        indices.into_iter().map(move |i| &self.sequences[i as usize])
    }

    /// Total duration (seconds)
    pub fn total_duration_s(&self) -> u32 {
        self.sequences.iter().map(|s| s.duration_s as u32).sum()
    }

    /// Check if any sequence samples force
    pub fn records_force(&self) -> bool {
        self.sequences.iter().any(Sequence::records_force)
    }
}
