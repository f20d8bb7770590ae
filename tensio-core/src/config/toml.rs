//! Training definition parser
//!
//! A minimal TOML reader for the subset used by `training.toml`. It does
//! NOT support the full TOML spec and never allocates.
//!
//! Supported features:
//! - Key = value pairs (string, integer, float, boolean)
//! - `[timer.<name>]`, `[timer.<name>.step.<name>]`, `[workout.<name>]`,
//!   `[run]` and `[gauge]` headers
//! - Arrays of inline tables, on one line or one table per line:
//!   `exercises = [{ name = "x", duration = 10 }]`
//! - Comments (# ...)
//!
//! NOT supported:
//! - Multi-line strings or inline tables spanning lines
//! - Nested inline tables
//! - Escape sequences inside strings

use crate::config::{Instruction, TrainingConfig};
use crate::program::{
    DefinitionError, Exercise, Sequence, SequenceKind, Step, Timer, WorkoutType,
};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Invalid or unknown section header
    InvalidSection,
    /// Invalid value type
    InvalidValue,
    /// Too many items (exceeded heapless capacity)
    TooManyItems,
    /// Name or text longer than its buffer
    TextTooLong,
    /// Array opened but never closed
    UnterminatedArray,
    /// Inline table without a required key
    MissingKey,
    /// A parsed timer or workout cannot be run
    Definition(DefinitionError),
}

impl From<DefinitionError> for ParseError {
    fn from(e: DefinitionError) -> Self {
        match e {
            DefinitionError::TooManyItems => ParseError::TooManyItems,
            DefinitionError::TextTooLong => ParseError::TextTooLong,
            other => ParseError::Definition(other),
        }
    }
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Timer,
    Step,
    Workout,
    Run,
    Gauge,
}

/// Array whose inline tables are still being read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenArray {
    Exercises,
    Sequences,
}

/// Definitions under construction
#[derive(Default)]
struct Builder {
    config: TrainingConfig,
    timer: Option<Timer>,
    step: Option<Step>,
    workout: Option<WorkoutType>,
}

impl Builder {
    /// Move the open step into its timer
    fn close_step(&mut self) -> Result<(), ParseError> {
        if let Some(step) = self.step.take() {
            let timer = self.timer.as_mut().ok_or(ParseError::InvalidSection)?;
            timer
                .steps
                .push(step)
                .map_err(|_| ParseError::TooManyItems)?;
        }
        Ok(())
    }

    /// Move every open item into the config
    fn close_all(&mut self) -> Result<(), ParseError> {
        self.close_step()?;
        if let Some(timer) = self.timer.take() {
            timer.validate()?;
            self.config
                .timers
                .push(timer)
                .map_err(|_| ParseError::TooManyItems)?;
        }
        if let Some(workout) = self.workout.take() {
            workout.validate()?;
            self.config
                .workouts
                .push(workout)
                .map_err(|_| ParseError::TooManyItems)?;
        }
        Ok(())
    }

    /// Enter the section named by a header (without brackets)
    fn open_section(&mut self, header: &str) -> Result<Section, ParseError> {
        let header = header.trim();
        let mut parts = header.split('.').map(str::trim);
        let kind = parts.next().unwrap_or("");
        let name = parts.next();
        let sub = parts.next();
        let sub_name = parts.next();
        if parts.next().is_some() {
            return Err(ParseError::InvalidSection);
        }

        match (kind, name, sub, sub_name) {
            ("timer", Some(timer), None, None) => {
                self.close_all()?;
                self.timer = Some(Timer::new(timer)?);
                Ok(Section::Timer)
            }
            ("timer", Some(timer), Some("step"), Some(step)) => {
                self.close_step()?;
                let same_timer = self.timer.as_ref().is_some_and(|t| t.name == timer);
                if !same_timer {
                    self.close_all()?;
                    self.timer = Some(Timer::new(timer)?);
                }
                self.step = Some(Step::new(step, 0, 1)?);
                Ok(Section::Step)
            }
            ("workout", Some(workout), None, None) => {
                self.close_all()?;
                self.workout = Some(WorkoutType::new(workout)?);
                Ok(Section::Workout)
            }
            ("run", None, None, None) => {
                self.close_all()?;
                Ok(Section::Run)
            }
            ("gauge", None, None, None) => {
                self.close_all()?;
                Ok(Section::Gauge)
            }
            _ => Err(ParseError::InvalidSection),
        }
    }

    /// Apply one `key = value` line; returns the array left open, if any
    fn apply_value(
        &mut self,
        section: Section,
        key: &str,
        value: &str,
    ) -> Result<Option<OpenArray>, ParseError> {
        match section {
            Section::Timer => {
                // Only the name lives at the timer level
            }
            Section::Step => {
                let step = self.step.as_mut().ok_or(ParseError::InvalidSection)?;
                match key {
                    "rest" => step.rest_s = parse_int(value)?,
                    "repetition" => step.repetition = parse_int(value)?,
                    "exercises" => return self.begin_array(OpenArray::Exercises, value),
                    _ => {}
                }
            }
            Section::Workout => {
                let workout = self.workout.as_mut().ok_or(ParseError::InvalidSection)?;
                match key {
                    "description" => workout.description = Some(parse_text(value)?),
                    "max_iso_force" => workout.max_iso_force = parse_bool(value)?,
                    "critical_force" => workout.critical_force = parse_bool(value)?,
                    "sequences" => return self.begin_array(OpenArray::Sequences, value),
                    _ => {}
                }
            }
            Section::Run => {
                let run = &mut self.config.run;
                match key {
                    "pre_roll" => run.pre_roll = parse_int(value)?,
                    "pre_roll_interval_ms" => run.pre_roll_interval_ms = parse_int(value)?,
                    "warning" => run.warning_s = parse_int(value)?,
                    "sample_period_ms" => run.sample_period_ms = parse_int(value)?,
                    "body_weight" => run.body_weight = parse_float(value)?,
                    _ => {}
                }
            }
            Section::Gauge => {
                let gauge = &mut self.config.gauge;
                match key {
                    "tare_counts" => gauge.tare_counts = parse_int(value)?,
                    "counts_per_kg" => gauge.counts_per_kg = parse_float(value)?,
                    "stale_after_s" => gauge.stale_after_s = parse_int(value)?,
                    _ => {}
                }
            }
            Section::Root => {}
        }
        Ok(None)
    }

    /// Read the tables on the first line of an array
    fn begin_array(
        &mut self,
        array: OpenArray,
        value: &str,
    ) -> Result<Option<OpenArray>, ParseError> {
        let inner = value.strip_prefix('[').ok_or(ParseError::InvalidValue)?;
        self.array_line(array, inner)
    }

    /// Read the tables on one array line; `None` once the array is closed
    fn array_line(
        &mut self,
        array: OpenArray,
        line: &str,
    ) -> Result<Option<OpenArray>, ParseError> {
        let (items, closed) = match find_unquoted(line, ']') {
            Some(end) => (&line[..end], true),
            None => (line, false),
        };
        for table in InlineTables::new(items) {
            let table = table?;
            match array {
                OpenArray::Exercises => {
                    let exercise = parse_exercise(table)?;
                    let step = self.step.as_mut().ok_or(ParseError::InvalidSection)?;
                    step.exercises
                        .push(exercise)
                        .map_err(|_| ParseError::TooManyItems)?;
                }
                OpenArray::Sequences => {
                    let workout = self.workout.as_mut().ok_or(ParseError::InvalidSection)?;
                    let next_order = workout
                        .sequences
                        .iter()
                        .map(|s| s.order)
                        .max()
                        .unwrap_or(0)
                        .checked_add(1);
                    let sequence = parse_sequence(table, next_order)?;
                    workout.push(sequence)?;
                }
            }
        }
        Ok(if closed { None } else { Some(array) })
    }
}

/// Parse a training definition file
///
/// Every timer and workout is validated before it is accepted.
pub fn parse_definitions(input: &str) -> Result<TrainingConfig, ParseError> {
    let mut builder = Builder::default();
    let mut section = Section::Root;
    let mut open_array: Option<OpenArray> = None;

    for line in input.lines() {
        let line = strip_comment(line).trim();

        // Skip empty lines and comments
        if line.is_empty() {
            continue;
        }

        if let Some(array) = open_array {
            open_array = builder.array_line(array, line)?;
            continue;
        }

        // Check for section header
        if line.starts_with('[') && line.ends_with(']') {
            section = builder.open_section(&line[1..line.len() - 1])?;
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            open_array = builder.apply_value(section, key, value)?;
        }
    }

    if open_array.is_some() {
        return Err(ParseError::UnterminatedArray);
    }
    builder.close_all()?;
    Ok(builder.config)
}

/// Parse `{ name = "hang", duration = 10, rest = 3, repetition = 2 }`
fn parse_exercise(table: &str) -> Result<Exercise, ParseError> {
    let mut name = None;
    let mut duration = None;
    let mut rest = 0;
    let mut repetition = 1;

    for (key, value) in Fields::new(table) {
        match key {
            "name" => name = Some(parse_string(value)?),
            "duration" => duration = Some(parse_int(value)?),
            "rest" => rest = parse_int(value)?,
            "repetition" => repetition = parse_int(value)?,
            _ => {}
        }
    }

    let name = name.ok_or(ParseError::MissingKey)?;
    let duration = duration.ok_or(ParseError::MissingKey)?;
    Ok(Exercise::new(name, duration, rest, repetition)?)
}

/// Parse `{ order = 1, kind = "effort", duration = 7, record_force = true }`
///
/// A missing order takes `next_order`, which is `None` once the highest
/// order is `u16::MAX`.
fn parse_sequence(table: &str, next_order: Option<u16>) -> Result<Sequence, ParseError> {
    let mut sequence = Sequence::default();
    let mut order = None;
    let mut duration = None;

    for (key, value) in Fields::new(table) {
        match key {
            "order" => order = Some(parse_int(value)?),
            "kind" => sequence.kind = parse_kind(value)?,
            "duration" => duration = Some(parse_int(value)?),
            "record_force" => sequence.record_force = parse_bool(value)?,
            "instruction" => sequence.instruction = Some(parse_text(value)?),
            _ => {}
        }
    }

    sequence.order = order.or(next_order).ok_or(ParseError::InvalidValue)?;
    sequence.duration_s = duration.ok_or(ParseError::MissingKey)?;
    Ok(sequence)
}

/// Parse sequence kind
fn parse_kind(value: &str) -> Result<SequenceKind, ParseError> {
    match parse_string(value)? {
        "effort" | "Effort" => Ok(SequenceKind::Effort),
        "rest" | "Rest" => Ok(SequenceKind::Rest),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Drop a trailing comment, ignoring `#` inside strings
fn strip_comment(line: &str) -> &str {
    match find_unquoted(line, '#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Position of `needle` outside double quotes
fn find_unquoted(s: &str, needle: char) -> Option<usize> {
    let mut quoted = false;
    for (i, c) in s.char_indices() {
        match c {
            '"' => quoted = !quoted,
            c if c == needle && !quoted => return Some(i),
            _ => {}
        }
    }
    None
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> Result<&str, ParseError> {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        Ok(&value[1..value.len() - 1])
    } else {
        // Allow unquoted strings for simple values
        Ok(value)
    }
}

/// Parse a string into instruction text
fn parse_text(value: &str) -> Result<Instruction, ParseError> {
    Instruction::try_from(parse_string(value)?).map_err(|_| ParseError::TextTooLong)
}

/// Parse an integer value
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue)
}

/// Parse a float value (integers accepted)
fn parse_float(value: &str) -> Result<f32, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Iterator over the `{ ... }` tables of an array line, yielding their inner text
struct InlineTables<'a> {
    rest: &'a str,
}

impl<'a> InlineTables<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for InlineTables<'a> {
    type Item = Result<&'a str, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let s = self.rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if s.is_empty() {
            self.rest = s;
            return None;
        }
        let Some(inner) = s.strip_prefix('{') else {
            self.rest = "";
            return Some(Err(ParseError::InvalidValue));
        };
        match find_unquoted(inner, '}') {
            Some(end) => {
                self.rest = &inner[end + 1..];
                Some(Ok(&inner[..end]))
            }
            None => {
                self.rest = "";
                Some(Err(ParseError::InvalidValue))
            }
        }
    }
}

/// Iterator over the `key = value` fields of an inline table
struct Fields<'a> {
    rest: &'a str,
}

impl<'a> Fields<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Fields<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.rest.trim().is_empty() {
                return None;
            }
            let (field, rest) = match find_unquoted(self.rest, ',') {
                Some(pos) => (&self.rest[..pos], &self.rest[pos + 1..]),
                None => (self.rest, ""),
            };
            self.rest = rest;
            if let Some(kv) = parse_key_value(field.trim()) {
                return Some(kv);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFINITIONS: &str = r#"
# Hangboard session
[run]
pre_roll = 3
warning = 3
body_weight = 72.5

[gauge]
tare_counts = -1200
counts_per_kg = 410.5

[timer.repeaters]

[timer.repeaters.step.main]
rest = 5
repetition = 2
exercises = [{ name = "hang", duration = 10, rest = 3, repetition = 2 }]

[timer.repeaters.step.cooldown]
exercises = [
    { name = "open hand", duration = 20 },
    { name = "crimp", duration = 15, rest = 5, repetition = 3 }, # two more
]

[workout.cf_test]
description = "7/3 repeaters, max effort"
critical_force = true
sequences = [
    { order = 2, kind = "rest", duration = 3 },
    { order = 1, kind = "effort", duration = 7, record_force = true, instruction = "Pull, hard" },
    { order = 3, duration = 7, record_force = true },
]
"#;

    #[test]
    fn test_parse_definitions() {
        let config = parse_definitions(DEFINITIONS).unwrap();

        assert_eq!(config.run.pre_roll, 3);
        assert_eq!(config.run.body_weight, 72.5);
        assert_eq!(config.gauge.tare_counts, -1200);
        assert_eq!(config.gauge.counts_per_kg, 410.5);

        let timer = config.timer("repeaters").unwrap();
        assert_eq!(timer.steps.len(), 2);
        assert_eq!(timer.steps[0].rest_s, 5);
        assert_eq!(timer.steps[0].repetition, 2);
        assert_eq!(timer.steps[0].exercises[0].name.as_str(), "hang");
        assert_eq!(timer.steps[0].exercises[0].repetition, 2);
        assert_eq!(timer.steps[1].repetition, 1);
        assert_eq!(timer.steps[1].exercises.len(), 2);
        assert_eq!(timer.steps[1].exercises[1].rest_s, 5);

        let workout = config.workout("cf_test").unwrap();
        assert!(workout.critical_force);
        assert!(!workout.max_iso_force);
        assert_eq!(workout.description.as_deref(), Some("7/3 repeaters, max effort"));
        assert_eq!(workout.sequences.len(), 3);
        assert_eq!(workout.sequences[0].kind, SequenceKind::Rest);
        assert_eq!(workout.sequences[1].instruction.as_deref(), Some("Pull, hard"));
        assert_eq!(workout.sequences[2].kind, SequenceKind::Effort);
        assert_eq!(config.program_count(), 2);
    }

    #[test]
    fn test_missing_order_follows_highest() {
        let config = parse_definitions(
            r#"
[workout.w]
sequences = [{ order = 5, duration = 2 }, { duration = 3 }]
"#,
        )
        .unwrap();
        assert_eq!(config.workouts[0].sequences[1].order, 6);
    }

    #[test]
    fn test_missing_order_after_highest_possible() {
        let result = parse_definitions(
            r#"
[workout.w]
sequences = [{ order = 65535, duration = 2 }, { duration = 3 }]
"#,
        );
        assert_eq!(result.err(), Some(ParseError::InvalidValue));

        let config = parse_definitions(
            r#"
[workout.w]
sequences = [{ order = 65535, duration = 2 }, { order = 1, duration = 3 }]
"#,
        )
        .unwrap();
        assert_eq!(config.workouts[0].sequences[1].order, 1);
    }

    #[test]
    fn test_step_without_timer_header() {
        let config = parse_definitions(
            r#"
[timer.quick.step.only]
exercises = [{ name = "hang", duration = 5 }]
"#,
        )
        .unwrap();
        assert_eq!(config.timers[0].name.as_str(), "quick");
        assert_eq!(config.timers[0].steps[0].name.as_str(), "only");
    }

    #[test]
    fn test_invalid_definitions_rejected() {
        let no_steps = "[timer.empty]\n";
        assert_eq!(
            parse_definitions(no_steps).unwrap_err(),
            ParseError::Definition(DefinitionError::NoSteps)
        );

        let duplicate = r#"
[workout.w]
sequences = [{ order = 1, duration = 2 }, { order = 1, duration = 3 }]
"#;
        assert_eq!(
            parse_definitions(duplicate).unwrap_err(),
            ParseError::Definition(DefinitionError::DuplicateOrder(1))
        );

        let zero = "[workout.w]\nsequences = [{ order = 1, duration = 0 }]\n";
        assert_eq!(
            parse_definitions(zero).unwrap_err(),
            ParseError::Definition(DefinitionError::ZeroDuration)
        );
    }

    #[test]
    fn test_malformed_input() {
        assert_eq!(
            parse_definitions("[stepper.spin]\n").unwrap_err(),
            ParseError::InvalidSection
        );
        assert_eq!(
            parse_definitions("[run]\npre_roll = lots\n").unwrap_err(),
            ParseError::InvalidValue
        );
        assert_eq!(
            parse_definitions("[workout.w]\nsequences = [\n{ duration = 2 },\n").unwrap_err(),
            ParseError::UnterminatedArray
        );
        assert_eq!(
            parse_definitions("[workout.w]\nsequences = [{ order = 1 }]\n").unwrap_err(),
            ParseError::MissingKey
        );
        assert_eq!(
            parse_definitions("[timer.a_name_that_is_far_too_long_for_a_label]\n").unwrap_err(),
            ParseError::TextTooLong
        );
    }

    #[test]
    fn test_inline_tables_respect_quotes() {
        let tables: std::vec::Vec<&str> = InlineTables::new(r#"{ a = "}" }, { b = 1 }"#)
            .map(Result::unwrap)
            .collect();
        assert_eq!(tables, [r#" a = "}" "#, " b = 1 "]);

        let fields: std::vec::Vec<(&str, &str)> =
            Fields::new(r#" name = "a, b", duration = 3 "#).collect();
        assert_eq!(fields, [("name", "\"a, b\""), ("duration", "3")]);
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("a = 1 # note"), "a = 1 ");
        assert_eq!(strip_comment(r##"a = "#1""##), r##"a = "#1""##);
        assert_eq!(strip_comment("# whole line"), "");
    }
}
