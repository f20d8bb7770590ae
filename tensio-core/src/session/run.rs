//! Single-run execution
//!
//! Time enters through [`Session::advance`]. Within one call, time is
//! stepped to the earliest of the next sample and the next clock event,
//! and due samples are always taken before clock events are applied. A
//! phase's last sample therefore lands in the phase that is ending, never
//! in the next one.

use super::SessionError;
use crate::clock::{ClockEvent, CountdownClock};
use crate::config::RunConfig;
use crate::cue::{CueEvent, CueScheduler};
use crate::metrics::{aggregate, WorkoutResult};
use crate::program::{Timer, WorkoutType};
use crate::sampler::{ForceSampler, Sample, SampleBuffer, WeightCell};
use crate::sequencer::{
    FlatSequencer, NestedSequencer, PhaseSequencer, RunSummary, RuntimePhase, Transition,
};
use crate::state::{Event, State};

/// Something that happened during [`Session::advance`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunEvent<P> {
    /// Pre-roll count now showing
    PreRoll(u8),
    /// A phase began
    PhaseStarted(P),
    /// One second counted off a phase
    Tick {
        /// Phase instance
        instance: u32,
        /// Seconds left
        remaining_s: u16,
    },
    /// A cue should play
    Cue(CueEvent),
    /// A force sample was recorded
    Sample(Sample),
    /// The last phase ended
    Completed(RunSummary),
}

/// Session walking a nested timer
pub type TimerSession = Session<NestedSequencer>;

/// Session walking a flat workout
pub type WorkoutSession = Session<FlatSequencer>;

/// One run of a timer or workout
#[derive(Debug, Clone)]
pub struct Session<S: PhaseSequencer> {
    sequencer: S,
    clock: CountdownClock,
    cues: CueScheduler,
    sampler: ForceSampler,
    state: State,
    /// Cleared on teardown; nothing is produced afterwards
    live: bool,
    /// Time spent with the clock running (ms)
    running_ms: u32,
    /// Samples lost to a full buffer
    dropped_samples: u32,
    /// Metrics computed at completion (workouts only)
    result: Option<WorkoutResult>,
}

impl TimerSession {
    /// Build a session for a nested timer
    pub fn for_timer(timer: Timer, run: &RunConfig) -> Result<Self, SessionError> {
        Ok(Self::new(NestedSequencer::new(timer)?, run))
    }
}

impl WorkoutSession {
    /// Build a session for a flat workout
    pub fn for_workout(workout: WorkoutType, run: &RunConfig) -> Result<Self, SessionError> {
        Ok(Self::new(FlatSequencer::new(workout)?, run))
    }
}

impl<S: PhaseSequencer> Session<S> {
    /// Create an idle session around a sequencer
    pub fn new(sequencer: S, run: &RunConfig) -> Self {
        Self {
            sequencer,
            clock: CountdownClock::new(run.clock()),
            cues: CueScheduler::new(run.warning_s),
            sampler: ForceSampler::new(run.sample_period_ms),
            state: State::Idle,
            live: true,
            running_ms: 0,
            dropped_samples: 0,
            result: None,
        }
    }

    /// Current run state
    pub fn state(&self) -> State {
        self.state
    }

    /// Sequencer (for progress and labels)
    pub fn sequencer(&self) -> &S {
        &self.sequencer
    }

    /// Current phase
    pub fn current(&self) -> Option<&S::Phase> {
        self.sequencer.current()
    }

    /// Pre-roll count currently shown (0 outside the pre-roll)
    pub fn pre_roll_count(&self) -> u8 {
        self.clock.pre_roll_count()
    }

    /// Time the clock has been running, excluding pauses (ms)
    pub fn running_ms(&self) -> u32 {
        self.running_ms
    }

    /// Samples recorded so far
    pub fn samples(&self) -> &SampleBuffer {
        self.sampler.buffer()
    }

    /// Samples lost because the buffer was full
    pub fn dropped_samples(&self) -> u32 {
        self.dropped_samples
    }

    /// Metrics of a completed workout
    ///
    /// Kept for the lifetime of the session so a failed save can be retried.
    pub fn result(&self) -> Option<&WorkoutResult> {
        self.result.as_ref()
    }

    /// Check if the session still produces events
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Start the run
    ///
    /// With a pre-roll the first count is reported right away; without
    /// one the first phase starts immediately.
    pub fn start(
        &mut self,
        mut on_event: impl FnMut(RunEvent<S::Phase>),
    ) -> Result<(), SessionError> {
        if !self.live {
            return Err(SessionError::Inactive);
        }
        if self.state != State::Idle {
            return Err(SessionError::InvalidState);
        }
        self.state = self.state.transition(Event::Start);
        self.clock.start();

        if !self.clock.is_pre_rolling() {
            self.state = self.state.transition(Event::PreRollFinished);
            self.begin_phase(false, &mut on_event)?;
        }
        self.drain_clock(&mut on_event)
    }

    /// Freeze the clock and close the recording window
    pub fn pause(&mut self) -> Result<(), SessionError> {
        if !self.live {
            return Err(SessionError::Inactive);
        }
        let next = self.state.transition(Event::Pause);
        if next == self.state {
            return Err(SessionError::InvalidState);
        }
        self.state = next;
        self.clock.pause();
        self.sampler.close();
        Ok(())
    }

    /// Continue after a pause, opening a new recording window
    pub fn resume(&mut self) -> Result<(), SessionError> {
        if !self.live {
            return Err(SessionError::Inactive);
        }
        let next = self.state.transition(Event::Resume);
        if next == self.state {
            return Err(SessionError::InvalidState);
        }
        self.state = next;
        self.clock.resume();
        if self.state.sampling_allowed() {
            self.open_window()?;
        }
        Ok(())
    }

    /// Tear the run down; nothing is produced afterwards
    pub fn abort(&mut self) {
        self.state = self.state.transition(Event::Abort);
        self.teardown();
    }

    /// Feed elapsed time
    ///
    /// Events are reported in the order they happen. Time fed while paused
    /// is discarded.
    pub fn advance(
        &mut self,
        delta_ms: u32,
        cell: &WeightCell,
        mut on_event: impl FnMut(RunEvent<S::Phase>),
    ) -> Result<(), SessionError> {
        let mut left = delta_ms;
        loop {
            if !self.live {
                return Ok(());
            }
            self.service(cell, &mut on_event)?;
            if left == 0 || !self.live {
                return Ok(());
            }

            let step = [self.sampler.until_next_ms(), self.clock.until_next_ms()]
                .into_iter()
                .flatten()
                .fold(left, u32::min)
                .max(1);

            if self.clock.is_ticking() || (self.clock.is_pre_rolling() && !self.clock.is_paused()) {
                self.running_ms = self.running_ms.saturating_add(step);
            }
            self.sampler.elapse(step);
            self.clock.elapse(step);
            left -= step;
        }
    }

    /// Take due samples, then apply due clock events, until nothing is due
    fn service(
        &mut self,
        cell: &WeightCell,
        on_event: &mut impl FnMut(RunEvent<S::Phase>),
    ) -> Result<(), SessionError> {
        loop {
            loop {
                match self.sampler.poll(cell) {
                    Ok(Some(sample)) => on_event(RunEvent::Sample(sample)),
                    Ok(None) if self.sampler.until_next_ms() == Some(0) => continue,
                    Ok(None) => break,
                    Err(SessionError::SampleBufferFull) => {
                        self.dropped_samples = self.dropped_samples.saturating_add(1);
                    }
                    Err(e) => return Err(e),
                }
            }

            match self.clock.next_event() {
                Some(event) => self.on_clock(event, on_event)?,
                None => return Ok(()),
            }
            if !self.live {
                return Ok(());
            }
        }
    }

    fn drain_clock(
        &mut self,
        on_event: &mut impl FnMut(RunEvent<S::Phase>),
    ) -> Result<(), SessionError> {
        while self.live {
            match self.clock.next_event() {
                Some(event) => self.on_clock(event, on_event)?,
                None => break,
            }
        }
        Ok(())
    }

    fn on_clock(
        &mut self,
        event: ClockEvent,
        on_event: &mut impl FnMut(RunEvent<S::Phase>),
    ) -> Result<(), SessionError> {
        match event {
            ClockEvent::PreRoll(count) => {
                on_event(RunEvent::PreRoll(count));
                if let Some(cue) = self.cues.on_pre_roll() {
                    on_event(RunEvent::Cue(cue));
                }
            }
            ClockEvent::PreRollFinished => {
                self.state = self.state.transition(Event::PreRollFinished);
                self.begin_phase(true, on_event)?;
            }
            ClockEvent::PhaseTick => {
                let Some(instance) = self.sequencer.current().map(|p| p.instance()) else {
                    return Ok(());
                };
                let Some(remaining_s) = self.sequencer.tick() else {
                    return Ok(());
                };
                on_event(RunEvent::Tick {
                    instance,
                    remaining_s,
                });
                if let Some(cue) = self.cues.on_remaining(instance, remaining_s) {
                    on_event(RunEvent::Cue(cue));
                }
                if remaining_s == 0 {
                    self.next_phase(instance, on_event)?;
                }
            }
        }
        Ok(())
    }

    /// Report the current phase as started and open its window
    fn begin_phase(
        &mut self,
        after_pre_roll: bool,
        on_event: &mut impl FnMut(RunEvent<S::Phase>),
    ) -> Result<(), SessionError> {
        let Some(phase) = self.sequencer.current().cloned() else {
            return Ok(());
        };
        let instance = phase.instance();
        on_event(RunEvent::PhaseStarted(phase));
        if let Some(cue) = self.cues.on_phase_start(instance, after_pre_roll) {
            on_event(RunEvent::Cue(cue));
        }
        self.open_window()
    }

    fn next_phase(
        &mut self,
        instance: u32,
        on_event: &mut impl FnMut(RunEvent<S::Phase>),
    ) -> Result<(), SessionError> {
        self.sampler.close();
        match self.sequencer.advance() {
            Transition::Continue(_) => self.begin_phase(false, on_event),
            Transition::Complete(summary) => {
                self.state = self.state.transition(Event::Finish);
                if let Some(workout) = self.sequencer.workout() {
                    self.result = Some(aggregate(workout, self.sampler.buffer()));
                }
                if let Some(cue) = self.cues.on_complete(instance) {
                    on_event(RunEvent::Cue(cue));
                }
                on_event(RunEvent::Completed(summary));
                self.teardown();
                Ok(())
            }
        }
    }

    fn open_window(&mut self) -> Result<(), SessionError> {
        match self.sequencer.current().and_then(|p| p.recording_key()) {
            Some(key) => self.sampler.open(key),
            None => Ok(()),
        }
    }

    fn teardown(&mut self) {
        self.live = false;
        self.clock.stop();
        self.sampler.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::Cue;
    use crate::program::timer::tests::{exercise, single_step_timer};
    use crate::program::workout::tests::repeaters;
    use crate::sequencer::FlatPhase;
    use proptest::prelude::*;

    fn no_pre_roll() -> RunConfig {
        RunConfig {
            pre_roll: 0,
            ..RunConfig::default()
        }
    }

    fn gauge(weight: f32) -> WeightCell {
        let cell = WeightCell::new();
        cell.set_connected(true);
        cell.publish(weight);
        cell
    }

    fn cues<P>(events: &[RunEvent<P>]) -> std::vec::Vec<Cue> {
        events
            .iter()
            .filter_map(|e| match e {
                RunEvent::Cue(c) => Some(c.cue),
                _ => None,
            })
            .collect()
    }

    /// Advance in `step_ms` slices until the session stops, collecting events
    fn run_to_end<S: PhaseSequencer>(
        session: &mut Session<S>,
        cell: &WeightCell,
        step_ms: u32,
    ) -> std::vec::Vec<RunEvent<S::Phase>> {
        let mut events = std::vec::Vec::new();
        let mut guard = 0;
        while session.is_live() {
            session
                .advance(step_ms, cell, |e| events.push(e))
                .unwrap();
            guard += 1;
            assert!(guard < 100_000, "session never finished");
        }
        events
    }

    #[test]
    fn test_pre_roll_then_first_phase() {
        let mut session =
            WorkoutSession::for_workout(repeaters(1, 2, 0), &RunConfig::default()).unwrap();
        let mut events = std::vec::Vec::new();
        session.start(|e| events.push(e)).unwrap();

        assert_eq!(session.state(), State::PreRoll);
        assert_eq!(events[0], RunEvent::PreRoll(3));
        assert_eq!(cues(&events), [Cue::Intro]);

        let cell = gauge(10.0);
        session.advance(2250, &cell, |e| events.push(e)).unwrap();
        assert_eq!(session.state(), State::Running);
        assert!(events
            .iter()
            .any(|e| matches!(e, RunEvent::PhaseStarted(p) if p.order == 1)));
        // Start is suppressed for the phase the pre-roll led into
        assert_eq!(cues(&events), [Cue::Intro]);
    }

    #[test]
    fn test_five_second_phase_cues() {
        let mut workout = repeaters(1, 5, 0);
        workout.push(crate::program::Sequence::rest(2, 5)).unwrap();
        let mut session = WorkoutSession::for_workout(workout, &no_pre_roll()).unwrap();
        let mut events = std::vec::Vec::new();
        session.start(|e| events.push(e)).unwrap();

        let cell = gauge(10.0);
        events.extend(run_to_end(&mut session, &cell, 100));

        let first: std::vec::Vec<Cue> = events
            .iter()
            .filter_map(|e| match e {
                RunEvent::Cue(c) if c.instance == 1 => Some(c.cue),
                _ => None,
            })
            .collect();
        assert_eq!(first, [Cue::Start, Cue::Countdown, Cue::End]);

        let all = cues(&events);
        assert_eq!(all.iter().filter(|c| **c == Cue::Start).count(), 2);
        assert_eq!(all.iter().filter(|c| **c == Cue::End).count(), 2);
        assert_eq!(all.last(), Some(&Cue::Victory));
        assert_eq!(session.state(), State::Complete);
    }

    #[test]
    fn test_warning_length_phase_counts_down() {
        let mut session = WorkoutSession::for_workout(repeaters(2, 3, 3), &no_pre_roll()).unwrap();
        let mut events = std::vec::Vec::new();
        session.start(|e| events.push(e)).unwrap();
        events.extend(run_to_end(&mut session, &gauge(10.0), 250));

        for instance in 1..=3 {
            let phase: std::vec::Vec<Cue> = events
                .iter()
                .filter_map(|e| match e {
                    RunEvent::Cue(c) if c.instance == instance => Some(c.cue),
                    _ => None,
                })
                .collect();
            assert!(phase.contains(&Cue::Countdown), "instance {instance}");
        }

        // The warning lands on the tick leaving 3 s behind
        let warned_at = events
            .iter()
            .position(|e| matches!(e, RunEvent::Cue(c) if c.cue == Cue::Countdown))
            .unwrap();
        assert!(matches!(
            events[warned_at - 1],
            RunEvent::Tick { instance: 1, remaining_s: 2 }
        ));
    }

    #[test]
    fn test_samples_belong_to_ending_phase() {
        let mut workout = repeaters(2, 5, 0);
        workout.critical_force = true;
        let mut session = WorkoutSession::for_workout(workout, &no_pre_roll()).unwrap();
        session.start(|_| {}).unwrap();

        let cell = gauge(20.0);
        run_to_end(&mut session, &cell, 1000);

        let samples = session.samples();
        assert_eq!(samples.phase(1).unwrap().len(), 50);
        assert_eq!(samples.phase(2).unwrap().len(), 50);
        assert_eq!(samples.phase(1).unwrap()[49].elapsed_ms, 5000);

        let result = session.result().unwrap();
        assert_eq!(result.critical_force, Some(20.0));
        assert_eq!(result.max_weight, 20.0);
    }

    #[test]
    fn test_flagged_rest_takes_no_samples() {
        let mut workout = crate::program::WorkoutType::new("flagged").unwrap();
        workout
            .push(crate::program::Sequence::effort(1, 2, true))
            .unwrap();
        let mut rest = crate::program::Sequence::rest(2, 2);
        rest.record_force = true;
        workout.push(rest).unwrap();

        let mut session = WorkoutSession::for_workout(workout, &no_pre_roll()).unwrap();
        let mut events = std::vec::Vec::new();
        session.start(|e| events.push(e)).unwrap();
        events.extend(run_to_end(&mut session, &gauge(40.0), 100));

        assert!(events
            .iter()
            .any(|e| matches!(e, RunEvent::PhaseStarted(p) if p.order == 2 && !p.record_force)));
        assert_eq!(session.samples().phase(1).unwrap().len(), 20);
        assert!(session.samples().phase(2).map_or(true, |s| s.is_empty()));

        let result = session.result().unwrap();
        assert_eq!(result.phase(2).unwrap().count, 0);
        assert_eq!(result.phase(2).unwrap().average, None);
        assert_eq!(result.phase(1).unwrap().average, Some(40.0));
    }

    #[test]
    fn test_tick_events_count_down() {
        let mut session = WorkoutSession::for_workout(repeaters(1, 3, 0), &no_pre_roll()).unwrap();
        session.start(|_| {}).unwrap();
        let events = run_to_end(&mut session, &WeightCell::new(), 250);

        let remaining: std::vec::Vec<u16> = events
            .iter()
            .filter_map(|e| match e {
                RunEvent::Tick { remaining_s, .. } => Some(*remaining_s),
                _ => None,
            })
            .collect();
        assert_eq!(remaining, [2, 1, 0]);
        assert!(matches!(events.last(), Some(RunEvent::Completed(s)) if s.elapsed_s == 3));
    }

    #[test]
    fn test_pause_freezes_clock_and_sampler() {
        let mut session = WorkoutSession::for_workout(repeaters(1, 5, 0), &no_pre_roll()).unwrap();
        session.start(|_| {}).unwrap();
        let cell = gauge(12.0);

        session.advance(1050, &cell, |_| {}).unwrap();
        assert_eq!(session.samples().len(), 10);
        session.pause().unwrap();
        assert_eq!(session.state(), State::Paused { pre_roll: false });

        let mut events: std::vec::Vec<RunEvent<FlatPhase>> = std::vec::Vec::new();
        session.advance(60_000, &cell, |e| events.push(e)).unwrap();
        assert!(events.is_empty());
        assert_eq!(session.samples().len(), 10);
        assert_eq!(session.current().unwrap().remaining_s, 4);

        session.resume().unwrap();
        session.advance(200, &cell, |_| {}).unwrap();
        let phase = session.samples().phase(1).unwrap();
        assert_eq!(phase.len(), 12);
        assert_eq!(phase[10].window, 1);
        assert_eq!(phase[10].iteration, 0);
        assert_eq!(phase[10].elapsed_ms, 100);
    }

    #[test]
    fn test_pause_during_pre_roll() {
        let mut session = TimerSession::for_timer(
            single_step_timer(0, 1, &[exercise("hang", 2, 0, 1)]),
            &RunConfig::default(),
        )
        .unwrap();
        let mut events = std::vec::Vec::new();
        session.start(|e| events.push(e)).unwrap();
        let cell = WeightCell::new();

        session.advance(800, &cell, |e| events.push(e)).unwrap();
        assert_eq!(session.pre_roll_count(), 2);
        session.pause().unwrap();
        assert_eq!(session.state(), State::Paused { pre_roll: true });
        session.advance(5000, &cell, |e| events.push(e)).unwrap();
        session.resume().unwrap();
        assert_eq!(session.state(), State::PreRoll);

        events.extend(run_to_end(&mut session, &cell, 50));
        let counts: std::vec::Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                RunEvent::PreRoll(n) => Some(*n),
                _ => None,
            })
            .collect();
        assert_eq!(counts, [3, 2, 1]);
        assert_eq!(cues(&events).iter().filter(|c| **c == Cue::Intro).count(), 1);
        assert_eq!(session.running_ms(), 2250 + 2000);
    }

    #[test]
    fn test_abort_silences_session() {
        let mut session = WorkoutSession::for_workout(repeaters(1, 5, 0), &no_pre_roll()).unwrap();
        session.start(|_| {}).unwrap();
        let cell = gauge(5.0);
        session.advance(500, &cell, |_| {}).unwrap();

        session.abort();
        assert_eq!(session.state(), State::Aborted);
        assert!(!session.is_live());

        let mut events: std::vec::Vec<RunEvent<FlatPhase>> = std::vec::Vec::new();
        session.advance(10_000, &cell, |e| events.push(e)).unwrap();
        assert!(events.is_empty());
        assert_eq!(session.samples().len(), 5);
        assert!(session.result().is_none());
        assert_eq!(session.pause(), Err(SessionError::Inactive));
        assert_eq!(session.start(|_| {}), Err(SessionError::Inactive));
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        let mut session = WorkoutSession::for_workout(repeaters(1, 5, 0), &no_pre_roll()).unwrap();
        assert_eq!(session.pause(), Err(SessionError::InvalidState));
        assert_eq!(session.resume(), Err(SessionError::InvalidState));
        session.start(|_| {}).unwrap();
        assert_eq!(session.start(|_| {}), Err(SessionError::InvalidState));
        assert_eq!(session.resume(), Err(SessionError::InvalidState));
    }

    #[test]
    fn test_timer_session_has_no_result() {
        let timer = single_step_timer(5, 2, &[exercise("hang", 10, 3, 2)]);
        let mut session = TimerSession::for_timer(timer, &no_pre_roll()).unwrap();
        session.start(|_| {}).unwrap();
        let events = run_to_end(&mut session, &gauge(30.0), 1000);

        assert!(session.result().is_none());
        assert!(session.samples().is_empty());
        assert_eq!(session.running_ms(), 56_000);
        assert!(matches!(events.last(), Some(RunEvent::Completed(s)) if s.phases == 8));
    }

    #[test]
    fn test_invalid_definition() {
        let result = WorkoutSession::for_workout(WorkoutType::default(), &no_pre_roll());
        assert!(matches!(
            result,
            Err(SessionError::Definition(crate::program::DefinitionError::NoSequences))
        ));
    }

    proptest! {
        #[test]
        fn prop_pauses_do_not_change_running_time(
            efforts in 1u16..4,
            effort_s in 1u16..6,
            rest_s in 0u16..4,
            pauses in prop::collection::vec((1u32..40, 1u32..5000), 0..6),
        ) {
            let workout = repeaters(efforts, effort_s, rest_s);
            let expected = 2250 + workout.total_duration_s() * 1000;
            let mut session = WorkoutSession::for_workout(workout, &RunConfig::default()).unwrap();
            session.start(|_| {}).unwrap();
            let cell = gauge(1.0);

            let mut pauses = pauses.into_iter();
            let mut next_pause = pauses.next();
            let mut slices = 0u32;
            while session.is_live() {
                session.advance(100, &cell, |_| {}).unwrap();
                slices += 1;
                if let Some((at, duration)) = next_pause {
                    if slices == at && session.is_live() {
                        session.pause().unwrap();
                        session.advance(duration, &cell, |_| {}).unwrap();
                        session.resume().unwrap();
                        next_pause = pauses.next();
                    } else if slices > at {
                        next_pause = pauses.next();
                    }
                }
                prop_assert!(slices < 10_000);
            }

            prop_assert_eq!(session.running_ms(), expected);
            prop_assert_eq!(session.state(), State::Complete);
        }
    }
}
