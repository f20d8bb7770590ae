//! Main controller coordinating program selection, runs and the gauge
//!
//! The controller is the central brain that:
//! - Processes button events
//! - Builds and drives the run session for the selected program
//! - Watches the gauge link
//! - Queues cues and run notices for the tasks to deliver
//! - Hands finished workouts to the record sink

use heapless::Deque;

use tensio_core::config::TrainingConfig;
use tensio_core::cue::Cue;
use tensio_core::gauge::{GaugeMonitor, LinkStatus};
use tensio_core::metrics::WorkoutResult;
use tensio_core::sampler::WeightCell;
use tensio_core::sequencer::{PhaseSequencer, RunSummary, RuntimePhase};
use tensio_core::session::{RunEvent, SessionError, TimerSession, WorkoutSession};
use tensio_core::state::{Event, State};
use tensio_core::traits::{StoreError, WorkoutReceipt, WorkoutRecordSink};

use crate::input::InputEvent;

/// Queued outputs per controller call
const OUTPUT_QUEUE_SIZE: usize = 16;

/// Save attempts before a finished workout waits for the user
pub const MAX_SAVE_ATTEMPTS: u8 = 3;

/// Why an input was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerError {
    /// No timers or workouts loaded
    NoPrograms,
    /// Force-recording workout selected with the gauge disconnected
    GaugeDisconnected,
    /// Session rejected the operation
    Session(SessionError),
}

impl From<SessionError> for ControllerError {
    fn from(e: SessionError) -> Self {
        ControllerError::Session(e)
    }
}

/// Something the tasks should deliver or log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Output {
    /// Play a cue
    Cue(Cue),
    /// Pre-roll count showing
    PreRoll(u8),
    /// A phase began
    PhaseStarted {
        /// Transition counter
        instance: u32,
        /// Phase length (seconds)
        duration_s: u16,
        /// Force is recorded during the phase
        recording: bool,
    },
    /// Run finished
    Completed(RunSummary),
    /// Gauge link changed
    Link(LinkStatus),
}

/// The run in progress
enum ActiveRun {
    Timer(TimerSession),
    Workout(WorkoutSession),
}

impl ActiveRun {
    fn state(&self) -> State {
        match self {
            ActiveRun::Timer(s) => s.state(),
            ActiveRun::Workout(s) => s.state(),
        }
    }

    fn pause(&mut self) -> Result<(), SessionError> {
        match self {
            ActiveRun::Timer(s) => s.pause(),
            ActiveRun::Workout(s) => s.pause(),
        }
    }

    fn resume(&mut self) -> Result<(), SessionError> {
        match self {
            ActiveRun::Timer(s) => s.resume(),
            ActiveRun::Workout(s) => s.resume(),
        }
    }

    fn abort(&mut self) {
        match self {
            ActiveRun::Timer(s) => s.abort(),
            ActiveRun::Workout(s) => s.abort(),
        }
    }

    fn running_ms(&self) -> u32 {
        match self {
            ActiveRun::Timer(s) => s.running_ms(),
            ActiveRun::Workout(s) => s.running_ms(),
        }
    }
}

/// Controller state for coordinating subsystems
pub struct Controller {
    /// Loaded definitions
    definitions: &'static TrainingConfig,
    /// Currently selected program (timers first, then workouts)
    selected_program: u8,
    /// Run in progress or finished and not yet dismissed
    run: Option<ActiveRun>,
    /// Gauge link monitor
    gauge: GaugeMonitor,
    /// Outputs waiting for the tasks
    outputs: Deque<Output, OUTPUT_QUEUE_SIZE>,
    /// Seconds left in the current phase
    remaining_s: u16,
    /// Finished workout waiting to be saved
    save_pending: bool,
    /// Failed saves of the current result
    save_attempts: u8,
    /// Receipt of the saved result
    receipt: Option<WorkoutReceipt>,
    /// Last tick timestamp (ms)
    last_tick_ms: u32,
}

impl Controller {
    /// Create a controller over the loaded definitions
    pub fn new(definitions: &'static TrainingConfig) -> Self {
        Self {
            definitions,
            selected_program: 0,
            run: None,
            gauge: GaugeMonitor::new(definitions.gauge.stale_after_s as u32 * 1000),
            outputs: Deque::new(),
            remaining_s: 0,
            save_pending: false,
            save_attempts: 0,
            receipt: None,
            last_tick_ms: 0,
        }
    }

    /// Current run state (Idle when no run is loaded)
    pub fn state(&self) -> State {
        self.run.as_ref().map(|r| r.state()).unwrap_or(State::Idle)
    }

    /// Currently selected program index
    pub fn selected_program(&self) -> u8 {
        self.selected_program
    }

    /// Name of the selected program
    pub fn selected_name(&self) -> Option<&str> {
        let index = self.selected_program as usize;
        let timers = &self.definitions.timers;
        match timers.get(index) {
            Some(timer) => Some(timer.name.as_str()),
            None => self
                .definitions
                .workouts
                .get(index - timers.len())
                .map(|w| w.name.as_str()),
        }
    }

    /// Seconds left in the current phase
    pub fn remaining_s(&self) -> u16 {
        self.remaining_s
    }

    /// Running time of the current run (ms)
    pub fn running_ms(&self) -> u32 {
        self.run.as_ref().map(|r| r.running_ms()).unwrap_or(0)
    }

    /// Gauge link status
    pub fn link_status(&self) -> LinkStatus {
        self.gauge.status()
    }

    /// Metrics of the finished workout
    pub fn result(&self) -> Option<&WorkoutResult> {
        match &self.run {
            Some(ActiveRun::Workout(session)) => session.result(),
            _ => None,
        }
    }

    /// Check if a finished workout should be handed to the sink
    pub fn save_pending(&self) -> bool {
        self.save_pending
    }

    /// Check if the gauge may be re-zeroed (not during a run)
    pub fn can_tare(&self) -> bool {
        !self.state().is_active()
    }

    /// Take the next queued output
    pub fn next_output(&mut self) -> Option<Output> {
        self.outputs.pop_front()
    }

    /// Process a button event
    pub fn process_input(
        &mut self,
        input: InputEvent,
        cell: &WeightCell,
    ) -> Result<Option<Event>, ControllerError> {
        match input {
            InputEvent::Next => {
                self.select_next();
                Ok(None)
            }
            InputEvent::Select => self.handle_select(cell),
            InputEvent::Back => Ok(self.handle_back()),
            InputEvent::Tare => Ok(None),
        }
    }

    fn select_next(&mut self) {
        let count = self.definitions.program_count();
        if self.state() == State::Idle && count > 0 {
            self.selected_program = ((self.selected_program as usize + 1) % count) as u8;
        }
    }

    fn handle_select(&mut self, cell: &WeightCell) -> Result<Option<Event>, ControllerError> {
        match self.state() {
            State::Idle => self.start_program(cell).map(Some),
            State::PreRoll | State::Running => {
                if let Some(run) = self.run.as_mut() {
                    run.pause()?;
                }
                Ok(Some(Event::Pause))
            }
            State::Paused { .. } => {
                if let Some(run) = self.run.as_mut() {
                    run.resume()?;
                }
                Ok(Some(Event::Resume))
            }
            State::Complete if self.receipt.is_none() && self.result().is_some() => {
                // Retry a save that ran out of attempts
                self.save_pending = true;
                self.save_attempts = 0;
                Ok(None)
            }
            State::Complete | State::Aborted => {
                self.reset();
                Ok(Some(Event::Reset))
            }
        }
    }

    fn handle_back(&mut self) -> Option<Event> {
        let run = self.run.as_mut()?;
        if run.state().is_active() {
            run.abort();
            self.save_pending = false;
            Some(Event::Abort)
        } else {
            self.reset();
            Some(Event::Reset)
        }
    }

    /// Build a session for the selected program and start it
    fn start_program(&mut self, cell: &WeightCell) -> Result<Event, ControllerError> {
        let index = self.selected_program as usize;
        let definitions = self.definitions;

        let mut run = if let Some(timer) = definitions.timers.get(index) {
            ActiveRun::Timer(TimerSession::for_timer(timer.clone(), &definitions.run)?)
        } else {
            let workout = definitions
                .workouts
                .get(index - definitions.timers.len())
                .ok_or(ControllerError::NoPrograms)?;
            if !self.gauge.can_start(workout.records_force()) {
                return Err(ControllerError::GaugeDisconnected);
            }
            ActiveRun::Workout(WorkoutSession::for_workout(
                workout.clone(),
                &definitions.run,
            )?)
        };

        self.receipt = None;
        self.save_pending = false;
        self.save_attempts = 0;
        self.remaining_s = 0;

        let outputs = &mut self.outputs;
        let remaining = &mut self.remaining_s;
        match &mut run {
            ActiveRun::Timer(s) => s.start(|e| {
                record(outputs, remaining, e);
            })?,
            ActiveRun::Workout(s) => s.start(|e| {
                record(outputs, remaining, e);
            })?,
        }
        self.run = Some(run);
        self.gauge.observe(cell, 0);
        Ok(Event::Start)
    }

    /// Periodic tick update
    ///
    /// Call this regularly (e.g., every 100ms) with the current timestamp.
    /// Returns `Finish` when the run completes during this tick.
    pub fn tick(
        &mut self,
        now_ms: u32,
        cell: &WeightCell,
    ) -> Result<Option<Event>, ControllerError> {
        let delta_ms = now_ms.wrapping_sub(self.last_tick_ms);
        self.last_tick_ms = now_ms;

        if let Some(status) = self.gauge.observe(cell, delta_ms) {
            push(&mut self.outputs, Output::Link(status));
        }

        let outputs = &mut self.outputs;
        let remaining = &mut self.remaining_s;
        let mut completed = false;
        match self.run.as_mut() {
            Some(ActiveRun::Timer(s)) if s.is_live() => {
                s.advance(delta_ms, cell, |e| completed |= record(outputs, remaining, e))?
            }
            Some(ActiveRun::Workout(s)) if s.is_live() => {
                s.advance(delta_ms, cell, |e| completed |= record(outputs, remaining, e))?;
                if completed && s.result().is_some() {
                    self.save_pending = true;
                }
            }
            _ => {}
        }

        Ok(completed.then_some(Event::Finish))
    }

    /// Hand the finished workout to `sink`
    ///
    /// The result stays with the controller on failure; saving is retried
    /// on the next call until [`MAX_SAVE_ATTEMPTS`] is reached.
    pub async fn save_result<S: WorkoutRecordSink>(
        &mut self,
        sink: &mut S,
    ) -> Result<Option<&WorkoutReceipt>, StoreError> {
        if !self.save_pending {
            return Ok(None);
        }
        let Some(ActiveRun::Workout(session)) = &self.run else {
            self.save_pending = false;
            return Ok(None);
        };
        let Some(result) = session.result() else {
            self.save_pending = false;
            return Ok(None);
        };

        let name = session.sequencer().workout().map(|w| w.name.as_str()).unwrap_or("");
        let body_weight = self.definitions.run.body_weight;
        match sink
            .create_workout_record(name, session.samples(), result, body_weight)
            .await
        {
            Ok(receipt) => {
                self.save_pending = false;
                self.receipt = Some(receipt);
                Ok(self.receipt.as_ref())
            }
            Err(e) => {
                self.save_attempts += 1;
                if self.save_attempts >= MAX_SAVE_ATTEMPTS {
                    self.save_pending = false;
                }
                Err(e)
            }
        }
    }

    fn reset(&mut self) {
        self.run = None;
        self.save_pending = false;
        self.remaining_s = 0;
    }
}

/// Queue an output, dropping the oldest when full
fn push(outputs: &mut Deque<Output, OUTPUT_QUEUE_SIZE>, output: Output) {
    if outputs.is_full() {
        outputs.pop_front();
    }
    let _ = outputs.push_back(output);
}

/// Translate a run event into outputs; returns true on completion
fn record<P: RuntimePhase>(
    outputs: &mut Deque<Output, OUTPUT_QUEUE_SIZE>,
    remaining_s: &mut u16,
    event: RunEvent<P>,
) -> bool {
    match event {
        RunEvent::PreRoll(count) => push(outputs, Output::PreRoll(count)),
        RunEvent::PhaseStarted(phase) => {
            *remaining_s = phase.remaining_s();
            push(
                outputs,
                Output::PhaseStarted {
                    instance: phase.instance(),
                    duration_s: phase.duration_s(),
                    recording: phase.recording_key().is_some(),
                },
            );
        }
        RunEvent::Tick { remaining_s: r, .. } => *remaining_s = r,
        RunEvent::Cue(cue) => push(outputs, Output::Cue(cue.cue)),
        RunEvent::Sample(_) => {}
        RunEvent::Completed(summary) => {
            push(outputs, Output::Completed(summary));
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use embassy_futures::block_on;
    use std::boxed::Box;
    use std::vec::Vec;
    use tensio_core::config::RunConfig;
    use tensio_core::program::{Exercise, Step, Timer, WorkoutType};
    use tensio_core::store::MemoryStore;
    use tensio_core::traits::StoreError;

    fn make_timer(name: &str) -> Timer {
        let step = Step::new("main", 0, 1)
            .unwrap()
            .with_exercise(Exercise::new("hang", 5, 0, 1).unwrap())
            .unwrap();
        Timer::new(name).unwrap().with_step(step).unwrap()
    }

    fn make_workout(name: &str) -> WorkoutType {
        let mut workout = WorkoutType::new(name).unwrap();
        workout.max_iso_force = true;
        workout.push_intervals(2, 2, 1, true).unwrap();
        workout
    }

    fn definitions(workouts: bool) -> &'static TrainingConfig {
        let mut config = TrainingConfig::new();
        config.run = RunConfig {
            pre_roll: 0,
            ..RunConfig::default()
        };
        let _ = config.timers.push(make_timer("repeaters"));
        if workouts {
            let _ = config.workouts.push(make_workout("max_iso"));
        }
        Box::leak(Box::new(config))
    }

    fn connected(weight: f32) -> WeightCell {
        let cell = WeightCell::new();
        cell.set_connected(true);
        cell.publish(weight);
        cell
    }

    fn drain(ctrl: &mut Controller) -> Vec<Output> {
        core::iter::from_fn(|| ctrl.next_output()).collect()
    }

    /// Tick in 100 ms steps until the run leaves the active states
    fn run_out(ctrl: &mut Controller, cell: &WeightCell, mut now_ms: u32) -> u32 {
        while ctrl.state().is_active() {
            now_ms += 100;
            if cell.is_connected() {
                cell.publish(20.0);
            }
            ctrl.tick(now_ms, cell).unwrap();
            assert!(now_ms < 600_000, "run never finished");
        }
        now_ms
    }

    #[test]
    fn test_program_navigation() {
        let mut ctrl = Controller::new(definitions(true));
        let cell = WeightCell::new();
        assert_eq!(ctrl.selected_name(), Some("repeaters"));

        ctrl.process_input(InputEvent::Next, &cell).unwrap();
        assert_eq!(ctrl.selected_program(), 1);
        assert_eq!(ctrl.selected_name(), Some("max_iso"));

        // Wraps around
        ctrl.process_input(InputEvent::Next, &cell).unwrap();
        assert_eq!(ctrl.selected_program(), 0);
    }

    #[test]
    fn test_timer_runs_to_completion() {
        let mut ctrl = Controller::new(definitions(false));
        let cell = WeightCell::new();

        let event = ctrl.process_input(InputEvent::Select, &cell).unwrap();
        assert_eq!(event, Some(Event::Start));
        assert_eq!(ctrl.state(), State::Running);
        assert_eq!(ctrl.remaining_s(), 5);

        run_out(&mut ctrl, &cell, 0);
        assert_eq!(ctrl.state(), State::Complete);
        assert!(!ctrl.save_pending());

        let outputs = drain(&mut ctrl);
        assert!(outputs.contains(&Output::Cue(Cue::Start)));
        assert!(outputs.contains(&Output::Cue(Cue::Victory)));
        assert!(outputs.contains(&Output::Completed(RunSummary {
            phases: 1,
            elapsed_s: 5,
        })));

        ctrl.process_input(InputEvent::Select, &cell).unwrap();
        assert_eq!(ctrl.state(), State::Idle);
    }

    #[test]
    fn test_pause_resume() {
        let mut ctrl = Controller::new(definitions(false));
        let cell = WeightCell::new();
        ctrl.process_input(InputEvent::Select, &cell).unwrap();
        ctrl.tick(1000, &cell).unwrap();
        assert_eq!(ctrl.remaining_s(), 4);

        assert_eq!(
            ctrl.process_input(InputEvent::Select, &cell).unwrap(),
            Some(Event::Pause)
        );
        ctrl.tick(9000, &cell).unwrap();
        assert_eq!(ctrl.remaining_s(), 4);
        assert_eq!(ctrl.state(), State::Paused { pre_roll: false });

        assert_eq!(
            ctrl.process_input(InputEvent::Select, &cell).unwrap(),
            Some(Event::Resume)
        );
        ctrl.tick(10_000, &cell).unwrap();
        assert_eq!(ctrl.remaining_s(), 3);
        assert_eq!(ctrl.running_ms(), 2000);
    }

    #[test]
    fn test_long_press_abort() {
        let mut ctrl = Controller::new(definitions(false));
        let cell = WeightCell::new();
        ctrl.process_input(InputEvent::Select, &cell).unwrap();
        assert!(!ctrl.can_tare());

        let event = ctrl.process_input(InputEvent::Back, &cell).unwrap();
        assert_eq!(event, Some(Event::Abort));
        assert_eq!(ctrl.state(), State::Aborted);

        // Nothing happens after the abort
        drain(&mut ctrl);
        ctrl.tick(10_000, &cell).unwrap();
        assert!(drain(&mut ctrl).iter().all(|o| matches!(o, Output::Link(_))));

        ctrl.process_input(InputEvent::Back, &cell).unwrap();
        assert_eq!(ctrl.state(), State::Idle);
        assert!(ctrl.can_tare());
    }

    #[test]
    fn test_workout_needs_gauge() {
        let mut ctrl = Controller::new(definitions(true));
        let cell = WeightCell::new();
        ctrl.process_input(InputEvent::Next, &cell).unwrap();

        let refused = ctrl.process_input(InputEvent::Select, &cell);
        assert_eq!(refused, Err(ControllerError::GaugeDisconnected));
        assert_eq!(ctrl.state(), State::Idle);

        let cell = connected(20.0);
        ctrl.tick(100, &cell).unwrap();
        assert_eq!(ctrl.link_status(), LinkStatus::Connected);
        assert_eq!(
            ctrl.process_input(InputEvent::Select, &cell).unwrap(),
            Some(Event::Start)
        );
    }

    #[test]
    fn test_finished_workout_is_saved() {
        let mut ctrl = Controller::new(definitions(true));
        let cell = connected(20.0);
        ctrl.tick(100, &cell).unwrap();
        ctrl.process_input(InputEvent::Next, &cell).unwrap();
        ctrl.process_input(InputEvent::Select, &cell).unwrap();

        run_out(&mut ctrl, &cell, 100);
        assert_eq!(ctrl.state(), State::Complete);
        assert!(ctrl.save_pending());
        assert_eq!(ctrl.result().unwrap().max_iso_force, Some(20.0));

        let mut store = MemoryStore::new();
        let receipt = block_on(ctrl.save_result(&mut store)).unwrap().unwrap();
        assert_eq!(receipt.metrics.max_iso_force, Some(20.0));
        assert!(!ctrl.save_pending());
        assert_eq!(store.records().len(), 1);

        // Nothing left to save
        assert_eq!(block_on(ctrl.save_result(&mut store)), Ok(None));
    }

    struct FailingSink;

    impl WorkoutRecordSink for FailingSink {
        async fn create_workout_record(
            &mut self,
            _name: &str,
            _samples: &tensio_core::sampler::SampleBuffer,
            _result: &WorkoutResult,
            _body_weight: f32,
        ) -> Result<WorkoutReceipt, StoreError> {
            Err(StoreError::Storage)
        }
    }

    #[test]
    fn test_failed_save_keeps_result() {
        let mut ctrl = Controller::new(definitions(true));
        let cell = connected(20.0);
        ctrl.tick(100, &cell).unwrap();
        ctrl.process_input(InputEvent::Next, &cell).unwrap();
        ctrl.process_input(InputEvent::Select, &cell).unwrap();
        run_out(&mut ctrl, &cell, 100);

        for _ in 0..MAX_SAVE_ATTEMPTS {
            let saved = block_on(ctrl.save_result(&mut FailingSink));
            assert_eq!(saved.err(), Some(StoreError::Storage));
        }
        assert!(!ctrl.save_pending());
        assert!(ctrl.result().is_some());

        // Select asks for another attempt instead of leaving the result
        ctrl.process_input(InputEvent::Select, &cell).unwrap();
        assert!(ctrl.save_pending());
        assert_eq!(ctrl.state(), State::Complete);

        let mut store = MemoryStore::new();
        assert!(block_on(ctrl.save_result(&mut store)).unwrap().is_some());
        ctrl.process_input(InputEvent::Select, &cell).unwrap();
        assert_eq!(ctrl.state(), State::Idle);
    }
}
