//! Cue de-duplication and timing rules

use super::{Cue, CueEvent};

/// Default countdown warning threshold (seconds)
pub const DEFAULT_WARNING_S: u16 = 3;

/// Decides which cues fire
///
/// Remembers which cues already fired for the newest phase instance.
/// Requests for older instances are dropped.
#[derive(Debug, Clone)]
pub struct CueScheduler {
    warning_s: u16,
    instance: u32,
    fired: u8,
    intro_fired: bool,
    victory_fired: bool,
}

impl Default for CueScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_WARNING_S)
    }
}

impl CueScheduler {
    /// Create a scheduler, `warning_s = 0` disables the countdown cue
    pub const fn new(warning_s: u16) -> Self {
        Self {
            warning_s,
            instance: 0,
            fired: 0,
            intro_fired: false,
            victory_fired: false,
        }
    }

    /// Pre-roll count shown; the first one plays the intro
    pub fn on_pre_roll(&mut self) -> Option<CueEvent> {
        if self.intro_fired {
            return None;
        }
        self.intro_fired = true;
        Some(CueEvent {
            cue: Cue::Intro,
            instance: 0,
        })
    }

    /// Phase `instance` started
    ///
    /// `after_pre_roll` suppresses the start cue for the phase the pre-roll
    /// led into.
    pub fn on_phase_start(&mut self, instance: u32, after_pre_roll: bool) -> Option<CueEvent> {
        if after_pre_roll {
            self.select(instance);
            return None;
        }
        self.fire(Cue::Start, instance)
    }

    /// Remaining time of phase `instance` changed
    pub fn on_remaining(&mut self, instance: u32, remaining_s: u16) -> Option<CueEvent> {
        if remaining_s == 0 {
            return self.fire(Cue::End, instance);
        }
        // Tick leaving `warning_s` behind
        if self.warning_s > 0 && remaining_s.checked_add(1) == Some(self.warning_s) {
            return self.fire(Cue::Countdown, instance);
        }
        None
    }

    /// Run completed
    pub fn on_complete(&mut self, instance: u32) -> Option<CueEvent> {
        if self.victory_fired {
            return None;
        }
        self.victory_fired = true;
        Some(CueEvent {
            cue: Cue::Victory,
            instance,
        })
    }

    /// Emit `cue` for `instance` unless it already fired
    pub fn fire(&mut self, cue: Cue, instance: u32) -> Option<CueEvent> {
        if !self.select(instance) {
            return None;
        }
        if self.fired & cue.bit() != 0 {
            return None;
        }
        self.fired |= cue.bit();
        Some(CueEvent { cue, instance })
    }

    /// Forget everything
    pub fn reset(&mut self) {
        *self = Self::new(self.warning_s);
    }

    /// Move to `instance`, returns false for stale instances
    fn select(&mut self, instance: u32) -> bool {
        if instance < self.instance {
            return false;
        }
        if instance > self.instance {
            self.instance = instance;
            self.fired = 0;
        }
        true
    }
}
