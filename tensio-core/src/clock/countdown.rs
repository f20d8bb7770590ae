//! Pre-roll and per-phase countdown

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Clock timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClockConfig {
    /// Number of pre-roll counts (0 disables the pre-roll)
    pub pre_roll_count: u8,
    /// Time between pre-roll counts (ms)
    pub pre_roll_interval_ms: u32,
    /// Time between phase ticks (ms)
    pub phase_interval_ms: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            pre_roll_count: 3,
            pre_roll_interval_ms: 750,
            phase_interval_ms: 1000,
        }
    }
}

/// Events emitted by the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockEvent {
    /// Pre-roll count now showing (counts down to 1)
    PreRoll(u8),
    /// Pre-roll done, phase countdown starts
    PreRollFinished,
    /// One phase interval elapsed
    PhaseTick,
}

/// Clock mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Not started
    Idle,
    /// Counting down the pre-roll
    PreRoll,
    /// Emitting phase ticks
    Running,
    /// Torn down, never emits again
    Stopped,
}

/// Countdown clock for one run
///
/// Time is fed with [`CountdownClock::elapse`] and drained with
/// [`CountdownClock::next_event`]. Pausing keeps the partial interval, so a
/// pause never shortens or lengthens the running time.
#[derive(Debug, Clone)]
pub struct CountdownClock {
    config: ClockConfig,
    mode: Mode,
    paused: bool,
    /// Time accumulated towards the next event (ms)
    accum_ms: u32,
    /// Pre-roll count currently shown
    pre_roll_left: u8,
    /// First pre-roll count not yet reported
    pre_roll_pending: bool,
}

impl CountdownClock {
    /// Create an idle clock
    pub const fn new(config: ClockConfig) -> Self {
        Self {
            config,
            mode: Mode::Idle,
            paused: false,
            accum_ms: 0,
            pre_roll_left: 0,
            pre_roll_pending: false,
        }
    }

    /// Start the clock
    ///
    /// Returns false if already started; the pre-roll runs once per clock.
    pub fn start(&mut self) -> bool {
        if self.mode != Mode::Idle {
            return false;
        }
        self.accum_ms = 0;
        if self.config.pre_roll_count > 0 {
            self.mode = Mode::PreRoll;
            self.pre_roll_left = self.config.pre_roll_count;
            self.pre_roll_pending = true;
        } else {
            self.mode = Mode::Running;
        }
        true
    }

    /// Freeze tick emission, keeping the partial interval
    pub fn pause(&mut self) {
        if self.is_active() {
            self.paused = true;
        }
    }

    /// Continue after a pause
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Tear down; no events are emitted afterwards
    pub fn stop(&mut self) {
        self.mode = Mode::Stopped;
        self.paused = false;
        self.accum_ms = 0;
        self.pre_roll_left = 0;
        self.pre_roll_pending = false;
    }

    /// Feed elapsed time (ignored while paused or not running)
    pub fn elapse(&mut self, delta_ms: u32) {
        if self.is_active() && !self.paused {
            self.accum_ms = self.accum_ms.saturating_add(delta_ms);
        }
    }

    /// Take the next due event, if any
    pub fn next_event(&mut self) -> Option<ClockEvent> {
        if self.paused {
            return None;
        }
        match self.mode {
            Mode::PreRoll => {
                if self.pre_roll_pending {
                    self.pre_roll_pending = false;
                    return Some(ClockEvent::PreRoll(self.pre_roll_left));
                }
                if self.accum_ms < self.config.pre_roll_interval_ms {
                    return None;
                }
                self.accum_ms -= self.config.pre_roll_interval_ms;
                self.pre_roll_left -= 1;
                if self.pre_roll_left == 0 {
                    self.mode = Mode::Running;
                    Some(ClockEvent::PreRollFinished)
                } else {
                    Some(ClockEvent::PreRoll(self.pre_roll_left))
                }
            }
            Mode::Running => {
                if self.accum_ms < self.config.phase_interval_ms {
                    return None;
                }
                self.accum_ms -= self.config.phase_interval_ms;
                Some(ClockEvent::PhaseTick)
            }
            Mode::Idle | Mode::Stopped => None,
        }
    }

    /// Time until the next event (ms), `None` while paused or inactive
    pub fn until_next_ms(&self) -> Option<u32> {
        if self.paused {
            return None;
        }
        match self.mode {
            Mode::PreRoll if self.pre_roll_pending => Some(0),
            Mode::PreRoll => Some(self.config.pre_roll_interval_ms.saturating_sub(self.accum_ms)),
            Mode::Running => Some(self.config.phase_interval_ms.saturating_sub(self.accum_ms)),
            Mode::Idle | Mode::Stopped => None,
        }
    }

    /// Check if the pre-roll is in progress
    pub fn is_pre_rolling(&self) -> bool {
        self.mode == Mode::PreRoll
    }

    /// Check if phase ticks are being emitted (running and not paused)
    pub fn is_ticking(&self) -> bool {
        self.mode == Mode::Running && !self.paused
    }

    /// Check if paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pre-roll count currently shown (0 outside the pre-roll)
    pub fn pre_roll_count(&self) -> u8 {
        if self.mode == Mode::PreRoll {
            self.pre_roll_left
        } else {
            0
        }
    }

    fn is_active(&self) -> bool {
        matches!(self.mode, Mode::PreRoll | Mode::Running)
    }
}
