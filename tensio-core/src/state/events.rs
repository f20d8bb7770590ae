//! Events that trigger state transitions

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    // Execution control events
    /// User pressed start
    Start,
    /// User pressed pause
    Pause,
    /// User pressed resume
    Resume,
    /// User pressed abort (long press)
    Abort,
    /// User dismissed a finished run
    Reset,

    // Clock/sequencer events
    /// Pre-roll count reached zero
    PreRollFinished,
    /// Last phase ran out
    Finish,
}

impl Event {
    /// Check if this event is user-initiated
    pub fn is_user_event(&self) -> bool {
        matches!(
            self,
            Event::Start | Event::Pause | Event::Resume | Event::Abort | Event::Reset
        )
    }

    /// Check if this event comes from the run clock
    pub fn is_clock_event(&self) -> bool {
        matches!(self, Event::PreRollFinished | Event::Finish)
    }
}
