//! Button input events

/// Input events from the two front-panel buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputEvent {
    /// Select button, short press (<500 ms)
    Select,
    /// Select button, long press (>=500 ms)
    Back,
    /// Next button, short press
    Next,
    /// Next button, long press
    Tare,
}
