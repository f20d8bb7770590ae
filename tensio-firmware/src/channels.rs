//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy tasks.
//! Uses embassy-sync primitives for safe async communication.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use tensio_core::cue::Cue;
use tensio_core::sampler::WeightCell;

use crate::input::InputEvent;

/// Channel capacity for button events
const INPUT_CHANNEL_SIZE: usize = 8;

/// Channel capacity for cues waiting to be played
const CUE_CHANNEL_SIZE: usize = 8;

/// Button events (short and long presses)
pub static INPUT_CHANNEL: Channel<CriticalSectionRawMutex, InputEvent, INPUT_CHANNEL_SIZE> =
    Channel::new();

/// Cues for the buzzer task
pub static CUE_CHANNEL: Channel<CriticalSectionRawMutex, Cue, CUE_CHANNEL_SIZE> = Channel::new();

/// Request to re-zero the load cell (raised by the controller)
pub static TARE_REQUEST: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Latest weight, written by the force task and read by the controller
pub static WEIGHT: WeightCell = WeightCell::new();
