//! Buzzer task
//!
//! Plays cues from the controller on the piezo. Cues are short, so a new
//! cue simply replaces whatever is playing.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::{Instant, Timer};

use tensio_drivers::buzzer::CuePlayer;
use tensio_hal_rp2040::buzzer::PwmBuzzer;

use crate::channels::CUE_CHANNEL;

/// Pattern update interval while a cue plays (ms)
const NOTE_STEP_MS: u64 = 10;

/// Buzzer task
#[embassy_executor::task]
pub async fn buzzer_task(mut buzzer: PwmBuzzer<'static>) {
    info!("Buzzer task started");

    let mut player = CuePlayer::new();
    let mut last = Instant::now();

    loop {
        let cue = if player.is_playing() {
            match select(CUE_CHANNEL.receive(), Timer::after_millis(NOTE_STEP_MS)).await {
                Either::First(cue) => Some(cue),
                Either::Second(()) => None,
            }
        } else {
            Some(CUE_CHANNEL.receive().await)
        };

        let now = Instant::now();
        let elapsed_ms = (now - last).as_millis() as u32;
        last = now;

        let freq = match cue {
            Some(cue) => {
                trace!("Cue {:?}", cue);
                player.play(cue);
                player.update(0)
            }
            None => player.update(elapsed_ms),
        };
        buzzer.set_frequency(freq);
    }
}
