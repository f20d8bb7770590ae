//! Front-panel button task
//!
//! Each button reports a short press and a long press. One task instance
//! runs per button.

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::{with_timeout, Duration, Instant, Timer};

use crate::channels::INPUT_CHANNEL;
use crate::input::InputEvent;

/// Presses held at least this long are long presses (ms)
const LONG_PRESS_MS: u64 = 500;

/// Contact bounce settle time (ms)
const DEBOUNCE_MS: u64 = 20;

/// Shortest press accepted as a click (ms)
const MIN_CLICK_MS: u64 = 50;

/// Button task for one active-low button
#[embassy_executor::task(pool_size = 2)]
pub async fn button_task(mut button: Input<'static>, click: InputEvent, long: InputEvent) {
    info!("Button task started ({:?}/{:?})", click, long);

    loop {
        button.wait_for_falling_edge().await;
        let press_start = Instant::now();

        Timer::after(Duration::from_millis(DEBOUNCE_MS)).await;
        if button.is_high() {
            continue;
        }

        let released = with_timeout(
            Duration::from_millis(LONG_PRESS_MS),
            button.wait_for_rising_edge(),
        )
        .await;

        match released {
            Ok(()) if press_start.elapsed().as_millis() > MIN_CLICK_MS => send(click),
            Ok(()) => {}
            Err(_) => {
                // Report while still held, then wait for the release
                send(long);
                button.wait_for_rising_edge().await;
            }
        }

        Timer::after(Duration::from_millis(DEBOUNCE_MS)).await;
    }
}

fn send(event: InputEvent) {
    debug!("Button: {:?}", event);
    if INPUT_CHANNEL.try_send(event).is_err() {
        warn!("Input queue full, dropped {:?}", event);
    }
}
