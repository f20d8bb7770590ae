//! Run clock tick
//!
//! Drives the controller at a fixed rate. Each tick carries the time since
//! boot so the controller can feed exact deltas to the run session, which
//! keeps the countdown and the 10 Hz sampler aligned even if a tick is
//! handled late.

use defmt::*;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Ticker};

/// Tick interval in milliseconds
pub const TICK_INTERVAL_MS: u32 = 100;

/// Milliseconds since the tick task started
pub static TICK_SIGNAL: Signal<CriticalSectionRawMutex, u32> = Signal::new();

/// Tick task - signals the controller every [`TICK_INTERVAL_MS`]
#[embassy_executor::task]
pub async fn tick_task() {
    info!("Tick task started");

    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS as u64));
    let start = Instant::now();

    loop {
        ticker.next().await;
        TICK_SIGNAL.signal(start.elapsed().as_millis() as u32);
    }
}
