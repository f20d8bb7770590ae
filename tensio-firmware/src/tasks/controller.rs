//! Main controller task
//!
//! Receives button events and ticks, drives the controller, forwards cues
//! to the buzzer and hands finished workouts to flash.

use defmt::*;
use embassy_futures::select::{select, Either};

use tensio_core::config::TrainingConfig;
use tensio_core::program::format_duration;
use tensio_core::state::Event;
use tensio_hal_rp2040::flash::Rp2040FlashStorage;

use crate::channels::{CUE_CHANNEL, INPUT_CHANNEL, TARE_REQUEST, WEIGHT};
use crate::controller::{Controller, ControllerError, Output};
use crate::input::InputEvent;
use crate::store::FlashRecordStore;
use crate::tasks::tick::TICK_SIGNAL;

/// Controller task - main coordination loop
#[embassy_executor::task]
pub async fn controller_task(
    definitions: &'static TrainingConfig,
    mut records: FlashRecordStore<Rp2040FlashStorage<'static>>,
) {
    info!("Controller task started");

    let mut controller = Controller::new(definitions);
    if let Some(name) = controller.selected_name() {
        info!("Selected #{}: {}", controller.selected_program(), name);
    }

    loop {
        match select(INPUT_CHANNEL.receive(), TICK_SIGNAL.wait()).await {
            Either::First(input) => {
                debug!("Input: {:?}", input);
                if input == InputEvent::Tare {
                    if controller.can_tare() {
                        TARE_REQUEST.signal(());
                    } else {
                        warn!("Tare ignored during a run");
                    }
                }

                match controller.process_input(input, &WEIGHT) {
                    Ok(Some(Event::Pause)) => {
                        info!("Paused, {} s left", controller.remaining_s())
                    }
                    Ok(Some(event)) => debug!("Event: {:?}", event),
                    Ok(None) => {}
                    Err(ControllerError::GaugeDisconnected) => {
                        warn!("Gauge {:?}, cannot start workout", controller.link_status())
                    }
                    Err(e) => warn!("Input refused: {:?}", e),
                }
                if input == InputEvent::Next {
                    if let Some(name) = controller.selected_name() {
                        info!("Selected #{}: {}", controller.selected_program(), name);
                    }
                }
            }

            Either::Second(now_ms) => match controller.tick(now_ms, &WEIGHT) {
                Ok(Some(event)) => debug!("Tick event: {:?}", event),
                Ok(None) => {}
                Err(e) => error!("Run failed: {:?}", e),
            },
        }

        deliver_outputs(&mut controller);

        if controller.save_pending() {
            match controller.save_result(&mut records).await {
                Ok(Some(receipt)) => info!("Workout saved as record {}", receipt.id),
                Ok(None) => {}
                Err(e) => warn!("Saving workout failed: {:?}", e),
            }
        }
    }
}

/// Send cues to the buzzer and log run progress
fn deliver_outputs(controller: &mut Controller) {
    while let Some(output) = controller.next_output() {
        match output {
            Output::Cue(cue) => {
                if CUE_CHANNEL.try_send(cue).is_err() {
                    warn!("Cue queue full, dropped {:?}", cue);
                }
            }
            Output::PreRoll(count) => info!("Starting in {}", count),
            Output::PhaseStarted {
                instance,
                duration_s,
                recording,
            } => info!(
                "Phase {}: {} s{}",
                instance,
                duration_s,
                if recording { ", recording" } else { "" }
            ),
            Output::Completed(summary) => {
                info!(
                    "Run complete: {} phases in {} ({} ms running)",
                    summary.phases,
                    format_duration(summary.elapsed_s).as_str(),
                    controller.running_ms()
                );
                if let Some(result) = controller.result() {
                    info!("Max weight {} kg", result.max_weight);
                    if let Some(force) = result.max_iso_force {
                        info!("Max isometric force {} kg", force);
                    }
                    if let Some(force) = result.critical_force {
                        info!("Critical force {} kg", force);
                    }
                }
            }
            Output::Link(status) => info!("Gauge link: {:?}", status),
        }
    }
}
