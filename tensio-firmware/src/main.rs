//! Tensio - Grip Trainer Firmware
//!
//! Main firmware binary for an RP2040 hang-board trainer: interval timers,
//! force-measuring workouts on an HX711 load cell, buzzer cues and
//! workout records kept in flash.

#![no_std]
#![no_main]

extern crate alloc;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::pwm::Pwm;
use embassy_time::Delay;
use embedded_alloc::LlffHeap as Heap;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use tensio_core::config::TrainingConfig;
use tensio_drivers::sensor::hx711::{Gain, Hx711};
use tensio_drivers::sensor::load_cell::LoadCell;
use tensio_hal_rp2040::buzzer::PwmBuzzer;
use tensio_hal_rp2040::flash::Rp2040FlashStorage;

use crate::config::DefinitionsLoader;
use crate::input::InputEvent;
use crate::store::FlashRecordStore;

// Heap allocator for postcard and TOML parsing
#[global_allocator]
static HEAP: Heap = Heap::empty();

// Heap size: 16KB
const HEAP_SIZE: usize = 16 * 1024;

/// Embedded default training definitions (compiled into firmware)
/// Edit training.toml and rebuild to customize
const EMBEDDED_DEFINITIONS: &str = include_str!("../training.toml");

mod channels;
mod config;
mod controller;
mod input;
mod store;
mod tasks;

// Definitions must live forever for the controller task
static DEFINITIONS: StaticCell<TrainingConfig> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Tensio firmware starting...");

    init_heap();

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Definitions and records share the flash partition
    let storage = Rp2040FlashStorage::new(p.FLASH, p.DMA_CH0);
    let mut loader = DefinitionsLoader::new(storage);
    let definitions: &'static TrainingConfig =
        DEFINITIONS.init(loader.load_or(EMBEDDED_DEFINITIONS).await);

    let mut records = FlashRecordStore::open(loader.into_storage()).await;
    let last = records.next_id().saturating_sub(1);
    if last > 0 {
        match records.load(last).await {
            Ok(record) => info!(
                "Last record #{}: {} ({} samples)",
                record.id,
                record.name.as_str(),
                record.sample_count
            ),
            Err(e) => warn!("Last record #{} unreadable: {:?}", last, e),
        }
    }

    // HX711 load cell (SCK=GPIO2, DOUT=GPIO3)
    let sck = Output::new(p.PIN_2, Level::Low);
    let dout = Input::new(p.PIN_3, Pull::None);
    let hx711 = Hx711::new(sck, dout, Delay, Gain::A128);
    let load_cell = LoadCell::new(hx711, &definitions.gauge);
    info!("Load cell initialized");

    // Piezo buzzer on PWM slice 7, channel A (GPIO14)
    let buzzer = PwmBuzzer::new(Pwm::new_output_a(
        p.PWM_SLICE7,
        p.PIN_14,
        Default::default(),
    ));
    info!("Buzzer initialized");

    // Front-panel buttons, active low
    let select_button = Input::new(p.PIN_20, Pull::Up);
    let next_button = Input::new(p.PIN_21, Pull::Up);

    // Spawn tasks
    spawner.spawn(tasks::tick_task()).unwrap();
    spawner.spawn(tasks::force_task(load_cell)).unwrap();
    spawner.spawn(tasks::buzzer_task(buzzer)).unwrap();
    spawner
        .spawn(tasks::button_task(
            select_button,
            InputEvent::Select,
            InputEvent::Back,
        ))
        .unwrap();
    spawner
        .spawn(tasks::button_task(
            next_button,
            InputEvent::Next,
            InputEvent::Tare,
        ))
        .unwrap();
    spawner
        .spawn(tasks::controller_task(definitions, records))
        .unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Initialize the heap allocator
fn init_heap() {
    use core::mem::MaybeUninit;
    static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
    #[allow(static_mut_refs)]
    unsafe {
        HEAP.init(HEAP_MEM.as_ptr() as usize, HEAP_SIZE)
    }
}
