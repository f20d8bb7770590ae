//! Force gauge task
//!
//! Reads the HX711 as fast as it converts and publishes every reading to
//! the shared weight cell. The run session samples that cell at its own
//! rate. A missing conversion or a railed bridge marks the gauge as
//! disconnected until good readings return.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::gpio::{Input, Output};
use embassy_time::{with_timeout, Delay, Duration};

use tensio_drivers::sensor::{Hx711, LoadCell};

use crate::channels::{TARE_REQUEST, WEIGHT};

/// HX711 on the board's gauge header
pub type GaugeAdc = Hx711<Output<'static>, Input<'static>, Delay>;

/// Longest wait for a conversion before the gauge counts as gone (ms)
///
/// The HX711 converts at 10 or 80 SPS.
const CONVERSION_TIMEOUT_MS: u64 = 500;

/// Conversions averaged when taring
const TARE_SAMPLES: usize = tensio_drivers::sensor::load_cell::TARE_SAMPLES as usize;

/// Force gauge task
#[embassy_executor::task]
pub async fn force_task(mut load_cell: LoadCell<GaugeAdc>) {
    info!(
        "Force task started, tare at {} counts",
        load_cell.tare_counts()
    );

    loop {
        let conversion = with_timeout(
            Duration::from_millis(CONVERSION_TIMEOUT_MS),
            load_cell.adc_mut().read_when_ready(),
        );

        match select(conversion, TARE_REQUEST.wait()).await {
            Either::First(Ok(Ok(raw))) => match load_cell.convert(raw) {
                Ok(kg) => {
                    if !WEIGHT.is_connected() {
                        info!("Gauge connected");
                        WEIGHT.set_connected(true);
                    }
                    WEIGHT.publish(kg);
                }
                Err(e) => disconnect(e),
            },
            Either::First(Ok(Err(()))) => warn!("HX711 read failed"),
            Either::First(Err(_)) => {
                if WEIGHT.is_connected() {
                    warn!("No conversion for {} ms", CONVERSION_TIMEOUT_MS);
                    WEIGHT.set_connected(false);
                }
            }
            Either::Second(()) => tare(&mut load_cell).await,
        }
    }
}

fn disconnect(reason: tensio_core::traits::SensorError) {
    if WEIGHT.is_connected() {
        warn!("Gauge fault: {:?}", reason);
        WEIGHT.set_connected(false);
    }
}

/// Re-zero from the next few conversions
async fn tare(load_cell: &mut LoadCell<GaugeAdc>) {
    let mut raws = [0i32; TARE_SAMPLES];
    for raw in raws.iter_mut() {
        let conversion = with_timeout(
            Duration::from_millis(CONVERSION_TIMEOUT_MS),
            load_cell.adc_mut().read_when_ready(),
        )
        .await;
        match conversion {
            Ok(Ok(value)) => *raw = value,
            _ => {
                warn!("Tare aborted, gauge not converting");
                return;
            }
        }
    }

    match load_cell.tare_from(&raws) {
        Ok(()) => info!("Tare set to {} counts", load_cell.tare_counts()),
        Err(e) => warn!("Tare rejected: {:?}", e),
    }
}
