//! Strain-gauge load cell
//!
//! Converts raw bridge amplifier counts into kilograms using a tare offset
//! and a counts-per-kilogram scale. Saturated readings mean the bridge is
//! broken or shorted.

use tensio_core::config::GaugeConfig;
use tensio_core::traits::{ForceSensor, SensorError};

/// Largest magnitude a 24-bit bridge amplifier reports
pub const FULL_SCALE_COUNTS: i32 = 0x7F_FFFF;

/// Samples averaged by [`LoadCell::tare`]
pub const TARE_SAMPLES: u8 = 8;

/// Heaviest load accepted before a reading counts as out of range (kg)
pub const MAX_LOAD_KG: f32 = 300.0;

/// Raw reading trait for platform abstraction
pub trait AdcReader {
    /// Read one signed conversion (24-bit, sign-extended)
    #[allow(clippy::result_unit_err)]
    fn read(&mut self) -> Result<i32, ()>;
}

/// Load cell behind a bridge amplifier
pub struct LoadCell<ADC> {
    adc: ADC,
    /// Raw reading with nothing attached
    tare_counts: i32,
    /// Raw counts per kilogram (sign gives the mounting direction)
    counts_per_kg: f32,
}

impl<ADC> LoadCell<ADC> {
    /// Create a load cell from its calibration
    pub fn new(adc: ADC, gauge: &GaugeConfig) -> Self {
        Self {
            adc,
            tare_counts: gauge.tare_counts,
            counts_per_kg: gauge.counts_per_kg,
        }
    }

    /// Current zero point (raw counts)
    pub fn tare_counts(&self) -> i32 {
        self.tare_counts
    }

    /// Amplifier access for reads driven from outside (async waits)
    pub fn adc_mut(&mut self) -> &mut ADC {
        &mut self.adc
    }

    /// Validate a raw conversion and convert it to kilograms
    pub fn convert(&self, raw: i32) -> Result<f32, SensorError> {
        self.counts_to_kg(Self::check_raw(raw)?)
    }

    /// Use the mean of `raws` as the new zero point
    pub fn tare_from(&mut self, raws: &[i32]) -> Result<(), SensorError> {
        if raws.is_empty() {
            return Err(SensorError::ConversionError);
        }
        let mut sum: i64 = 0;
        for &raw in raws {
            sum += Self::check_raw(raw)? as i64;
        }
        self.tare_counts = (sum / raws.len() as i64) as i32;
        Ok(())
    }

    /// Check a raw conversion for a broken bridge
    ///
    /// A disconnected cell rails the amplifier high, a shorted one rails it
    /// low.
    pub fn check_raw(raw: i32) -> Result<i32, SensorError> {
        if raw >= FULL_SCALE_COUNTS {
            return Err(SensorError::OpenCircuit);
        }
        if raw <= -FULL_SCALE_COUNTS {
            return Err(SensorError::ShortCircuit);
        }
        Ok(raw)
    }

    /// Convert raw counts to kilograms
    pub fn counts_to_kg(&self, raw: i32) -> Result<f32, SensorError> {
        if self.counts_per_kg == 0.0 {
            return Err(SensorError::ConversionError);
        }
        let kg = (raw - self.tare_counts) as f32 / self.counts_per_kg;
        if kg > MAX_LOAD_KG || kg < -MAX_LOAD_KG {
            return Err(SensorError::OutOfRange);
        }
        Ok(kg)
    }
}

impl<ADC: AdcReader> LoadCell<ADC> {
    fn read_raw(&mut self) -> Result<i32, SensorError> {
        let raw = self.adc.read().map_err(|_| SensorError::ConversionError)?;
        Self::check_raw(raw)
    }
}

impl<ADC: AdcReader> ForceSensor for LoadCell<ADC> {
    fn read_kg(&mut self) -> Result<f32, SensorError> {
        let raw = self.read_raw()?;
        self.counts_to_kg(raw)
    }

    fn tare(&mut self) -> Result<(), SensorError> {
        let mut raws = [0i32; TARE_SAMPLES as usize];
        for raw in raws.iter_mut() {
            *raw = self.read_raw()?;
        }
        self.tare_from(&raws)
    }
}

/// Dummy ADC for testing (replays readings, then repeats the last one)
#[cfg(test)]
pub struct DummyAdc {
    pub readings: &'static [i32],
    pub index: usize,
}

#[cfg(test)]
impl DummyAdc {
    pub fn fixed(readings: &'static [i32]) -> Self {
        Self { readings, index: 0 }
    }
}

#[cfg(test)]
impl AdcReader for DummyAdc {
    fn read(&mut self) -> Result<i32, ()> {
        let value = *self
            .readings
            .get(self.index)
            .or(self.readings.last())
            .ok_or(())?;
        self.index += 1;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gauge(tare_counts: i32, counts_per_kg: f32) -> GaugeConfig {
        GaugeConfig {
            tare_counts,
            counts_per_kg,
            ..GaugeConfig::default()
        }
    }

    #[test]
    fn test_counts_to_kg() {
        let cell = LoadCell::new(DummyAdc::fixed(&[]), &gauge(1000, 200.0));
        assert_eq!(cell.counts_to_kg(1000).unwrap(), 0.0);
        assert_eq!(cell.counts_to_kg(5000).unwrap(), 20.0);
        assert_eq!(cell.counts_to_kg(600).unwrap(), -2.0);
    }

    #[test]
    fn test_read_kg() {
        let mut cell = LoadCell::new(DummyAdc::fixed(&[-1200 + 4105]), &gauge(-1200, 410.5));
        let kg = cell.read_kg().unwrap();
        assert!((kg - 10.0).abs() < 0.001);
    }

    #[test]
    fn test_tare_averages_readings() {
        let mut cell = LoadCell::new(
            DummyAdc::fixed(&[100, 104, 96, 100, 102, 98, 100, 100, 2100]),
            &gauge(0, 100.0),
        );
        cell.tare().unwrap();
        assert_eq!(cell.tare_counts(), 100);
        assert_eq!(cell.read_kg().unwrap(), 20.0);
    }

    #[test]
    fn test_open_and_short_circuit() {
        let mut open = LoadCell::new(DummyAdc::fixed(&[FULL_SCALE_COUNTS]), &gauge(0, 200.0));
        assert_eq!(open.read_kg(), Err(SensorError::OpenCircuit));
        assert!(!open.is_valid());

        let mut short = LoadCell::new(DummyAdc::fixed(&[-FULL_SCALE_COUNTS]), &gauge(0, 200.0));
        assert_eq!(short.read_kg(), Err(SensorError::ShortCircuit));
        assert_eq!(short.tare(), Err(SensorError::ShortCircuit));
        assert_eq!(short.tare_counts(), 0);
    }

    #[test]
    fn test_convert_and_tare_from() {
        let mut cell = LoadCell::new(DummyAdc::fixed(&[]), &gauge(0, 100.0));
        assert_eq!(cell.convert(FULL_SCALE_COUNTS), Err(SensorError::OpenCircuit));

        cell.tare_from(&[500, 700]).unwrap();
        assert_eq!(cell.tare_counts(), 600);
        assert_eq!(cell.convert(1600).unwrap(), 10.0);

        assert_eq!(cell.tare_from(&[]), Err(SensorError::ConversionError));
        assert_eq!(
            cell.tare_from(&[0, -FULL_SCALE_COUNTS]),
            Err(SensorError::ShortCircuit)
        );
        assert_eq!(cell.tare_counts(), 600);
    }

    #[test]
    fn test_out_of_range() {
        let cell = LoadCell::new(DummyAdc::fixed(&[]), &gauge(0, 10.0));
        assert_eq!(cell.counts_to_kg(4000), Err(SensorError::OutOfRange));

        let uncalibrated = LoadCell::new(DummyAdc::fixed(&[]), &gauge(0, 0.0));
        assert_eq!(uncalibrated.counts_to_kg(10), Err(SensorError::ConversionError));
    }

    #[test]
    fn test_adc_failure() {
        let mut cell = LoadCell::new(DummyAdc::fixed(&[]), &gauge(0, 200.0));
        assert_eq!(cell.read_kg(), Err(SensorError::ConversionError));
    }
}
