//! Force gauge traits

/// Errors that can occur with force sensing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Load cell disconnected (open circuit)
    OpenCircuit,
    /// Load cell signal shorted to a rail
    ShortCircuit,
    /// Reading out of expected range
    OutOfRange,
    /// ADC conversion error
    ConversionError,
}

/// Trait for force sensors
///
/// Implementations handle the specific sensor (load cell amplifier over an
/// ADC, a remote gauge, etc.) and its calibration.
pub trait ForceSensor {
    /// Read the current force in kilograms
    ///
    /// Takes `&mut self` because ADC reads typically require mutable access.
    fn read_kg(&mut self) -> Result<f32, SensorError>;

    /// Use the current reading as the zero point
    fn tare(&mut self) -> Result<(), SensorError>;

    /// Check if the sensor reading is valid
    fn is_valid(&mut self) -> bool {
        self.read_kg().is_ok()
    }
}
