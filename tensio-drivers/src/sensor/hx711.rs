//! HX711 bridge amplifier
//!
//! Bit-banged two-wire interface: DOUT goes low when a conversion is
//! ready, then 24 clock pulses shift the result out MSB first. One to
//! three extra pulses select the channel and gain of the next conversion.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::digital::Wait;

use super::load_cell::AdcReader;

/// Channel and gain of the next conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
    /// Channel A, gain 128
    #[default]
    A128,
    /// Channel B, gain 32
    B32,
    /// Channel A, gain 64
    A64,
}

impl Gain {
    /// Clock pulses after the 24 data bits
    const fn extra_pulses(self) -> u8 {
        match self {
            Gain::A128 => 1,
            Gain::B32 => 2,
            Gain::A64 => 3,
        }
    }
}

/// Clock high/low time (us)
const PULSE_US: u32 = 1;

/// Clock high time that powers the chip down (us)
const POWER_DOWN_US: u32 = 70;

/// HX711 on two GPIOs
pub struct Hx711<SCK, DOUT, D> {
    sck: SCK,
    dout: DOUT,
    delay: D,
    gain: Gain,
}

impl<SCK, DOUT, D> Hx711<SCK, DOUT, D>
where
    SCK: OutputPin,
    DOUT: InputPin,
    D: DelayNs,
{
    /// Create a driver; the gain applies from the second conversion on
    pub fn new(sck: SCK, dout: DOUT, delay: D, gain: Gain) -> Self {
        Self {
            sck,
            dout,
            delay,
            gain,
        }
    }

    /// Check if a conversion is waiting
    pub fn is_ready(&mut self) -> bool {
        self.dout.is_low().unwrap_or(false)
    }

    /// Shift out a ready conversion
    fn shift_in(&mut self) -> Result<i32, ()> {
        let mut value: u32 = 0;
        for _ in 0..24 {
            self.pulse()?;
            value <<= 1;
            if self.dout.is_high().map_err(|_| ())? {
                value |= 1;
            }
        }
        for _ in 0..self.gain.extra_pulses() {
            self.pulse()?;
        }
        Ok(sign_extend(value))
    }

    fn pulse(&mut self) -> Result<(), ()> {
        self.sck.set_high().map_err(|_| ())?;
        self.delay.delay_us(PULSE_US);
        self.sck.set_low().map_err(|_| ())?;
        self.delay.delay_us(PULSE_US);
        Ok(())
    }

    /// Enter power-down (clock held high)
    pub fn power_down(&mut self) -> Result<(), ()> {
        self.sck.set_high().map_err(|_| ())?;
        self.delay.delay_us(POWER_DOWN_US);
        Ok(())
    }

    /// Wake from power-down; the first conversion uses channel A, gain 128
    pub fn power_up(&mut self) -> Result<(), ()> {
        self.sck.set_low().map_err(|_| ())
    }
}

impl<SCK, DOUT, D> Hx711<SCK, DOUT, D>
where
    SCK: OutputPin,
    DOUT: InputPin + Wait,
    D: DelayNs,
{
    /// Wait for the next conversion and read it
    pub async fn read_when_ready(&mut self) -> Result<i32, ()> {
        self.dout.wait_for_low().await.map_err(|_| ())?;
        self.shift_in()
    }
}

impl<SCK, DOUT, D> AdcReader for Hx711<SCK, DOUT, D>
where
    SCK: OutputPin,
    DOUT: InputPin,
    D: DelayNs,
{
    fn read(&mut self) -> Result<i32, ()> {
        if !self.is_ready() {
            return Err(());
        }
        self.shift_in()
    }
}

/// Sign-extend a 24-bit two's complement value
fn sign_extend(raw: u32) -> i32 {
    ((raw << 8) as i32) >> 8
}
