//! PWM tone output for a piezo buzzer
//!
//! The PWM slice runs from a 1 MHz counter clock (125 MHz system clock
//! divided by 125). A tone is a square wave with `top = 1 MHz / f - 1` and
//! 50% duty; silence is a zero compare value.

use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use fixed::traits::ToFixed;

/// PWM counter clock after the divider (Hz)
pub const COUNTER_HZ: u32 = 1_000_000;

/// Clock divider from the 125 MHz system clock
const DIVIDER: u8 = 125;

/// Lowest tone the 16-bit counter can produce (Hz)
pub const MIN_TONE_HZ: u16 = 16;

/// Counter top value for a tone, `None` for silence or out-of-range tones
pub fn tone_top(freq_hz: u16) -> Option<u16> {
    if freq_hz < MIN_TONE_HZ {
        return None;
    }
    let top = COUNTER_HZ / freq_hz as u32;
    u16::try_from(top.saturating_sub(1)).ok()
}

/// Piezo buzzer on one PWM channel (A)
pub struct PwmBuzzer<'d> {
    pwm: Pwm<'d>,
    config: PwmConfig,
    freq_hz: u16,
}

impl<'d> PwmBuzzer<'d> {
    /// Wrap a PWM output, starting silent
    pub fn new(mut pwm: Pwm<'d>) -> Self {
        let mut config = PwmConfig::default();
        config.divider = DIVIDER.to_fixed();
        config.top = u16::MAX;
        config.compare_a = 0;
        pwm.set_config(&config);
        Self {
            pwm,
            config,
            freq_hz: 0,
        }
    }

    /// Play `freq_hz`, 0 silences the buzzer
    pub fn set_frequency(&mut self, freq_hz: u16) {
        if freq_hz == self.freq_hz {
            return;
        }
        self.freq_hz = freq_hz;
        match tone_top(freq_hz) {
            Some(top) => {
                self.config.top = top;
                self.config.compare_a = top / 2;
            }
            None => self.config.compare_a = 0,
        }
        self.pwm.set_config(&self.config);
    }

    /// Frequency currently playing (0 = silent)
    pub fn frequency(&self) -> u16 {
        self.freq_hz
    }
}
