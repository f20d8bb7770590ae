//! Fixed-rate force sampler

use super::{Sample, SampleBuffer, WeightCell};
use crate::session::SessionError;

/// Default sampling period (10 Hz)
pub const DEFAULT_SAMPLE_PERIOD_MS: u32 = 100;

/// Open recording window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    key: u16,
    number: u8,
    iteration: u16,
    elapsed_ms: u32,
    accum_ms: u32,
}

/// Samples the weight cell while a recording window is open
///
/// The first sample of a window is taken one period after it opens.
#[derive(Debug, Clone)]
pub struct ForceSampler {
    period_ms: u32,
    buffer: SampleBuffer,
    window: Option<Window>,
    /// Key and number of the most recently opened window
    last: Option<(u16, u8)>,
}

impl Default for ForceSampler {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_PERIOD_MS)
    }
}

impl ForceSampler {
    /// Create a sampler with the given period (clamped to at least 1 ms)
    pub const fn new(period_ms: u32) -> Self {
        Self {
            period_ms: if period_ms == 0 { 1 } else { period_ms },
            buffer: SampleBuffer::new(),
            window: None,
            last: None,
        }
    }

    /// Open a recording window for phase `key`
    ///
    /// Opening the window that is already open is a no-op. Reopening the
    /// same phase after a close starts the next window number.
    pub fn open(&mut self, key: u16) -> Result<(), SessionError> {
        if let Some(w) = &self.window {
            if w.key == key {
                return Ok(());
            }
        }
        self.buffer.register(key)?;

        let number = match self.last {
            Some((last_key, n)) if last_key == key => n.saturating_add(1),
            _ => 0,
        };
        self.last = Some((key, number));
        self.window = Some(Window {
            key,
            number,
            iteration: 0,
            elapsed_ms: 0,
            accum_ms: 0,
        });
        Ok(())
    }

    /// Close the current window, dropping any partial period
    pub fn close(&mut self) {
        self.window = None;
    }

    /// Check if a window is open
    pub fn is_recording(&self) -> bool {
        self.window.is_some()
    }

    /// Phase key of the open window
    pub fn recording_key(&self) -> Option<u16> {
        self.window.map(|w| w.key)
    }

    /// Feed elapsed time (ignored without an open window)
    pub fn elapse(&mut self, delta_ms: u32) {
        if let Some(w) = &mut self.window {
            w.elapsed_ms = w.elapsed_ms.saturating_add(delta_ms);
            w.accum_ms = w.accum_ms.saturating_add(delta_ms);
        }
    }

    /// Time until the next sample is due (ms)
    pub fn until_next_ms(&self) -> Option<u32> {
        self.window.map(|w| self.period_ms.saturating_sub(w.accum_ms))
    }

    /// Take the next due sample
    ///
    /// Returns `Ok(None)` when no period elapsed or the gauge has nothing to
    /// offer; a disconnected gauge leaves a gap instead of a zero.
    pub fn poll(&mut self, cell: &WeightCell) -> Result<Option<Sample>, SessionError> {
        let Some(w) = &mut self.window else {
            return Ok(None);
        };
        if w.accum_ms < self.period_ms {
            return Ok(None);
        }
        w.accum_ms -= self.period_ms;

        let Some(weight) = cell.latest() else {
            return Ok(None);
        };
        let sample = Sample {
            phase_key: w.key,
            window: w.number,
            iteration: w.iteration,
            weight,
            // Sample time is the period boundary, not the poll time
            elapsed_ms: w.elapsed_ms - w.accum_ms,
        };
        w.iteration = w.iteration.saturating_add(1);

        self.buffer.push(sample)?;
        Ok(Some(sample))
    }

    /// Recorded samples
    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    /// Drop all samples and windows
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.window = None;
        self.last = None;
    }
}
