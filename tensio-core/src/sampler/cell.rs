//! Latest-value weight cell
//!
//! Written by the gauge task, read by the sampler. Only the newest reading
//! is kept.

use portable_atomic::{AtomicBool, AtomicU32, Ordering};

/// Single-slot weight cell, usable from a `static`
#[derive(Debug)]
pub struct WeightCell {
    bits: AtomicU32,
    connected: AtomicBool,
    readings: AtomicU32,
}

impl Default for WeightCell {
    fn default() -> Self {
        Self::new()
    }
}

impl WeightCell {
    /// Create an empty, disconnected cell
    pub const fn new() -> Self {
        Self {
            bits: AtomicU32::new(0),
            connected: AtomicBool::new(false),
            readings: AtomicU32::new(0),
        }
    }

    /// Store a new reading (kg)
    pub fn publish(&self, weight: f32) {
        self.bits.store(weight.to_bits(), Ordering::Relaxed);
        self.readings.fetch_add(1, Ordering::Release);
    }

    /// Update the gauge link state
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    /// Check if the gauge is connected
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Latest weight, `None` while disconnected or before the first reading
    pub fn latest(&self) -> Option<f32> {
        if !self.is_connected() || self.readings.load(Ordering::Acquire) == 0 {
            return None;
        }
        Some(f32::from_bits(self.bits.load(Ordering::Relaxed)))
    }

    /// Number of readings published so far (wraps)
    pub fn readings(&self) -> u32 {
        self.readings.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_requires_connection() {
        let cell = WeightCell::new();
        assert_eq!(cell.latest(), None);

        cell.publish(12.5);
        assert_eq!(cell.latest(), None);

        cell.set_connected(true);
        assert_eq!(cell.latest(), Some(12.5));

        cell.publish(13.0);
        assert_eq!(cell.latest(), Some(13.0));
        assert_eq!(cell.readings(), 2);

        cell.set_connected(false);
        assert_eq!(cell.latest(), None);
    }

    #[test]
    fn test_connected_before_first_reading() {
        let cell = WeightCell::new();
        cell.set_connected(true);
        assert!(cell.is_connected());
        assert_eq!(cell.latest(), None);
    }
}
