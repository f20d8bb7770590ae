//! Gauge link monitor implementation
//!
//! Disconnection never aborts a run; it only leaves gaps in the samples.
//! The monitor is used to refuse starting a force-recording workout without
//! a gauge and to report link health.

use crate::sampler::WeightCell;

/// Time without a reading before a connected gauge counts as stale
pub const DEFAULT_STALE_AFTER_MS: u32 = 2000;

/// Gauge link health
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkStatus {
    /// Connected and delivering readings
    Connected,
    /// Connected but silent for too long
    Stale,
    /// Not connected
    Disconnected,
}

/// Link monitor for the force gauge
#[derive(Debug, Clone)]
pub struct GaugeMonitor {
    /// Last known connection state
    connected: bool,
    /// Time since the last reading (ms)
    since_reading_ms: u32,
    /// Stale threshold (ms)
    stale_after_ms: u32,
    /// Reading counter seen on the last update
    last_readings: u32,
    /// Status reported on the last update
    last_status: LinkStatus,
}

impl Default for GaugeMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_AFTER_MS)
    }
}

impl GaugeMonitor {
    /// Create a new monitor
    pub fn new(stale_after_ms: u32) -> Self {
        Self {
            connected: false,
            since_reading_ms: 0,
            stale_after_ms,
            last_readings: 0,
            last_status: LinkStatus::Disconnected,
        }
    }

    /// Record a connection change
    pub fn connection_changed(&mut self, connected: bool) {
        if connected && !self.connected {
            self.since_reading_ms = 0;
        }
        self.connected = connected;
    }

    /// Record a reading received
    pub fn reading_received(&mut self) {
        self.since_reading_ms = 0;
    }

    /// Update time tracking
    ///
    /// # Arguments
    /// - `delta_ms`: Time elapsed since last update
    pub fn update_time(&mut self, delta_ms: u32) {
        self.since_reading_ms = self.since_reading_ms.saturating_add(delta_ms);
    }

    /// Pull connection state and reading activity from the weight cell
    ///
    /// Returns the new status when it changed since the previous call.
    pub fn observe(&mut self, cell: &WeightCell, delta_ms: u32) -> Option<LinkStatus> {
        self.connection_changed(cell.is_connected());
        self.update_time(delta_ms);

        let readings = cell.readings();
        if readings != self.last_readings {
            self.last_readings = readings;
            self.reading_received();
        }

        let status = self.status();
        if status != self.last_status {
            self.last_status = status;
            Some(status)
        } else {
            None
        }
    }

    /// Current link status
    pub fn status(&self) -> LinkStatus {
        if !self.connected {
            LinkStatus::Disconnected
        } else if self.since_reading_ms >= self.stale_after_ms {
            LinkStatus::Stale
        } else {
            LinkStatus::Connected
        }
    }

    /// Check if a run may start
    ///
    /// Only force-recording runs need a connected gauge.
    pub fn can_start(&self, records_force: bool) -> bool {
        !records_force || self.connected
    }
}
