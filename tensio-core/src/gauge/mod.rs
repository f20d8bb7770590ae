//! Force gauge link monitoring
//!
//! Tracks whether the gauge is connected and still delivering readings.

pub mod monitor;

pub use monitor::{GaugeMonitor, LinkStatus, DEFAULT_STALE_AFTER_MS};
