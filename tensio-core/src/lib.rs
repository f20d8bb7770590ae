//! Board-agnostic core logic for the grip training firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Training definitions (nested timers, flat workouts) and validation
//! - Phase sequencers for both definition shapes
//! - Countdown clock (pre-roll + per-phase countdown)
//! - Cue scheduling (intro/start/end/victory)
//! - Force sampling and phase-keyed sample buffers
//! - Post-run metrics (max isometric force, critical force)
//! - Run session and run state machine
//! - Gauge link monitoring
//! - Persistence traits and an in-memory store
//! - Definition file parsing

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod clock;
pub mod config;
pub mod cue;
pub mod gauge;
pub mod metrics;
pub mod program;
pub mod sampler;
pub mod sequencer;
pub mod session;
pub mod state;
pub mod store;
pub mod traits;
