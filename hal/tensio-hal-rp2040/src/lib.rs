//! RP2040-specific HAL for the grip trainer firmware
//!
//! This crate provides RP2040-specific implementations of the shared
//! `tensio-hal` traits, plus RP2040-specific functionality:
//!
//! - Flash storage driver (implements `tensio_hal::FlashStorage`)
//! - PWM tone output for the piezo buzzer

#![no_std]

pub mod buzzer;
pub mod flash;

// Re-export shared traits from tensio-hal for convenience
pub use tensio_hal::{FlashStorage as FlashStorageTrait, StorageKey};
