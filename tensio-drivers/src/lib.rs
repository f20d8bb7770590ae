//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in tensio-core for the gauge hardware:
//!
//! - Load cell conversion (tare, scale, broken-bridge detection)
//! - HX711 bridge amplifier
//! - Piezo buzzer cue patterns

#![no_std]
#![deny(unsafe_code)]

pub mod buzzer;
pub mod sensor;
